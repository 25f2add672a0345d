//! Per-direction alert store.

use crate::error::{AlertError, AlertResult};
use gofer_core::{Alert, AlertId, AlertRecord, Direction};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const RECORD_EXTENSION: &str = "json";

/// Durable store of outstanding alerts for one trade direction.
///
/// Each alert is a single JSON document named `<id>.json`. The alert's
/// identity is its file stem; its direction is the store's direction.
#[derive(Debug, Clone)]
pub struct AlertStore {
    dir: PathBuf,
    direction: Direction,
}

impl AlertStore {
    pub fn new(dir: impl Into<PathBuf>, direction: Direction) -> Self {
        Self {
            dir: dir.into(),
            direction,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &AlertId) -> PathBuf {
        self.dir.join(format!("{}.{RECORD_EXTENSION}", id.as_str()))
    }

    /// Idempotent creation of the store directory.
    pub fn ensure_store(&self) -> AlertResult<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Lazy, unordered sequence of outstanding alert identifiers.
    ///
    /// No ordering is guaranteed across identifiers or across successive
    /// calls; entries that are not `.json` records are skipped.
    pub fn list_pending(&self) -> AlertResult<impl Iterator<Item = AlertId>> {
        let entries = fs::read_dir(&self.dir)?;
        Ok(entries.filter_map(|entry| {
            let path = entry.ok()?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                return None;
            }
            let stem = path.file_stem()?.to_str()?;
            Some(AlertId::new(stem))
        }))
    }

    /// Load and parse one alert record.
    ///
    /// Existence is re-checked here: between `list_pending` and `load`
    /// another worker or process may have consumed the record, which is
    /// benign (`NotFound`). A record that exists but does not parse is
    /// left in place and reported as `Malformed`.
    pub fn load(&self, id: &AlertId) -> AlertResult<Alert> {
        let path = self.record_path(id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AlertError::NotFound(id.clone()));
            }
            Err(e) => return Err(AlertError::Io(e)),
        };
        let record: AlertRecord =
            serde_json::from_str(&raw).map_err(|source| AlertError::Malformed { path, source })?;
        Ok(Alert::from_record(id.clone(), self.direction, record))
    }

    /// Remove the durable record after the ledger has accepted the order.
    ///
    /// Removing an already-removed record is Ok: another worker consumed
    /// it, or a previous cycle's removal raced a crash. If removal fails
    /// the alert redelivers and the ledger's duplicate check absorbs it.
    pub fn complete(&self, id: &AlertId) -> AlertResult<()> {
        match fs::remove_file(self.record_path(id)) {
            Ok(()) => {
                debug!(alert_id = %id, direction = %self.direction, "alert record removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AlertError::Io(e)),
        }
    }
}
