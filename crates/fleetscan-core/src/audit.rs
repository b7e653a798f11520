// ── Audit sheet ──
//
// One row per scanned serial, rows numbered from 2 (row 1 is the
// header) in first-seen order. Field updates merge into the existing
// row and stamp its last-update time. A file-backed sheet rewrites its
// JSON document after every update.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Local;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::CoreError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FIRST_ROW: u32 = 2;

/// Current local time in the sheet's timestamp format.
pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Column an audit update targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditField {
    Status,
    DeletedOn,
    UnsubscribedOn,
}

/// Receives per-serial audit updates. Storage format is up to the sink.
pub trait AuditLog: Send + Sync {
    fn record(&self, serial: &str, field: AuditField, value: &str);

    /// Human-readable location of the audit output, if any.
    fn location(&self) -> Option<String>;
}

/// Column set of a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditLayout {
    Firmware,
    Decommission,
}

impl AuditLayout {
    pub fn title(self) -> &'static str {
        match self {
            Self::Firmware => "Firmware",
            Self::Decommission => "Decommission",
        }
    }

    pub fn header(self) -> &'static [&'static str] {
        match self {
            Self::Firmware => &["Serial", "Status", "Date"],
            Self::Decommission => &[
                "Serial",
                "Status",
                "Last State update",
                "Deleted on",
                "Unsubscribed on",
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRow {
    pub row: u32,
    pub serial: String,
    pub status: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsubscribed_on: Option<String>,
}

#[derive(Serialize)]
struct SheetDocument<'a> {
    sheet: &'static str,
    header: &'static [&'static str],
    rows: Vec<&'a AuditRow>,
}

/// In-memory audit sheet, optionally mirrored to a JSON file.
pub struct AuditSheet {
    layout: AuditLayout,
    path: Option<PathBuf>,
    persist: bool,
    rows: Mutex<IndexMap<String, AuditRow>>,
}

impl AuditSheet {
    pub fn in_memory(layout: AuditLayout) -> Self {
        Self {
            layout,
            path: None,
            persist: true,
            rows: Mutex::new(IndexMap::new()),
        }
    }

    /// Create a timestamped sheet file inside `dir`.
    ///
    /// Without `persist`, the file is removed again when the sheet drops.
    pub fn create(layout: AuditLayout, dir: &Path, persist: bool) -> Result<Self, CoreError> {
        fs::create_dir_all(dir).map_err(|e| CoreError::Config {
            message: format!("cannot create audit directory {}: {e}", dir.display()),
        })?;
        let name = format!(
            "{}_{}.json",
            Local::now().format("%Y-%m-%d_%Hh%Mm%Ss"),
            layout.title()
        );

        let sheet = Self {
            layout,
            path: Some(dir.join(name)),
            persist,
            rows: Mutex::new(IndexMap::new()),
        };
        sheet.flush(&IndexMap::new()).map_err(|e| CoreError::Config {
            message: format!("cannot write audit sheet: {e}"),
        })?;
        Ok(sheet)
    }

    pub fn layout(&self) -> AuditLayout {
        self.layout
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn rows(&self) -> Vec<AuditRow> {
        self.lock().values().cloned().collect()
    }

    pub fn row_of(&self, serial: &str) -> Option<AuditRow> {
        self.lock().get(serial).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IndexMap<String, AuditRow>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self, rows: &IndexMap<String, AuditRow>) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let doc = SheetDocument {
            sheet: self.layout.title(),
            header: self.layout.header(),
            rows: rows.values().collect(),
        };
        let rendered = serde_json::to_string_pretty(&doc).map_err(std::io::Error::other)?;
        fs::write(path, rendered)
    }
}

impl AuditLog for AuditSheet {
    fn record(&self, serial: &str, field: AuditField, value: &str) {
        let mut rows = self.lock();
        let next_row = FIRST_ROW + u32::try_from(rows.len()).unwrap_or(u32::MAX - FIRST_ROW);
        let row = rows.entry(serial.to_owned()).or_insert_with(|| AuditRow {
            row: next_row,
            serial: serial.to_owned(),
            status: String::new(),
            updated_at: String::new(),
            deleted_on: None,
            unsubscribed_on: None,
        });

        match field {
            AuditField::Status => value.clone_into(&mut row.status),
            AuditField::DeletedOn => row.deleted_on = Some(value.to_owned()),
            AuditField::UnsubscribedOn => row.unsubscribed_on = Some(value.to_owned()),
        }
        row.updated_at = timestamp();
        debug!(serial, row = row.row, ?field, value, "audit updated");

        if let Err(e) = self.flush(&rows) {
            warn!(error = %e, "audit sheet could not be written");
        }
    }

    fn location(&self) -> Option<String> {
        self.path.as_ref().map(|p| p.display().to_string())
    }
}

impl Drop for AuditSheet {
    fn drop(&mut self) {
        if self.persist {
            return;
        }
        if let Some(path) = &self.path {
            if let Err(e) = fs::remove_file(path) {
                debug!(error = %e, path = %path.display(), "audit sheet already gone");
            }
        }
    }
}
