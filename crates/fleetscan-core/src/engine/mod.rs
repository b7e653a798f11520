// ── Remediation workflows ──
//
// A workflow runs one scan cycle at a time on behalf of a `ScanSession`.
// It reports through a `Reporter` and returns what the session needs
// to decide whether the next identical scan counts as a confirmation.

pub mod decommission;
pub mod firmware;

use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use crate::audit::{AuditField, AuditLog};
use crate::error::CoreError;
use crate::event::{StatusColor, StatusEvent, StatusSink};
use crate::model::Serial;

pub use decommission::DecommissionEngine;
pub use firmware::{ComplianceTargets, FirmwareEngine};

/// One validated scan handed to a workflow.
#[derive(Debug, Clone)]
pub struct Scan {
    pub serial: Serial,
    /// Same serial as the previous cycle, which did not itself confirm.
    pub confirmation: bool,
    /// Presence result of the previous cycle.
    pub previously_present: bool,
    /// Release subscriptions instead of deleting (decommission only).
    pub unlicense: bool,
}

impl Scan {
    /// A confirmation whose previous cycle found the device.
    pub fn confirms_present_device(&self) -> bool {
        self.confirmation && self.previously_present
    }
}

/// What a finished cycle tells the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    pub present: bool,
    /// The cycle acted on its confirmation; the next repeat starts over.
    pub consumed_confirmation: bool,
}

/// Fans cycle output out to the status sink and the optional audit log.
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn StatusSink>,
    audit: Option<Arc<dyn AuditLog>>,
}

impl Reporter {
    pub fn new(sink: Arc<dyn StatusSink>, audit: Option<Arc<dyn AuditLog>>) -> Self {
        Self { sink, audit }
    }

    pub fn clear(&self) {
        self.sink.emit(StatusEvent::Clear);
    }

    pub fn log(&self, line: impl Into<String>) {
        self.sink.emit(StatusEvent::Log { value: line.into() });
    }

    pub fn status(&self, value: impl Into<String>, color: StatusColor) {
        self.sink.emit(StatusEvent::Status {
            value: value.into(),
            color,
        });
    }

    pub fn serial(&self, value: impl Into<String>) {
        self.sink.emit(StatusEvent::Serial {
            value: value.into(),
        });
    }

    pub fn audit(&self, serial: &str, field: AuditField, value: &str) {
        if let Some(audit) = &self.audit {
            audit.record(serial, field, value);
        }
    }

    /// Tell the front-end where the audit sheet lives, if there is one.
    pub fn announce_audit(&self) {
        if let Some(location) = self.audit.as_ref().and_then(|a| a.location()) {
            self.sink.emit(StatusEvent::AuditPath { value: location });
        }
    }

    /// Turn a failed cycle into operator-visible output.
    pub fn failure(&self, serial: Option<&str>, err: &CoreError) {
        warn!(serial, error = %err, "scan cycle failed");
        self.status(err.status_label(), StatusColor::Red);
        match serial {
            Some(serial) => {
                self.log(format!("{serial} - {err}"));
                self.audit(serial, AuditField::Status, &format!("ERROR: {err}"));
            }
            None => self.log(err.to_string()),
        }
    }
}

/// A remediation workflow driven by scans.
pub trait Workflow: Send + Sync {
    /// Name used for logging and the audit sheet.
    fn name(&self) -> &'static str;

    /// Bring shared state up to date when a front-end connects.
    fn prepare(&self, reporter: &Reporter) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Run one scan cycle to completion.
    fn run_cycle(
        &self,
        scan: &Scan,
        reporter: &Reporter,
    ) -> impl Future<Output = Result<CycleOutcome, CoreError>> + Send;
}
