// ── Scan session ──
//
// Per-connection double-scan protocol. A single scan is a status query;
// scanning the same serial again right away is the operator's
// confirmation and lets the workflow take its mutating branch. A
// confirmation is consumed by the cycle that acts on it, so the third
// identical scan is a fresh query again.

use std::sync::Arc;

use tracing::{debug, info};

use crate::engine::{Reporter, Scan, Workflow};
use crate::event::{ClientMessage, StatusColor};
use crate::model::Serial;
use crate::model::serial::normalize;

/// Per-scan switches supplied by the front-end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    pub unlicense: bool,
}

/// What the session remembers between scans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    pub last_serial: Option<String>,
    pub last_presence: bool,
    pub consumed: bool,
}

/// One connected front-end driving one workflow.
pub struct ScanSession<W: Workflow> {
    workflow: Arc<W>,
    reporter: Reporter,
    defaults: ScanOptions,
    state: ScanState,
}

impl<W: Workflow> ScanSession<W> {
    pub fn new(workflow: Arc<W>, reporter: Reporter) -> Self {
        Self {
            workflow,
            reporter,
            defaults: ScanOptions::default(),
            state: ScanState::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: ScanOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Front-end connected: clear its screen and bring the cache up to date.
    pub async fn connect(&mut self) {
        info!(workflow = self.workflow.name(), "session connected");
        self.reporter.clear();
        self.reporter.announce_audit();
        if let Err(e) = self.workflow.prepare(&self.reporter).await {
            self.reporter.failure(None, &e);
        }
    }

    pub async fn handle_message(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::Serial { value, unlicense } => {
                let options = ScanOptions {
                    unlicense: unlicense.unwrap_or(self.defaults.unlicense),
                };
                self.scan_with(&value, options).await;
            }
            ClientMessage::Status { value } if value == "connected" => self.connect().await,
            ClientMessage::Status { value } => debug!(value, "ignoring status message"),
            ClientMessage::Excel { .. } => self.reporter.announce_audit(),
        }
    }

    pub async fn scan(&mut self, raw: &str) {
        self.scan_with(raw, self.defaults).await;
    }

    /// Run one full scan cycle. Never fails; errors become status output.
    pub async fn scan_with(&mut self, raw: &str, options: ScanOptions) {
        self.reporter.clear();

        let serial = match Serial::parse(raw) {
            Ok(serial) => serial,
            Err(e) => {
                let input = normalize(raw);
                self.reporter.serial(input.as_str());
                self.reporter.status("Serial?", StatusColor::Red);
                self.reporter.log(e.to_string());
                // Remembered as typed; it can never equal a valid serial.
                self.state = ScanState {
                    last_serial: Some(raw.to_owned()),
                    last_presence: false,
                    consumed: false,
                };
                return;
            }
        };
        self.reporter.serial(serial.as_str());

        let repeat = self.state.last_serial.as_deref() == Some(serial.as_str());
        let scan = Scan {
            confirmation: repeat && !self.state.consumed,
            previously_present: repeat && self.state.last_presence,
            unlicense: options.unlicense,
            serial,
        };
        debug!(
            serial = %scan.serial,
            confirmation = scan.confirmation,
            workflow = self.workflow.name(),
            "scan cycle"
        );

        let (present, consumed) = match self.workflow.run_cycle(&scan, &self.reporter).await {
            Ok(outcome) => (outcome.present, outcome.consumed_confirmation),
            Err(e) => {
                self.reporter.failure(Some(scan.serial.as_str()), &e);
                (false, scan.confirmation)
            }
        };

        self.state = ScanState {
            last_serial: Some(scan.serial.into()),
            last_presence: present,
            consumed,
        };
    }
}
