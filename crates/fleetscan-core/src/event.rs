// ── Status events ──
//
// The engine talks to its front-end through two small message types:
// `StatusEvent` flows out (screen updates), `ClientMessage` flows in
// (scans and lifecycle notices). Both serialize as `{"type": ...}`
// objects so a websocket or console transport can carry them as-is.

use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::sync::mpsc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StatusColor {
    Red,
    Green,
    Orange,
    Grey,
}

/// Screen update produced by a scan cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StatusEvent {
    /// Wipe the previous cycle's output.
    Clear,
    /// A line for the scrolling log.
    Log { value: String },
    /// The headline verdict.
    Status { value: String, color: StatusColor },
    /// Echo of the normalized scan input.
    Serial { value: String },
    /// Where the audit sheet is being written.
    #[serde(rename = "excel")]
    AuditPath { value: String },
}

/// Anything that can display status events.
pub trait StatusSink: Send + Sync {
    fn emit(&self, event: StatusEvent);
}

impl StatusSink for mpsc::UnboundedSender<StatusEvent> {
    fn emit(&self, event: StatusEvent) {
        if self.send(event).is_err() {
            trace!("status receiver dropped, event discarded");
        }
    }
}

/// Inbound message from the front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// A scanned serial, optionally overriding the session's unlicense mode.
    Serial {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unlicense: Option<bool>,
    },
    /// Lifecycle notice; `"connected"` starts the session.
    Status { value: String },
    /// Request to re-announce the audit location.
    Excel { value: String },
}
