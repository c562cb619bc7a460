//! Classification of controller error reports
//!
//! A failed import-configuration request carries a list of extended info
//! entries under `@Message.ExtendedInfo`. Only two message ids change what the
//! apply loop does next; everything else is an ordinary transient failure.

use serde::Deserialize;
use serde_json::Value;

/// Message id reported while an earlier configuration job still blocks new ones
pub const IDRAC_CONFIG_PENDING: &str = "LC068";

/// Message id reported while another job is running
pub const IDRAC_JOB_RUNNING: &str = "RAC0679";

/// One `(MessageId, Message)` pair from a failure body
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorEntry {
    #[serde(rename = "MessageId", default)]
    pub message_id: String,
    #[serde(rename = "Message", default = "unknown_message")]
    pub message: String,
}

fn unknown_message() -> String {
    "Unknown error".to_string()
}

impl ErrorEntry {
    pub fn new(message_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            message: message.into(),
        }
    }

    /// Whether this entry carries `code`, either bare or registry-qualified
    /// (`IDRAC.2.8.LC068`)
    pub fn has_code(&self, code: &str) -> bool {
        self.message_id == code || self.message_id.rsplit('.').next() == Some(code)
    }
}

/// Ordered extended info entries parsed from a failed call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerErrorReport {
    pub entries: Vec<ErrorEntry>,
}

impl ControllerErrorReport {
    /// Parse the report from a failure body.
    ///
    /// Looks at `@Message.ExtendedInfo` at the top level and under `error`,
    /// then at a task's `Messages`. An absent or malformed body gives an
    /// empty report.
    pub fn from_body(body: Option<&Value>) -> Self {
        let Some(body) = body else {
            return Self::default();
        };

        let info = body
            .get("@Message.ExtendedInfo")
            .or_else(|| body.get("error").and_then(|e| e.get("@Message.ExtendedInfo")))
            .or_else(|| body.get("Messages"));

        let entries = match info.and_then(Value::as_array) {
            Some(items) => items
                .iter()
                .filter_map(|item| serde_json::from_value::<ErrorEntry>(item.clone()).ok())
                .collect(),
            None => Vec::new(),
        };

        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn class(&self) -> ErrorClass {
        classify(&self.entries)
    }
}

/// What a failed submission means for the apply loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// An outstanding configuration job blocks the queue
    ConfigPending,
    /// Another job is running; wait and retry
    JobRunning,
    /// Anything else, including an empty report
    Other,
}

/// Classify a list of error entries.
///
/// `ConfigPending` outranks `JobRunning` wherever it appears in the list.
pub fn classify(entries: &[ErrorEntry]) -> ErrorClass {
    if entries.iter().any(|e| e.has_code(IDRAC_CONFIG_PENDING)) {
        ErrorClass::ConfigPending
    } else if entries.iter().any(|e| e.has_code(IDRAC_JOB_RUNNING)) {
        ErrorClass::JobRunning
    } else {
        ErrorClass::Other
    }
}
