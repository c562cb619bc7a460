//! Error types for idracctl-core
//!
//! Two layers:
//!
//! - [`TransportError`] is what a single HTTP exchange with the controller can
//!   produce. The retry loops inspect it to decide whether to try again.
//! - [`CoreError`] is what a workflow surfaces to its caller once a loop has
//!   given up, or when an input was never valid to begin with.
//!
//! # Example
//!
//! ```rust
//! use idracctl_core::{CoreError, TransportError};
//!
//! let err = TransportError::ServerSide {
//!     status: 503,
//!     message: "busy".to_string(),
//!     body: None,
//! };
//! assert!(err.is_retryable());
//!
//! let core: CoreError = CoreError::remote("import configuration", err);
//! assert!(core.is_remote_operation());
//! ```

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::classify::ControllerErrorReport;
use crate::power::PowerState;

/// Failure of a single request against the controller
#[derive(Error, Debug)]
pub enum TransportError {
    /// The controller answered 5xx
    #[error("server-side error ({status}): {message}")]
    ServerSide {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    /// The controller answered 400
    #[error("bad request ({status}): {message}")]
    BadRequest {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    /// 401 or 403
    #[error("access denied ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// 404
    #[error("resource not found: {uri}")]
    NotFound { uri: String },

    /// Any other non-success status
    #[error("unexpected response ({status}): {message}")]
    Status { status: u16, message: String },

    /// The controller could not be reached
    #[error("connection error: {0}")]
    Connection(String),

    /// The request did not complete in time
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The response could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A background task behind a task monitor ended in a failed state
    #[error("task failed: {message}")]
    TaskFailed {
        message: String,
        body: Option<Value>,
    },

    /// A URI could not be built or resolved
    #[error("invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },
}

impl TransportError {
    /// Build the error variant matching an HTTP status
    pub fn from_status(status: u16, uri: &str, body: Option<Value>) -> Self {
        let message = body
            .as_ref()
            .and_then(first_message)
            .unwrap_or_else(|| format!("HTTP {} from {}", status, uri));

        match status {
            400 => TransportError::BadRequest {
                status,
                message,
                body,
            },
            401 | 403 => TransportError::Unauthorized { status, message },
            404 => TransportError::NotFound {
                uri: uri.to_string(),
            },
            500..=599 => TransportError::ServerSide {
                status,
                message,
                body,
            },
            _ => TransportError::Status { status, message },
        }
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, TransportError::ServerSide { .. })
    }

    /// Returns true if this is a bad request error (400)
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(self, TransportError::BadRequest { .. })
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TransportError::Unauthorized { .. })
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::NotFound { .. })
    }

    /// Returns true if trying the same request again may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::ServerSide { .. }
                | TransportError::BadRequest { .. }
                | TransportError::TaskFailed { .. }
                | TransportError::Connection(_)
                | TransportError::Timeout(_)
        )
    }

    /// The JSON error body returned by the controller, if any
    pub fn body(&self) -> Option<&Value> {
        match self {
            TransportError::ServerSide { body, .. }
            | TransportError::BadRequest { body, .. }
            | TransportError::TaskFailed { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Extended error information carried by the failure body
    pub fn report(&self) -> ControllerErrorReport {
        ControllerErrorReport::from_body(self.body())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

/// Pull the first human readable message out of a Redfish error body
fn first_message(body: &Value) -> Option<String> {
    let error = body.get("error").unwrap_or(body);
    error
        .get("@Message.ExtendedInfo")
        .and_then(Value::as_array)
        .and_then(|entries| entries.first())
        .and_then(|entry| entry.get("Message"))
        .or_else(|| error.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Error surfaced by idracctl workflows
#[derive(Error, Debug)]
pub enum CoreError {
    /// Caller input that can never succeed; not retried
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A remote operation failed and will not be retried
    #[error("{operation} failed: {source}")]
    RemoteOperation {
        operation: String,
        #[source]
        source: TransportError,
    },

    /// The controller did not come back after a disruptive action
    #[error("connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<TransportError>,
    },

    /// A link or action target needed by a workflow is absent
    #[error("missing link on manager resource: {0}")]
    MissingLink(String),

    /// The managed system never reached the requested power state
    #[error("system did not reach power state {target} within {waited:?}")]
    PowerTransitionTimeout { target: PowerState, waited: Duration },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Wrap a transport failure as a fatal remote operation error
    pub fn remote(operation: impl Into<String>, source: TransportError) -> Self {
        CoreError::RemoteOperation {
            operation: operation.into(),
            source,
        }
    }

    /// Returns true for caller input errors
    #[must_use]
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, CoreError::InvalidParameter(_))
    }

    /// Returns true when a remote operation failed for good
    #[must_use]
    pub fn is_remote_operation(&self) -> bool {
        matches!(self, CoreError::RemoteOperation { .. })
    }

    /// Returns true when the controller stayed unreachable
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, CoreError::Connection { .. })
    }

    /// Returns true if this is a timeout of any kind
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::RemoteOperation { source, .. } => {
                matches!(source, TransportError::Timeout(_))
            }
            CoreError::PowerTransitionTimeout { .. } => true,
            _ => false,
        }
    }

    /// The transport failure behind this error, if any
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            CoreError::RemoteOperation { source, .. } => Some(source),
            CoreError::Connection { source, .. } => source.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_status_maps_variants() {
        assert!(TransportError::from_status(400, "/x", None).is_bad_request());
        assert!(TransportError::from_status(401, "/x", None).is_unauthorized());
        assert!(TransportError::from_status(403, "/x", None).is_unauthorized());
        assert!(TransportError::from_status(404, "/x", None).is_not_found());
        assert!(TransportError::from_status(500, "/x", None).is_server_error());
        assert!(TransportError::from_status(503, "/x", None).is_server_error());
        assert!(matches!(
            TransportError::from_status(409, "/x", None),
            TransportError::Status { status: 409, .. }
        ));
    }

    #[test]
    fn test_retryable_classes() {
        assert!(TransportError::Connection("refused".into()).is_retryable());
        assert!(TransportError::Timeout("30s".into()).is_retryable());
        assert!(TransportError::from_status(500, "/x", None).is_retryable());
        assert!(TransportError::from_status(400, "/x", None).is_retryable());
        assert!(!TransportError::from_status(401, "/x", None).is_retryable());
        assert!(!TransportError::from_status(404, "/x", None).is_retryable());
        assert!(!TransportError::Decode("eof".into()).is_retryable());
    }

    #[test]
    fn test_message_taken_from_extended_info() {
        let body = json!({
            "error": {
                "code": "Base.1.8.GeneralError",
                "message": "A general error has occurred.",
                "@Message.ExtendedInfo": [
                    {"MessageId": "IDRAC.2.8.LC068", "Message": "Pending configuration changes exist."}
                ]
            }
        });
        let err = TransportError::from_status(400, "/x", Some(body));
        assert!(err.to_string().contains("Pending configuration changes exist."));
        assert_eq!(err.report().entries.len(), 1);
    }

    #[test]
    fn test_message_falls_back_to_status() {
        let err = TransportError::from_status(502, "/redfish/v1", None);
        assert_eq!(
            err.to_string(),
            "server-side error (502): HTTP 502 from /redfish/v1"
        );
        assert!(err.report().is_empty());
    }

    #[test]
    fn test_core_error_predicates() {
        let err = CoreError::remote("reset", TransportError::Timeout("slow".into()));
        assert!(err.is_remote_operation());
        assert!(err.is_timeout());
        assert!(err.transport().is_some());

        let err = CoreError::InvalidParameter("USBStick".into());
        assert!(err.is_invalid_parameter());
        assert!(!err.is_timeout());

        let err = CoreError::Connection {
            message: "not ready".into(),
            source: None,
        };
        assert!(err.is_connection());
        assert!(err.transport().is_none());
    }

    #[test]
    fn test_core_error_display() {
        let err = CoreError::remote(
            "import configuration",
            TransportError::Connection("refused".into()),
        );
        assert_eq!(
            err.to_string(),
            "import configuration failed: connection error: refused"
        );

        let err = CoreError::PowerTransitionTimeout {
            target: PowerState::Off,
            waited: Duration::from_secs(600),
        };
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "system did not reach power state Off within 600s");
    }
}
