//! Error types for command validation, registry calls, and reconciliation.

use std::fmt;

use thiserror::Error;

/// Boxed error used for transport-level failures from any backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors in the client configuration, detected before any request is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("neither a bot token nor a client credentials token is set")]
    MissingCredentials,

    #[error("both a bot token and a client credentials token are set; exactly one is allowed")]
    ConflictingCredentials,

    #[error("application id not set")]
    MissingApplicationId,

    #[error("application id is not a snowflake, got: {value}")]
    InvalidApplicationId { value: String },

    #[error("api root not set")]
    MissingApiRoot,

    #[error("api root cannot end in /, got: `{value}`")]
    TrailingSlash { value: String },

    #[error("cannot build HTTP client: {message}")]
    HttpClient { message: String },
}

impl ConfigError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Single field-level validation problem with path context.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    /// JSON Pointer (RFC 6901) to the offending field in the declarative form.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// One or more fields failed validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("validation failed with {} error(s): {}", errors.len(), join_errors(errors))]
pub struct FormatError {
    pub errors: Vec<FieldError>,
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl FormatError {
    /// Build a format error for a single field.
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                path: path.into(),
                message: message.into(),
            }],
        }
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Network-level failure reaching the registry (connect, TLS, timeout, body read).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "connection failed".to_string()
        } else {
            err.to_string()
        };
        Self::with_source(message, err)
    }
}

/// Errors from a single registry round trip.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{method} call to {path} failed: {source}")]
    Transport {
        method: String,
        path: String,
        #[source]
        source: TransportError,
    },

    #[error("{method} {path} rejected by registry with status {status}: {body}")]
    Api {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response shape from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot encode request body for {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    /// Status code of a registry rejection, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the registry answered that the addressed command does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ClientError::Transport { .. } | ClientError::Api { .. } => 3,
            ClientError::Decode { .. } | ClientError::Encode { .. } => 2,
        }
    }
}

/// Lifecycle phase an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Create,
    Read,
    Update,
    Delete,
    List,
    Sweep,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Create => "create",
            Phase::Read => "read",
            Phase::Update => "update",
            Phase::Delete => "delete",
            Phase::List => "list",
            Phase::Sweep => "sweep",
        };
        f.write_str(name)
    }
}

/// Errors from a reconciliation operation, labeled with the failing phase.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{phase}: {source}")]
    Format {
        phase: Phase,
        #[source]
        source: FormatError,
    },

    #[error("{phase}: {source}")]
    Client {
        phase: Phase,
        #[source]
        source: ClientError,
    },

    #[error("{phase}: command {id} was written but could not be read back")]
    Vanished { phase: Phase, id: String },

    #[error("{phase}: registry response carried no command id")]
    MissingId { phase: Phase },
}

impl ReconcileError {
    pub fn phase(&self) -> Phase {
        match self {
            ReconcileError::Format { phase, .. }
            | ReconcileError::Client { phase, .. }
            | ReconcileError::Vanished { phase, .. }
            | ReconcileError::MissingId { phase } => *phase,
        }
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReconcileError::Format { source, .. } => source.exit_code(),
            ReconcileError::Client { source, .. } => source.exit_code(),
            ReconcileError::Vanished { .. } | ReconcileError::MissingId { .. } => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(ConfigError::MissingCredentials.exit_code(), 2);
        assert_eq!(FormatError::single("/name", "bad").exit_code(), 1);

        let err = ClientError::Api {
            method: "GET".into(),
            path: "/commands".into(),
            status: 500,
            body: "oops".into(),
        };
        assert_eq!(err.exit_code(), 3);

        let err = ReconcileError::Vanished {
            phase: Phase::Create,
            id: "1".into(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn field_error_display() {
        let err = FieldError {
            path: "/option/0/name".into(),
            message: "not lower case".into(),
        };
        assert_eq!(err.to_string(), "/option/0/name: not lower case");
    }

    #[test]
    fn format_error_lists_every_field() {
        let err = FormatError {
            errors: vec![
                FieldError {
                    path: "/name".into(),
                    message: "too long".into(),
                },
                FieldError {
                    path: "/description".into(),
                    message: "empty".into(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "validation failed with 2 error(s): /name: too long; /description: empty"
        );
    }

    #[test]
    fn not_found_detection() {
        let err = ClientError::Api {
            method: "GET".into(),
            path: "/commands/1".into(),
            status: 404,
            body: String::new(),
        };
        assert!(err.is_not_found());

        let err = ClientError::Transport {
            method: "GET".into(),
            path: "/commands/1".into(),
            source: TransportError::new("connection refused"),
        };
        assert!(!err.is_not_found());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn reconcile_error_carries_phase() {
        let err = ReconcileError::Format {
            phase: Phase::Update,
            source: FormatError::single("/name", "bad"),
        };
        assert_eq!(err.phase(), Phase::Update);
        assert!(err.to_string().starts_with("update: "));
    }
}
