//! Storage error types.

use std::fmt;

use thiserror::Error;

/// Result type alias using `StorageError`.
pub type StorageResult<T> = Result<T, StorageError>;

/// Status code reported by the remote file-transfer protocol.
///
/// Values follow the SFTP v3 `SSH_FX_*` numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// End of file or directory listing.
    Eof,
    /// The path does not exist.
    NoSuchFile,
    /// The user lacks permission for the operation.
    PermissionDenied,
    /// Generic failure (also used for "already exists" and "not empty").
    Failure,
    /// Malformed packet or protocol incompatibility.
    BadMessage,
    /// No connection to the server.
    NoConnection,
    /// The connection was lost.
    ConnectionLost,
    /// The server does not support the operation.
    OpUnsupported,
    /// Any other code.
    Other(u32),
}

impl StatusCode {
    /// Map a raw `SSH_FX_*` code.
    #[must_use]
    pub const fn from_raw(code: u32) -> Self {
        match code {
            1 => Self::Eof,
            2 => Self::NoSuchFile,
            3 => Self::PermissionDenied,
            4 => Self::Failure,
            5 => Self::BadMessage,
            6 => Self::NoConnection,
            7 => Self::ConnectionLost,
            8 => Self::OpUnsupported,
            other => Self::Other(other),
        }
    }

    /// The raw `SSH_FX_*` code.
    #[must_use]
    pub const fn raw(self) -> u32 {
        match self {
            Self::Eof => 1,
            Self::NoSuchFile => 2,
            Self::PermissionDenied => 3,
            Self::Failure => 4,
            Self::BadMessage => 5,
            Self::NoConnection => 6,
            Self::ConnectionLost => 7,
            Self::OpUnsupported => 8,
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Eof => "end of file",
            Self::NoSuchFile => "no such file",
            Self::PermissionDenied => "permission denied",
            Self::Failure => "failure",
            Self::BadMessage => "bad message",
            Self::NoConnection => "no connection",
            Self::ConnectionLost => "connection lost",
            Self::OpUnsupported => "operation unsupported",
            Self::Other(code) => return write!(f, "status {code}"),
        };
        f.write_str(name)
    }
}

/// A failed remote operation together with its protocol status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code} ({path}): {message}")]
pub struct StatusError {
    /// Machine-checkable status code.
    pub code: StatusCode,
    /// Remote path the operation targeted.
    pub path: String,
    /// Server or transport supplied message.
    pub message: String,
}

impl StatusError {
    /// Create a status error.
    #[must_use]
    pub fn new(code: StatusCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The remote protocol rejected an operation.
    #[error("remote operation failed: {0}")]
    Status(#[from] StatusError),

    /// The session could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Invalid adapter configuration.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// A path still contains an uninterpolated `:token`.
    #[error("path contains unresolved placeholder: {0}")]
    UnresolvedPlaceholder(String),

    /// Local file I/O failed during a transfer.
    #[error("local I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Create a status error.
    #[must_use]
    pub fn status(code: StatusCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Status(StatusError::new(code, path, message))
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Protocol status code, if this is a status error.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status(status) => Some(status.code),
            _ => None,
        }
    }

    /// Whether the remote side reported that the path does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(StatusCode::NoSuchFile)
    }
}
