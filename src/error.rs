use std::io;
use thiserror::Error;

/// Errors surfaced by every layer of the client.
///
/// `Io` means the connection itself is broken and a fresh transport is
/// needed. `RemoteRejected` is a well-formed `FAIL` from the server or the
/// device daemon and is not worth retrying as-is.
#[derive(Debug, Error)]
pub enum AdbError {
    #[error("ADB connection error: {0}")]
    Io(#[from] io::Error),

    #[error("ADB protocol error: {0}")]
    Protocol(String),

    #[error("rejected by remote: {0}")]
    RemoteRejected(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("No device found matching ID: {0}")]
    DeviceNotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AdbError {
    pub fn protocol(msg: impl Into<String>) -> Self {
        AdbError::Protocol(msg.into())
    }

    pub fn is_remote_rejection(&self) -> bool {
        matches!(self, AdbError::RemoteRejected(_))
    }

    /// True when the peer went away, either with a clean close or a reset.
    pub fn is_disconnect(&self) -> bool {
        match self {
            AdbError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::NotConnected
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AdbError>;
