//! Error types for the BC127 driver.
//!
//! Protocol outcomes (OK, ERROR, timeout) are values of
//! [`OpResult`](crate::types::OpResult), not errors. [`Error`] is reserved for
//! failures outside the protocol: a broken serial link, a closed channel, or
//! an invalid configuration.

use crate::types::OpResult;

/// The error type for all bc127 operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A channel-level failure (serial port open, write, or read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The module did not finish an exchange before its deadline.
    ///
    /// Only produced by [`OpResult::into_result`]; engine operations report
    /// timeouts as [`OpResult::Timeout`].
    #[error("timeout waiting for response")]
    Timeout,

    /// An invalid parameter was passed to a command or builder.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The module answered, but not with success.
    #[error("command failed: {0}")]
    Rejected(OpResult),

    /// The channel has been closed or the IO worker has exited.
    #[error("not connected")]
    NotConnected,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_transport() {
        let e = Error::Transport("port busy".into());
        assert_eq!(e.to_string(), "transport error: port busy");
    }

    #[test]
    fn error_display_timeout() {
        assert_eq!(Error::Timeout.to_string(), "timeout waiting for response");
    }

    #[test]
    fn error_display_invalid_parameter() {
        let e = Error::InvalidParameter("baud rate 12345".into());
        assert_eq!(e.to_string(), "invalid parameter: baud rate 12345");
    }

    #[test]
    fn error_display_rejected() {
        let e = Error::Rejected(OpResult::ModuleError);
        assert_eq!(e.to_string(), "command failed: module error");
    }

    #[test]
    fn error_display_not_connected() {
        assert_eq!(Error::NotConnected.to_string(), "not connected");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
