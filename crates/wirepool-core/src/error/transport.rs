//! Transport error types.

use std::fmt;
use std::time::Duration;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::BoxError;

/// Classification of transport errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    /// Connection could not be established.
    ConnectionFailed,
    /// Connection was closed unexpectedly.
    ConnectionClosed,
    /// DNS resolution or address parsing failed.
    InvalidAddress,
    /// Operation timed out.
    Timeout,
    /// Any other I/O failure.
    Io,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed => write!(f, "connection failed"),
            Self::ConnectionClosed => write!(f, "connection closed"),
            Self::InvalidAddress => write!(f, "invalid address"),
            Self::Timeout => write!(f, "timeout"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

/// Errors produced by dialers and raw transports.
#[derive(Error, Diagnostic, Debug)]
pub enum TransportError {
    /// I/O error from `std::io::Error`.
    #[error("I/O error: {0}")]
    #[diagnostic(code(wirepool::transport::io))]
    Io(#[from] std::io::Error),

    /// Connection could not be established.
    #[error("Connection error: {message}")]
    #[diagnostic(code(wirepool::transport::connection))]
    Connection {
        /// Error message.
        message: String,
        /// The underlying error, if available.
        #[source]
        source: Option<BoxError>,
    },

    /// The transport was already closed.
    #[error("Connection closed")]
    #[diagnostic(code(wirepool::transport::closed))]
    ConnectionClosed,

    /// The address could not be resolved or parsed.
    #[error("Invalid address: {address}")]
    #[diagnostic(
        code(wirepool::transport::invalid_address),
        help("Use a host:port pair for TCP or a filesystem path for Unix sockets")
    )]
    InvalidAddress {
        /// The offending address.
        address: String,
    },

    /// Timeout occurred.
    #[error("{operation} timed out after {duration:?}")]
    #[diagnostic(code(wirepool::transport::timeout))]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// How long the operation waited.
        duration: Duration,
    },
}

impl TransportError {
    /// Create a connection error from a message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection error that keeps its cause.
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create an invalid address error.
    pub fn invalid_address(address: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
        }
    }

    /// Get the transport error kind.
    #[must_use]
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            Self::Io(e) => match e.kind() {
                std::io::ErrorKind::ConnectionRefused
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::NotConnected => TransportErrorKind::ConnectionFailed,
                std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::BrokenPipe => {
                    TransportErrorKind::ConnectionClosed
                }
                std::io::ErrorKind::TimedOut => TransportErrorKind::Timeout,
                std::io::ErrorKind::AddrNotAvailable | std::io::ErrorKind::InvalidInput => {
                    TransportErrorKind::InvalidAddress
                }
                _ => TransportErrorKind::Io,
            },
            Self::Connection { .. } => TransportErrorKind::ConnectionFailed,
            Self::ConnectionClosed => TransportErrorKind::ConnectionClosed,
            Self::InvalidAddress { .. } => TransportErrorKind::InvalidAddress,
            Self::Timeout { .. } => TransportErrorKind::Timeout,
        }
    }
}
