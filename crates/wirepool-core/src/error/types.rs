//! The primary error type for pool operations.

use miette::Diagnostic;
use thiserror::Error;

use super::context::ContextError;
use super::transport::TransportError;

/// Errors returned by pool operations.
///
/// Dialer and cancellation errors are carried transparently, so their
/// `Display` output is exactly what the dialer or signal produced.
#[derive(Error, Diagnostic, Debug)]
pub enum PoolError {
    // ========================================================================
    // Lifecycle violations
    // ========================================================================
    /// `connect()` was called on a pool that is connecting or connected.
    #[error("pool is already connected")]
    #[diagnostic(
        code(wirepool::lifecycle::already_connected),
        help("Call disconnect() before connecting the pool again")
    )]
    AlreadyConnected,

    /// `disconnect()` was called on a pool that is not connected.
    #[error("pool is already disconnected")]
    #[diagnostic(code(wirepool::lifecycle::already_disconnected))]
    AlreadyDisconnected,

    /// A checkout was attempted while the pool is not connected.
    #[error("pool is disconnected")]
    #[diagnostic(
        code(wirepool::lifecycle::disconnected),
        help("Call connect() before checking out connections")
    )]
    Disconnected,

    /// `connect()` was called while a disconnect is still draining.
    #[error("pool is disconnecting")]
    #[diagnostic(code(wirepool::lifecycle::disconnecting))]
    Disconnecting,

    /// A connection was presented to a pool that did not create it.
    #[error("connection does not belong to this pool")]
    #[diagnostic(code(wirepool::lifecycle::wrong_pool))]
    WrongPool,

    /// The optional open-connection limit was reached.
    #[error("pool has {open} open connections (max: {max})")]
    #[diagnostic(code(wirepool::lifecycle::exhausted))]
    Exhausted {
        /// Connections currently open or being dialed.
        open: usize,
        /// The configured limit.
        max: usize,
    },

    // ========================================================================
    // Verbatim propagation
    // ========================================================================
    /// The caller's cancellation signal fired.
    #[error(transparent)]
    #[diagnostic(code(wirepool::context))]
    Context(#[from] ContextError),

    /// The dialer failed.
    #[error(transparent)]
    #[diagnostic(code(wirepool::transport))]
    Transport(#[from] TransportError),
}

impl PoolError {
    /// Whether this is a lifecycle violation (no state was mutated).
    #[must_use]
    pub const fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::AlreadyConnected
                | Self::AlreadyDisconnected
                | Self::Disconnected
                | Self::Disconnecting
                | Self::WrongPool
                | Self::Exhausted { .. }
        )
    }

    /// Whether this is a cancellation or deadline error.
    #[must_use]
    pub const fn is_context(&self) -> bool {
        matches!(self, Self::Context(_))
    }

    /// Whether this is a transport failure reported by the dialer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// The cancellation error, if this is one.
    #[must_use]
    pub const fn as_context(&self) -> Option<ContextError> {
        match self {
            Self::Context(err) => Some(*err),
            _ => None,
        }
    }
}
