//! Error handling for the wirepool crates.
//!
//! All pool operations return [`PoolError`]. Its variants fall into three
//! classes:
//!
//! - **Lifecycle violations** (`AlreadyConnected`, `AlreadyDisconnected`,
//!   `Disconnected`, `Disconnecting`, `WrongPool`, `Exhausted`): returned
//!   synchronously, nothing was mutated, safe to retry once the precondition
//!   holds.
//! - **Cancellation** ([`ContextError`]): the caller's signal fired. Surfaced
//!   verbatim.
//! - **Transport failures** ([`TransportError`]): whatever the dialer returned,
//!   never wrapped or retried by the pool.
//!
//! Bookkeeping conflicts such as returning a connection twice are not errors.

mod context;
mod transport;
mod types;

pub use context::ContextError;
pub use transport::{TransportError, TransportErrorKind};
pub use types::PoolError;

/// A boxed error type for wrapping arbitrary dialer failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
