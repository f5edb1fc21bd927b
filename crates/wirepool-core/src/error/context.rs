//! Cancellation errors.

use miette::Diagnostic;
use thiserror::Error;

/// Why a caller-supplied cancellation signal stopped an operation.
#[derive(Error, Diagnostic, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextError {
    /// The signal was cancelled explicitly.
    #[error("context canceled")]
    #[diagnostic(code(wirepool::context::cancelled))]
    Cancelled,

    /// The signal's deadline passed.
    #[error("context deadline exceeded")]
    #[diagnostic(code(wirepool::context::deadline_exceeded))]
    DeadlineExceeded,
}
