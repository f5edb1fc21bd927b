//! Cancellation signals.
//!
//! A [`Deadline`] combines an explicit cancellation token with an optional
//! point in time. Pool operations that may suspend (`get` while dialing,
//! `disconnect` while draining) take one and stop waiting as soon as it fires.
//!
//! ```rust
//! use wirepool_transport::Deadline;
//! use wirepool_core::ContextError;
//! use std::time::Duration;
//!
//! let deadline = Deadline::after(Duration::from_secs(3));
//! assert!(deadline.check().is_ok());
//!
//! deadline.cancel();
//! assert_eq!(deadline.check(), Err(ContextError::Cancelled));
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use wirepool_core::ContextError;

/// A cancellation signal with an optional deadline.
///
/// Cloning shares the underlying token: cancelling any clone cancels all of
/// them. Use [`Deadline::child`] for a signal that can be cancelled on its own.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Deadline {
    /// A signal that only fires when cancelled explicitly.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// A signal that fires `timeout` from now.
    ///
    /// A zero timeout is already expired.
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self::at(Instant::now() + timeout)
    }

    /// A signal that fires at `instant`.
    #[must_use]
    pub fn at(instant: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(instant),
        }
    }

    /// Wrap an existing cancellation token.
    #[must_use]
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Add or tighten the deadline of this signal.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let at = Instant::now() + timeout;
        self.deadline = Some(self.deadline.map_or(at, |current| current.min(at)));
        self
    }

    /// A signal cancelled whenever this one is, but cancellable on its own.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel the signal.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The underlying cancellation token.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, if there is one.
    ///
    /// Returns `Some(Duration::ZERO)` once the deadline has passed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Whether the signal has fired.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.check().is_err()
    }

    /// Check the signal without waiting.
    ///
    /// Cancellation takes precedence over an expired deadline.
    pub fn check(&self) -> Result<(), ContextError> {
        if self.token.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        match self.deadline {
            Some(at) if Instant::now() >= at => Err(ContextError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Wait until the signal fires and report why.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(at) => {
                tokio::select! {
                    biased;
                    () = self.token.cancelled() => ContextError::Cancelled,
                    () = tokio::time::sleep_until(at) => ContextError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                ContextError::Cancelled
            }
        }
    }

    /// Drive `future` to completion unless the signal fires first.
    ///
    /// Fails without polling `future` if the signal has already fired. When
    /// both complete in the same poll the future's output wins, so a finished
    /// dial is never thrown away.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, ContextError>
    where
        F: Future,
    {
        self.check()?;
        tokio::select! {
            biased;
            output = future => Ok(output),
            err = self.done() => Err(err),
        }
    }
}
