//! Testing utilities for wirepool.
//!
//! This crate provides dialers that record or misbehave on purpose, plus
//! timeout helpers for async tests:
//!
//! - [`TrackingDialer`]: counts every dial and every physical close
//! - [`FailingDialer`]: every dial fails with a connection error
//! - [`SlowDialer`]: delays another dialer, ignoring the deadline
//! - [`async_helpers`]: `with_timeout` and friends
//!
//! # Overview
//!
//! ```rust
//! use wirepool_testing::TrackingDialer;
//! use wirepool_transport::{Deadline, Pool};
//!
//! # tokio_test::block_on(async {
//! let dialer = TrackingDialer::new();
//! let log = dialer.log();
//! let pool = Pool::new("mem", 1, dialer);
//! pool.connect().await.unwrap();
//!
//! let handle = pool.get(&Deadline::none()).await.unwrap();
//! handle.release().await.unwrap();
//!
//! assert_eq!(log.dialed(), 1);
//! assert_eq!(log.closed(), 0);
//! # });
//! ```

#![deny(missing_docs)]

pub mod async_helpers;
pub mod dialers;

// Re-export commonly used types
pub use async_helpers::{assert_completes_within, with_default_timeout, with_timeout};
pub use dialers::{DialLog, FailingDialer, NullTransport, SlowDialer, Tracked, TrackingDialer};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::async_helpers::{
        DEFAULT_TIMEOUT, assert_completes_within, assert_times_out, with_default_timeout,
        with_timeout,
    };
    pub use crate::dialers::{
        DialLog, FailingDialer, NullTransport, SlowDialer, Tracked, TrackingDialer,
    };
}
