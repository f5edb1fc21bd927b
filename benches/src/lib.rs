//! Benchmarks for wirepool.
//!
//! This crate contains Criterion benchmarks for measuring performance of:
//!
//! - **Checkout**: `get`/`release` latency on a warm pool, sequential and
//!   under task contention
//! - **Lifecycle**: connect/disconnect cycles with idle and checked-out
//!   connections
//!
//! ## Running Benchmarks
//!
//! Run all benchmarks:
//! ```bash
//! cargo bench --package wirepool-benches
//! ```
//!
//! Run specific benchmark:
//! ```bash
//! cargo bench --package wirepool-benches --bench checkout
//! cargo bench --package wirepool-benches --bench lifecycle
//! ```
//!
//! Run with fewer samples for quick validation:
//! ```bash
//! cargo bench --package wirepool-benches -- --sample-size 10
//! ```
//!
//! All benchmarks dial through the in-memory dialer, so they measure pool
//! bookkeeping rather than the network.
