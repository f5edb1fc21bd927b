//! Dialer and raw transport traits.
//!
//! # Overview
//!
//! - [`RawTransport`]: a connection the pool can physically close
//! - [`Dialer`]: the capability that opens a [`RawTransport`] to an address
//! - [`DialerFn`]: adapts a closure into a [`Dialer`]
//!
//! The pool never retries a failed dial and never interprets the bytes that
//! flow over a transport.
//!
//! # Implementing Dialer
//!
//! ```rust
//! use std::future::Future;
//! use wirepool_transport::{Address, Deadline, Dialer, TransportError};
//! use tokio::net::TcpStream;
//!
//! struct LocalhostDialer;
//!
//! impl Dialer for LocalhostDialer {
//!     type Transport = TcpStream;
//!
//!     fn dial(
//!         &self,
//!         address: &Address,
//!         _deadline: &Deadline,
//!     ) -> impl Future<Output = Result<TcpStream, TransportError>> + Send {
//!         let target = format!("127.0.0.1:{}", address.as_str());
//!         async move { Ok(TcpStream::connect(target).await?) }
//!     }
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use wirepool_core::{Address, TransportError};

use crate::deadline::Deadline;

/// A raw connection owned by the pool.
///
/// `close` is called at most once per transport, outside of any pool lock.
pub trait RawTransport: Send + 'static {
    /// Physically close the connection.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Opens raw connections to an address.
///
/// Implementations must respect `deadline` promptly and must never return a
/// transport together with an error. The pool additionally races every dial
/// against the caller's deadline, so a dialer that ignores it is still
/// cancelled, just less eagerly.
pub trait Dialer: Send + Sync + 'static {
    /// The transport this dialer produces.
    type Transport: RawTransport;

    /// Open a new connection to `address`.
    fn dial(
        &self,
        address: &Address,
        deadline: &Deadline,
    ) -> impl Future<Output = Result<Self::Transport, TransportError>> + Send;
}

impl<D: Dialer> Dialer for Arc<D> {
    type Transport = D::Transport;

    fn dial(
        &self,
        address: &Address,
        deadline: &Deadline,
    ) -> impl Future<Output = Result<Self::Transport, TransportError>> + Send {
        (**self).dial(address, deadline)
    }
}

/// A [`Dialer`] built from a closure.
///
/// The closure receives owned copies of the address and deadline so the
/// returned future can be `'static`.
#[derive(Clone)]
pub struct DialerFn<F> {
    f: F,
}

impl<F> std::fmt::Debug for DialerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialerFn").finish_non_exhaustive()
    }
}

/// Build a [`Dialer`] from a closure.
pub const fn dialer_fn<F>(f: F) -> DialerFn<F> {
    DialerFn { f }
}

impl<F, Fut, T> Dialer for DialerFn<F>
where
    F: Fn(Address, Deadline) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TransportError>> + Send,
    T: RawTransport,
{
    type Transport = T;

    fn dial(
        &self,
        address: &Address,
        deadline: &Deadline,
    ) -> impl Future<Output = Result<T, TransportError>> + Send {
        (self.f)(address.clone(), deadline.clone())
    }
}
