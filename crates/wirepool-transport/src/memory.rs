//! In-memory dialer for testing.
//!
//! Each dial creates a `tokio::io::duplex` pair: the pool gets one end, the
//! other end is parked in the dialer so tests can play the remote side.
//!
//! # Example
//!
//! ```rust
//! use wirepool_transport::{Address, Deadline, Dialer, MemoryDialer};
//!
//! # tokio_test::block_on(async {
//! let dialer = MemoryDialer::new();
//! let _conn = dialer.dial(&Address::new("mem"), &Deadline::none()).await.unwrap();
//! assert_eq!(dialer.dialed(), 1);
//! assert_eq!(dialer.take_peers().len(), 1);
//! # });
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::{AsyncWriteExt, DuplexStream};
use wirepool_core::{Address, TransportError};

use crate::deadline::Deadline;
use crate::traits::{Dialer, RawTransport};

/// Default buffer size for each direction of a duplex pair.
pub const DEFAULT_BUFFER: usize = 64 * 1024;

/// A dialer producing in-process duplex streams.
#[derive(Debug, Clone)]
pub struct MemoryDialer {
    buffer: usize,
    dialed: Arc<AtomicUsize>,
    peers: Arc<Mutex<Vec<DuplexStream>>>,
}

impl MemoryDialer {
    /// Create a dialer with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_BUFFER)
    }

    /// Create a dialer with a custom buffer size.
    #[must_use]
    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            buffer,
            dialed: Arc::new(AtomicUsize::new(0)),
            peers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of successful dials.
    #[must_use]
    pub fn dialed(&self) -> usize {
        self.dialed.load(Ordering::SeqCst)
    }

    /// Take the remote ends of every stream dialed so far.
    #[must_use]
    pub fn take_peers(&self) -> Vec<DuplexStream> {
        std::mem::take(&mut *self.peers.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Default for MemoryDialer {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialer for MemoryDialer {
    type Transport = DuplexStream;

    fn dial(
        &self,
        _address: &Address,
        _deadline: &Deadline,
    ) -> impl Future<Output = Result<DuplexStream, TransportError>> + Send {
        let (local, remote) = tokio::io::duplex(self.buffer);
        self.peers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(remote);
        self.dialed.fetch_add(1, Ordering::SeqCst);
        std::future::ready(Ok(local))
    }
}

impl RawTransport for DuplexStream {
    async fn close(&mut self) -> Result<(), TransportError> {
        match self.shutdown().await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
