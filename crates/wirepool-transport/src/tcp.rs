//! TCP dialer.

use std::future::Future;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, trace};
use wirepool_core::{Address, TransportError};

use crate::deadline::Deadline;
use crate::traits::{Dialer, RawTransport};

/// Dials plain TCP connections.
///
/// The effective connect timeout is the shorter of the configured
/// `connect_timeout` and the time left on the caller's deadline.
#[derive(Debug, Clone)]
pub struct TcpDialer {
    connect_timeout: Option<Duration>,
    nodelay: bool,
}

impl TcpDialer {
    /// Create a dialer with no connect timeout and `TCP_NODELAY` enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Enable or disable `TCP_NODELAY` on dialed sockets.
    #[must_use]
    pub const fn nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    fn effective_timeout(&self, deadline: &Deadline) -> Option<Duration> {
        match (self.connect_timeout, deadline.remaining()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

impl Default for TcpDialer {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            nodelay: true,
        }
    }
}

impl Dialer for TcpDialer {
    type Transport = TcpStream;

    fn dial(
        &self,
        address: &Address,
        deadline: &Deadline,
    ) -> impl Future<Output = Result<TcpStream, TransportError>> + Send {
        let address = address.clone();
        let timeout = self.effective_timeout(deadline);
        let nodelay = self.nodelay;

        async move {
            if address.is_empty() {
                return Err(TransportError::invalid_address(address.as_str()));
            }

            let connect = TcpStream::connect(address.as_str());
            let stream = match timeout {
                Some(duration) => tokio::time::timeout(duration, connect)
                    .await
                    .map_err(|_| TransportError::Timeout {
                        operation: format!("connect to {address}"),
                        duration,
                    })??,
                None => connect.await?,
            };

            if nodelay {
                stream.set_nodelay(true)?;
            }

            debug!(%address, local = ?stream.local_addr().ok(), "Dialed TCP connection");
            Ok(stream)
        }
    }
}

impl RawTransport for TcpStream {
    async fn close(&mut self) -> Result<(), TransportError> {
        match self.shutdown().await {
            Ok(()) => Ok(()),
            // Peer already went away; the socket is closed either way.
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => {
                trace!("TCP peer already disconnected");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
