//! Unix domain socket dialer.
//!
//! The pool address is interpreted as a filesystem path.

use std::future::Future;

use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tracing::debug;
use wirepool_core::{Address, TransportError};

use crate::deadline::Deadline;
use crate::traits::{Dialer, RawTransport};

/// Dials Unix domain socket connections.
#[derive(Debug, Clone, Default)]
pub struct UnixDialer {
    _private: (),
}

impl UnixDialer {
    /// Create a new Unix socket dialer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Dialer for UnixDialer {
    type Transport = UnixStream;

    fn dial(
        &self,
        address: &Address,
        deadline: &Deadline,
    ) -> impl Future<Output = Result<UnixStream, TransportError>> + Send {
        let address = address.clone();
        let timeout = deadline.remaining();

        async move {
            let connect = UnixStream::connect(address.as_str());
            let stream = match timeout {
                Some(duration) => tokio::time::timeout(duration, connect)
                    .await
                    .map_err(|_| TransportError::Timeout {
                        operation: format!("connect to {address}"),
                        duration,
                    })?
                    .map_err(|e| {
                        TransportError::connection_with_source(
                            format!("Failed to connect to Unix socket '{address}'"),
                            e,
                        )
                    })?,
                None => connect.await.map_err(|e| {
                    TransportError::connection_with_source(
                        format!("Failed to connect to Unix socket '{address}'"),
                        e,
                    )
                })?,
            };

            debug!(%address, "Dialed Unix socket connection");
            Ok(stream)
        }
    }
}

impl RawTransport for UnixStream {
    async fn close(&mut self) -> Result<(), TransportError> {
        match self.shutdown().await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
