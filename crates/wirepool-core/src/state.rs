//! Pool lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a pool.
///
/// Transitions only along
/// `Disconnected -> Connecting -> Connected -> Disconnecting -> Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolState {
    /// Initial and terminal state. Holds no resources.
    #[default]
    Disconnected,
    /// `connect()` is initialising internal structures.
    Connecting,
    /// Connections may be checked out and returned.
    Connected,
    /// `disconnect()` is draining idle and in-flight connections.
    Disconnecting,
}

impl PoolState {
    /// Whether `connect()` may start from this state.
    #[must_use]
    pub const fn can_connect(self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// Whether checkouts are served in this state.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Whether `next` is a legal successor of this state.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Disconnected, Self::Connecting)
                | (Self::Connecting, Self::Connected)
                | (Self::Connected, Self::Disconnecting)
                | (Self::Disconnecting, Self::Disconnected)
        )
    }
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnecting => write!(f, "disconnecting"),
        }
    }
}
