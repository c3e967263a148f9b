//! Per-connection bookkeeping.

use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Which way bytes flowed over the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Local input to the peer.
    Outbound,
    /// Peer to local output.
    Inbound,
}

/// Lifecycle of a relayed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Bytes are flowing.
    Active,
    /// Half-closed and released.
    Closed,
}

/// Information about a single relayed connection.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Unique connection identifier, used to correlate log lines.
    pub id: Uuid,

    /// Remote end of the connection.
    pub peer_addr: SocketAddr,

    /// Direction of the relay.
    pub direction: Direction,

    /// Current state.
    pub state: ConnectionState,

    /// When the relay started.
    pub started_at: DateTime<Utc>,

    /// When the relay finished (if it has).
    pub closed_at: Option<DateTime<Utc>>,

    /// Bytes moved so far.
    pub bytes: u64,
}

impl ConnectionInfo {
    /// Start tracking a connection.
    pub fn new(peer_addr: SocketAddr, direction: Direction) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer_addr,
            direction,
            state: ConnectionState::Active,
            started_at: Utc::now(),
            closed_at: None,
            bytes: 0,
        }
    }

    /// Mark the connection as closed with its final byte count.
    pub fn set_closed(&mut self, bytes: u64) {
        self.bytes = bytes;
        self.state = ConnectionState::Closed;
        self.closed_at = Some(Utc::now());
    }

    /// Connection duration in milliseconds.
    pub fn duration_millis(&self) -> i64 {
        let end = self.closed_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closing_records_bytes_and_timestamp() {
        let mut info = ConnectionInfo::new("127.0.0.1:3000".parse().unwrap(), Direction::Inbound);
        assert_eq!(info.state, ConnectionState::Active);
        assert!(info.closed_at.is_none());

        info.set_closed(42);
        assert_eq!(info.state, ConnectionState::Closed);
        assert_eq!(info.bytes, 42);
        assert!(info.duration_millis() >= 0);
    }
}
