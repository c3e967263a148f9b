//! Statistics across the connections of one session.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::connection::{ConnectionInfo, Direction};

/// Totals for a session. In repeat-listen mode these span every peer.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Connections relayed to completion.
    pub connections: u64,

    /// Total bytes sent to peers.
    pub bytes_sent: u64,

    /// Total bytes received from peers.
    pub bytes_received: u64,

    /// Session start time.
    pub started_at: DateTime<Utc>,
}

impl SessionStats {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self {
            connections: 0,
            bytes_sent: 0,
            bytes_received: 0,
            started_at: Utc::now(),
        }
    }

    /// Fold a finished connection into the totals.
    pub fn record(&mut self, conn: &ConnectionInfo) {
        self.connections += 1;
        match conn.direction {
            Direction::Outbound => self.bytes_sent += conn.bytes,
            Direction::Inbound => self.bytes_received += conn.bytes,
        }

        info!(
            "Connection {} with {} closed: {} bytes {} in {}ms",
            conn.id,
            conn.peer_addr,
            conn.bytes,
            match conn.direction {
                Direction::Outbound => "sent",
                Direction::Inbound => "received",
            },
            conn.duration_millis()
        );
    }

    /// Session uptime in seconds.
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}
