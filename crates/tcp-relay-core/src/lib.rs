//! # TCP-Relay Core
//!
//! Connection lifecycle and byte relay logic for tcp-relay.
//! In sending mode bytes flow from local input to a peer; in listening mode
//! from an accepted peer to local output.

pub mod config;
pub mod connection;
pub mod endpoint;
pub mod error;
pub mod relay;
pub mod session;
pub mod stats;

pub use config::{FileConfig, LoggingConfig, Mode, SessionConfig, TransferConfig};
pub use connection::{ConnectionInfo, ConnectionState, Direction};
pub use endpoint::Listener;
pub use error::{Error, Result};
pub use relay::{Receiver, Sender};
pub use session::Session;
pub use stats::SessionStats;
