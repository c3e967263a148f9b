//! Byte relay in both directions.

pub mod receiver;
pub mod sender;

pub use receiver::{drain, Receiver};
pub use sender::{relay, send_chunk, Sender};
