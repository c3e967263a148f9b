//! Receiving side: an accepted peer to local output.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};

use tracing::{debug, info};

use crate::config::TransferConfig;
use crate::connection::{ConnectionInfo, Direction};
use crate::endpoint::{self, Listener};
use crate::error::{Error, Result};

/// Copy `reader` to `output` until the reader reports end of stream.
///
/// Every chunk is written and flushed as soon as it arrives, and `output` is
/// flushed once more before returning. Returns the number of bytes received.
pub fn drain<R, W>(reader: &mut R, output: &mut W, buffer_size: usize) -> Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; buffer_size];
    let mut total: u64 = 0;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::transfer("recv")(e)),
        };

        output
            .write_all(&buf[..n])
            .map_err(Error::transfer("write"))?;
        output.flush().map_err(Error::transfer("flush"))?;
        total += n as u64;
        debug!("Received chunk of {} bytes ({} total)", n, total);

        buf[..n].fill(0);
    }

    output.flush().map_err(Error::transfer("flush"))?;
    Ok(total)
}

/// An accepted inbound relay.
#[derive(Debug)]
pub struct Receiver {
    stream: TcpStream,
    info: ConnectionInfo,
    buffer_size: usize,
}

impl Receiver {
    /// Block until one peer connects to `listener`.
    pub fn accept_one(listener: &Listener, transfer: &TransferConfig) -> Result<Self> {
        let (stream, peer) = listener.accept()?;
        endpoint::apply_timeout(&stream, transfer.timeout)?;
        info!("Connection from {}", peer);

        Ok(Self {
            stream,
            info: ConnectionInfo::new(peer, Direction::Inbound),
            buffer_size: transfer.buffer_size,
        })
    }

    /// Drain the peer into `output`, half-close the read side and release
    /// the connection.
    pub fn drain<W: Write + ?Sized>(mut self, output: &mut W) -> Result<ConnectionInfo> {
        let received = drain(&mut self.stream, output, self.buffer_size)?;

        match self.stream.shutdown(Shutdown::Read) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotConnected => {
                debug!("Peer {} already gone at shutdown", self.info.peer_addr);
            }
            Err(e) => return Err(Error::socket("shutdown")(e)),
        }

        let Self {
            stream, mut info, ..
        } = self;
        drop(stream);
        info.set_closed(received);
        Ok(info)
    }
}
