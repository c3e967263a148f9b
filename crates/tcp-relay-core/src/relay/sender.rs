//! Sending side: local input to a connected peer.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddrV4, TcpStream};

use tracing::{debug, info, trace};

use crate::config::TransferConfig;
use crate::connection::{ConnectionInfo, Direction};
use crate::endpoint;
use crate::error::{Error, Result};

/// Consecutive zero-length writes tolerated before giving up.
const MAX_ZERO_WRITES: usize = 64;

/// Write all of `chunk`, resuming after every partial write.
pub fn send_chunk<W: Write + ?Sized>(writer: &mut W, chunk: &[u8]) -> Result<()> {
    let mut remaining = chunk.len();
    let mut cursor = 0;
    let mut zero_writes = 0;

    while remaining > 0 {
        match writer.write(&chunk[cursor..]) {
            Ok(0) => {
                zero_writes += 1;
                if zero_writes > MAX_ZERO_WRITES {
                    return Err(Error::transfer("send")(ErrorKind::WriteZero.into()));
                }
            }
            Ok(n) => {
                zero_writes = 0;
                cursor += n;
                remaining -= n;
                if remaining > 0 {
                    trace!("Partial write: {} sent, {} left", n, remaining);
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::transfer("send")(e)),
        }
    }

    Ok(())
}

/// Copy `input` to `writer` chunk by chunk until input is exhausted.
///
/// Returns the number of bytes sent. Bytes go out in exactly the order they
/// were read; nothing is transformed.
pub fn relay<R, W>(input: &mut R, writer: &mut W, buffer_size: usize) -> Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; buffer_size];
    let mut total: u64 = 0;

    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::transfer("read")(e)),
        };

        send_chunk(writer, &buf[..n])?;
        total += n as u64;
        debug!("Sent chunk of {} bytes ({} total)", n, total);

        buf[..n].fill(0);
    }

    Ok(total)
}

/// A connected outbound relay.
#[derive(Debug)]
pub struct Sender {
    stream: TcpStream,
    info: ConnectionInfo,
    buffer_size: usize,
}

impl Sender {
    /// Connect to `addr` and prepare to relay.
    pub fn connect(addr: SocketAddrV4, transfer: &TransferConfig) -> Result<Self> {
        let stream = endpoint::connect(addr, transfer.timeout)?;
        endpoint::apply_timeout(&stream, transfer.timeout)?;
        info!("Connected to {}", addr);

        Ok(Self {
            stream,
            info: ConnectionInfo::new(addr.into(), Direction::Outbound),
            buffer_size: transfer.buffer_size,
        })
    }

    /// Stream all of `input` to the peer, then half-close the write side.
    ///
    /// The connection is released when this returns.
    pub fn relay<R: Read + ?Sized>(mut self, input: &mut R) -> Result<ConnectionInfo> {
        let sent = relay(input, &mut self.stream, self.buffer_size)?;

        self.stream
            .shutdown(Shutdown::Write)
            .map_err(Error::socket("shutdown"))?;
        debug!("Write side of {} shut down after {} bytes", self.info.peer_addr, sent);

        Ok(self.close(sent))
    }

    /// Release the connection without sending anything.
    pub fn finish(self) -> ConnectionInfo {
        self.close(0)
    }

    fn close(self, bytes: u64) -> ConnectionInfo {
        let Self {
            stream, mut info, ..
        } = self;
        drop(stream);
        info.set_closed(bytes);
        info
    }
}
