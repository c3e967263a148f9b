//! Session driver: picks the mode and runs it to completion.

use std::io::{Read, Write};

use tracing::{debug, info};

use crate::config::{Mode, SessionConfig};
use crate::endpoint::{self, Listener};
use crate::error::Result;
use crate::relay::{Receiver, Sender};
use crate::stats::SessionStats;

/// One run of the tool, driven by an immutable [`SessionConfig`].
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
}

impl Session {
    /// Validate the configuration and wrap it.
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this session runs with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run the session.
    ///
    /// `input` is `None` when there is nothing to send automatically (an
    /// interactive terminal); the sender then connects and closes. `output`
    /// receives everything drained in listening mode.
    pub fn run<R, W>(&self, input: Option<&mut R>, output: &mut W) -> Result<SessionStats>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        match self.config.mode {
            Mode::Send => self.send(input),
            Mode::Listen => {
                let listener = self.bind()?;
                self.serve(&listener, output)
            }
        }
    }

    /// Connect, relay `input`, half-close, close.
    pub fn send<R: Read + ?Sized>(&self, input: Option<&mut R>) -> Result<SessionStats> {
        let addr = endpoint::resolve(&self.config.address, self.config.port)?;
        let sender = Sender::connect(addr, &self.config.transfer)?;

        let info = match input {
            Some(input) => sender.relay(input)?,
            None => {
                debug!("Input is a terminal, nothing to send");
                sender.finish()
            }
        };

        let mut stats = SessionStats::new();
        stats.record(&info);
        info!(
            "Session finished: {} connection(s), {} bytes sent in {}s",
            stats.connections,
            stats.bytes_sent,
            stats.uptime_secs()
        );
        Ok(stats)
    }

    /// Create the listening endpoint described by the configuration.
    pub fn bind(&self) -> Result<Listener> {
        let addr = endpoint::resolve(&self.config.address, self.config.port)?;
        Listener::bind(addr, self.config.transfer.backlog)
    }

    /// Accept and drain peers one at a time on `listener`.
    ///
    /// Without repeat this returns after the first peer; with repeat it only
    /// returns on error.
    pub fn serve<W>(&self, listener: &Listener, output: &mut W) -> Result<SessionStats>
    where
        W: Write + ?Sized,
    {
        let mut stats = SessionStats::new();

        loop {
            let receiver = Receiver::accept_one(listener, &self.config.transfer)?;
            let info = receiver.drain(output)?;
            stats.record(&info);

            if !self.config.repeat {
                break;
            }
            debug!("Waiting for next connection on {}", listener.local_addr());
        }

        info!(
            "Session finished: {} connection(s), {} bytes received in {}s",
            stats.connections,
            stats.bytes_received,
            stats.uptime_secs()
        );
        Ok(stats)
    }
}
