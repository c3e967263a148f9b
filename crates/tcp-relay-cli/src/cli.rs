//! Command line parsing.
//!
//! Turns argv into a [`SessionConfig`]; nothing here touches a socket.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use tcp_relay_core::{Error, FileConfig, Result, SessionConfig};

pub const USAGE: &str = "\
Usage:\t tcp-relay [-l (listen mode)] [[ip] [port] (sending mode)]
\tOptions:
\t\t-l: \tSet to listen mode
\t\t-p: \tSet port (listen mode, default 3000)
\t\t-i: \tSet ip (listen mode, default 0.0.0.0)
\t\t-r: \tLooped listen mode
\t\t-w: \tConnect/read/write timeout in seconds
\t\t-c: \tTOML configuration file
\t\t-v: \tMore logging on stderr (repeatable)
\t\t-h: \tShow this message
\tRedirection: tcp-relay [-l > out] [0.0.0.0 3100 < in]
";

/// Raw command line flags.
#[derive(Parser, Debug, Default)]
#[command(name = "tcp-relay", disable_help_flag = true)]
pub struct Args {
    /// Listen mode
    #[arg(short = 'l')]
    pub listen: bool,

    /// Accept again after each drained connection
    #[arg(short = 'r')]
    pub repeat: bool,

    /// Bind address
    #[arg(short = 'i', value_name = "ADDRESS")]
    pub address: Option<String>,

    /// Bind port
    #[arg(short = 'p', value_name = "PORT")]
    pub port: Option<u16>,

    /// Timeout in seconds
    #[arg(short = 'w', value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Configuration file
    #[arg(short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbosity
    #[arg(short = 'v', action = ArgAction::Count)]
    pub verbose: u8,

    /// Print usage
    #[arg(short = 'h')]
    pub help: bool,

    /// `<address> <port>` in sending mode
    pub positional: Vec<String>,
}

/// What the process was asked to do.
#[derive(Debug)]
pub enum Command {
    /// Print usage and exit 1.
    Help,
    /// Run a session.
    Run(Args),
}

/// Parse argv (including the program name).
pub fn parse<I, T>(argv: I) -> Result<Command>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
    if argv.len() <= 1 {
        return Ok(Command::Help);
    }

    let args = Args::try_parse_from(argv).map_err(|e| {
        let rendered = e.to_string();
        let first = rendered.lines().next().unwrap_or_default();
        Error::Usage(first.trim_start_matches("error: ").to_string())
    })?;

    if args.help {
        return Ok(Command::Help);
    }
    Ok(Command::Run(args))
}

/// Merge flags over the file configuration.
pub fn session_config(args: &Args, file: &FileConfig) -> Result<SessionConfig> {
    let mut transfer = file.transfer_config();
    if let Some(secs) = args.timeout {
        transfer.timeout = Some(Duration::from_secs(secs));
    }

    let mut config = if args.listen {
        if !args.positional.is_empty() {
            return Err(Error::Usage(format!(
                "unexpected argument '{}' in listen mode",
                args.positional[0]
            )));
        }

        let mut config = SessionConfig::listen();
        config.address = args
            .address
            .clone()
            .unwrap_or_else(|| file.listen.address.clone());
        config.port = args.port.unwrap_or(file.listen.port);
        config.repeat = args.repeat;
        config
    } else {
        if args.repeat || args.address.is_some() || args.port.is_some() {
            return Err(Error::Usage("-r, -i and -p require listen mode (-l)".into()));
        }

        let (address, port) = match args.positional.as_slice() {
            [address, port] => (address, port),
            [] | [_] => return Err(Error::Usage("missing address or port".into())),
            [_, _, extra, ..] => {
                return Err(Error::Usage(format!("unexpected argument '{}'", extra)))
            }
        };
        let port: u16 = port
            .parse()
            .map_err(|_| Error::Usage(format!("invalid port '{}'", port)))?;

        SessionConfig::send(address.clone(), port)
    };

    config.transfer = transfer;
    Ok(config)
}
