//! # TCP-Relay
//!
//! Main entry point for the tcp-relay binary.

mod cli;

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use tcp_relay_core::error::{EXIT_FATAL, EXIT_USAGE};
use tcp_relay_core::{Error, FileConfig, LoggingConfig, Mode, Session};
use tracing::{debug, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use crate::cli::Command;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            let typed = err.downcast_ref::<Error>();
            eprintln!("tcp-relay: {:#}", err);
            if let Some(Error::Usage(_)) = typed {
                eprint!("{}", cli::USAGE);
            }
            ExitCode::from(typed.map_or(EXIT_FATAL, Error::exit_code))
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = match cli::parse(std::env::args_os())? {
        Command::Help => {
            eprint!("{}", cli::USAGE);
            return Ok(ExitCode::from(EXIT_USAGE));
        }
        Command::Run(args) => args,
    };

    // Load configuration
    let file = load_config(args.config.as_deref())?;

    // Initialize logging
    init_logging(&file.logging, args.verbose)?;

    let config = cli::session_config(&args, &file)?;
    info!(
        "Starting tcp-relay v{} in {:?} mode ({}:{})",
        env!("CARGO_PKG_VERSION"),
        config.mode,
        config.address,
        config.port
    );

    let session = Session::new(config)?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let input = if session.config().mode == Mode::Send && stdin.is_terminal() {
        None
    } else {
        Some(&mut input)
    };

    let stdout = io::stdout();
    let mut output = stdout.lock();

    let stats = session.run(input, &mut output)?;
    debug!(
        "Done: {} connection(s), {} bytes sent, {} bytes received",
        stats.connections, stats.bytes_sent, stats.bytes_received
    );

    Ok(ExitCode::SUCCESS)
}

/// Load the configuration file if one was given, defaults otherwise.
fn load_config(path: Option<&Path>) -> Result<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = FileConfig::from_toml(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

/// Initialize logging on stderr, or in the configured file.
///
/// `RUST_LOG` takes precedence over both the file level and `-v`.
fn init_logging(logging: &LoggingConfig, verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => logging.level.as_str(),
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match &logging.file {
        Some(file) => {
            let path = PathBuf::from(file);
            let name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", file))?;
            let dir = match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
                _ => PathBuf::from("."),
            };

            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(name.to_string_lossy())
                .build(&dir)
                .with_context(|| format!("Failed to open log file: {}", file))?;

            builder.with_writer(appender).with_ansi(false).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }

    Ok(())
}
