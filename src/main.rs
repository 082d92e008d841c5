//! HTTP Traffic Normalizer (v1)
//!
//! Replays captured request and response streams through the connection
//! parser and prints what it reconstructed.
//!
//! # Architecture Overview
//!
//! ```text
//!   request file ──chunks──┐
//!                          ▼
//!                 ┌──────────────────────────────────────────────┐
//!                 │              ConnectionParser                │
//!                 │                                              │
//!                 │  line buffer → line store → tokenizer        │
//!                 │        → header table → transaction          │
//!                 │                                              │
//!                 │  diagnostic log          connection history  │
//!                 └──────────────────────────────────────────────┘
//!                          ▲                       │
//!   response file ─chunks──┘                       ▼
//!                                           JSON report (stdout)
//! ```
//!
//! The two files are fed alternately, `--chunk-size` bytes at a time, to
//! mimic segments arriving on a live connection.

use std::error::Error;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;

use http_normalizer::config::{load_config, NormalizerConfig};
use http_normalizer::connection::{Connection, ConnectionParser, DiagnosticLog, Direction, State};
use http_normalizer::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "http-normalizer")]
#[command(about = "Replay captured HTTP traffic through the normalizer", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Built-in defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one connection and print the reconstructed transactions
    Parse {
        /// Client-to-server bytes
        #[arg(long)]
        request: Option<PathBuf>,

        /// Server-to-client bytes
        #[arg(long)]
        response: Option<PathBuf>,

        /// Bytes fed per call
        #[arg(long, default_value_t = 1460)]
        chunk_size: usize,

        /// Remote (client) endpoint, e.g. 10.0.0.1:40000
        #[arg(long, requires = "local")]
        remote: Option<SocketAddr>,

        /// Local (server) endpoint, e.g. 10.0.0.2:80
        #[arg(long, requires = "remote")]
        local: Option<SocketAddr>,
    },
    /// Load and validate a configuration file
    CheckConfig {
        path: PathBuf,
    },
}

#[derive(Serialize)]
struct FeedFailure {
    direction: Direction,
    error: String,
}

#[derive(Serialize)]
struct Report<'a> {
    request_state: State,
    response_state: State,
    failures: Vec<FeedFailure>,
    connection: &'a Connection,
    log: &'a DiagnosticLog,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => NormalizerConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("http-normalizer v0.1.0 starting");

    match cli.command {
        Commands::Parse {
            request,
            response,
            chunk_size,
            remote,
            local,
        } => {
            let endpoints = remote.zip(local);
            run_parse(
                &config,
                request.as_deref(),
                response.as_deref(),
                chunk_size,
                endpoints,
            )?;
        }
        Commands::CheckConfig { path } => {
            let checked = load_config(&path)?;
            println!("{}", toml::to_string_pretty(&checked)?);
            tracing::info!(path = %path.display(), "Configuration is valid");
        }
    }

    Ok(())
}

fn read_stream(path: Option<&Path>) -> Result<Vec<u8>, Box<dyn Error>> {
    match path {
        Some(path) => Ok(fs::read(path)?),
        None => Ok(Vec::new()),
    }
}

fn run_parse(
    config: &NormalizerConfig,
    request_path: Option<&Path>,
    response_path: Option<&Path>,
    chunk_size: usize,
    endpoints: Option<(SocketAddr, SocketAddr)>,
) -> Result<(), Box<dyn Error>> {
    let metrics_handle = if config.observability.metrics_enabled {
        Some(metrics::init_metrics()?)
    } else {
        None
    };

    let request = read_stream(request_path)?;
    let response = read_stream(response_path)?;

    let mut parser = ConnectionParser::create(&config.parser)?;
    if let Some((remote, local)) = endpoints {
        parser.open(remote.ip(), remote.port(), local.ip(), local.port());
    }

    let chunk_size = chunk_size.max(1);
    let mut request_chunks = request.chunks(chunk_size);
    let mut response_chunks = response.chunks(chunk_size);
    let mut failures = Vec::new();

    loop {
        let next = [
            (Direction::Request, request_chunks.next()),
            (Direction::Response, response_chunks.next()),
        ];
        if next.iter().all(|(_, chunk)| chunk.is_none()) {
            break;
        }

        for (direction, chunk) in next {
            let Some(chunk) = chunk else { continue };
            if parser.side(direction).state() == State::Error {
                continue;
            }
            if let Err(e) = parser.feed(direction, chunk) {
                tracing::warn!(%direction, error = %e, "Stream parsing stopped");
                failures.push(FeedFailure {
                    direction,
                    error: e.to_string(),
                });
            }
        }
    }

    parser.close();

    tracing::info!(
        transactions = parser.connection().transactions.len(),
        log_entries = parser.log().len(),
        "Connection parsed"
    );

    let report = Report {
        request_state: parser.request_state(),
        response_state: parser.response_state(),
        failures,
        connection: parser.connection(),
        log: parser.log(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(handle) = metrics_handle {
        eprintln!("{}", handle.render());
    }

    Ok(())
}
