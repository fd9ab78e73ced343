//! Harmonia REST Server
//!
//! HTTP API for the visual calibration flow: calibration image listing,
//! rating submission and visual vector retrieval.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use harmonia::config::ServiceConfig;
use harmonia::server::startup::start_server;

#[derive(Parser)]
#[command(name = "harmonia_server")]
#[command(about = "Harmonia REST API Server")]
#[command(version)]
struct Args {
  /// Server bind address
  #[arg(long, default_value = "127.0.0.1:8000", env = "HARMONIA_BIND")]
  bind: SocketAddr,

  /// Configuration file (defaults to harmonia.json or .harmonia/config.json)
  #[arg(long)]
  config: Option<PathBuf>,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  // ONNX Runtime is chatty at info
  let filter = if args.verbose {
    EnvFilter::new("debug,ort=warn,hyper=info")
  } else {
    EnvFilter::new("harmonia=info,bentley=info,tower_http=info,ort=warn,warn")
  };

  tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
  // bentley lines reach the terminal through the tracing subscriber
  bentley::set_console(false);

  bentley::announce(&format!("Harmonia REST Server v{}", env!("CARGO_PKG_VERSION")));

  let config = ServiceConfig::load(args.config.as_deref())?;
  bentley::info!("Data directory: {}", config.data_dir.display());

  start_server(args.bind, config).await
}
