use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use dexec_peer::bootstrap::init_tracing;
use dexec_peer::{FsPeer, PeerConfig, TcpPeer};
use dexec_primitives::Computation;

#[derive(Parser)]
#[command(name = "dexec-peer")]
#[command(about = "Remote executor peer for d-exec delegation.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    transport: Transport,

    /// Computations to serve (default: all). Repeatable.
    #[arg(long, global = true)]
    allow: Vec<Computation>,

    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Transport {
    /// Serve framed requests over TCP.
    Tcp {
        #[arg(long, default_value = "127.0.0.1:7700")]
        listen: String,
    },
    /// Serve request files in a shared directory.
    Fs {
        #[arg(long)]
        root: PathBuf,

        #[arg(long)]
        poll_ms: Option<u64>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PeerConfig::from_json_file(path)?,
        None => PeerConfig::default(),
    };
    if !cli.allow.is_empty() {
        config.allow = cli.allow.clone();
    }
    info!(allow = ?config.allow, "starting peer");

    match cli.transport {
        Transport::Tcp { listen } => {
            let peer = TcpPeer::bind(listen.as_str(), config)
                .with_context(|| format!("binding {}", listen))?;
            peer.serve()?;
        }
        Transport::Fs { root, poll_ms } => {
            if let Some(ms) = poll_ms {
                config.poll_interval_ms = ms;
            }
            let peer = FsPeer::new(&root, config)
                .with_context(|| format!("serving {}", root.display()))?;
            peer.serve()?;
        }
    }
    Ok(())
}
