//! RDT file sender.
//!
//! # Usage
//!
//! ```bash
//! # Send a file over a clean channel
//! rdt-send --input image.bmp --peer 127.0.0.1:9000
//!
//! # Corrupt 20% of incoming ACKs, reproducibly
//! rdt-send --input image.bmp --peer 127.0.0.1:9000 --scenario tx-ack-loss --loss 20 --seed 7
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::Parser;
use rdt_protocol::config::{LossProbability, Scenario, SenderConfig, SimulatorConfig};
use rdt_protocol::transport::{ChannelSimulator, RdtSocket};
use rdt_protocol::{RdtError, RdtSender, send_stream};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Alternating-bit reliable file sender
#[derive(Parser, Debug)]
#[command(name = "rdt-send")]
#[command(about = "Send a file with RDT 2.2 over UDP")]
#[command(version)]
struct Args {
    /// File to send
    #[arg(short, long)]
    input: PathBuf,

    /// Receiver address
    #[arg(short, long, default_value = "127.0.0.1:9000")]
    peer: SocketAddr,

    /// Local address to bind to
    #[arg(short, long, default_value = "0.0.0.0:0")]
    bind: SocketAddr,

    /// Fault scenario (1-5 or name, e.g. tx-ack-loss)
    #[arg(short, long, default_value = "no-loss")]
    scenario: Scenario,

    /// Fault probability, as a 0-1 fraction or a 0-100 percentage
    #[arg(short, long, default_value = "0")]
    loss: LossProbability,

    /// ACK timeout in milliseconds
    #[arg(long, default_value = "500")]
    timeout_ms: u64,

    /// Give up on a unit after this many retransmissions
    #[arg(long)]
    max_retransmits: Option<u32>,

    /// Seed for the fault simulator
    #[arg(long)]
    seed: Option<u64>,

    /// Append `iteration,loss_percent,unix_millis` here at start
    #[arg(long)]
    results_file: Option<PathBuf>,

    /// Iteration number written to the results file
    #[arg(long, default_value = "0")]
    iteration: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), RdtError> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let data = std::fs::read(&args.input)?;
    tracing::info!("Read {} bytes from {}", data.len(), args.input.display());

    let mut config = SenderConfig::builder().timeout(Duration::from_millis(args.timeout_ms));
    if let Some(limit) = args.max_retransmits {
        config = config.max_retransmits(limit);
    }
    let config = config.build()?;

    let mut simulator = SimulatorConfig::new(args.scenario, args.loss);
    if let Some(seed) = args.seed {
        simulator = simulator.with_seed(seed);
    }
    tracing::info!("Scenario {} at {}% loss", args.scenario, args.loss.percent());

    let socket = RdtSocket::bind(args.bind).await?;
    tracing::info!("Bound to {}, sending to {}", socket.local_addr()?, args.peer);

    if let Some(path) = &args.results_file {
        append_result(path, args.iteration, args.loss)?;
    }

    let mut sender = RdtSender::new(ChannelSimulator::new(socket, simulator), args.peer, config);
    let report = send_stream(&mut sender, &data).await?;

    let stats = sender.transport().stats();
    tracing::info!(
        "Sent {} units in {:?} ({} retransmissions, {} faults injected)",
        report.units,
        report.elapsed,
        report.retransmissions,
        stats.faults()
    );

    Ok(())
}

/// Append one timing record in the format the plotting scripts read.
fn append_result(path: &Path, iteration: u32, loss: LossProbability) -> std::io::Result<()> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{},{},{}", iteration, loss.percent(), millis)
}
