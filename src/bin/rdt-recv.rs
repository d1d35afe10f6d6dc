//! RDT file receiver.
//!
//! # Usage
//!
//! ```bash
//! # Receive one file
//! rdt-recv --output received.bmp --bind 0.0.0.0:9000
//!
//! # Corrupt half of the incoming data frames
//! rdt-recv --output received.bmp --scenario 3 --loss 0.5
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::Parser;
use rdt_protocol::config::{LossProbability, ReceiverConfig, Scenario, SimulatorConfig};
use rdt_protocol::transport::{ChannelSimulator, RdtSocket};
use rdt_protocol::{RdtError, RdtReceiver, recv_stream};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Alternating-bit reliable file receiver
#[derive(Parser, Debug)]
#[command(name = "rdt-recv")]
#[command(about = "Receive a file with RDT 2.2 over UDP")]
#[command(version)]
struct Args {
    /// Where to write the received file
    #[arg(short, long)]
    output: PathBuf,

    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:9000")]
    bind: SocketAddr,

    /// Fault scenario (1-5 or name, e.g. rx-data-loss)
    #[arg(short, long, default_value = "no-loss")]
    scenario: Scenario,

    /// Fault probability, as a 0-1 fraction or a 0-100 percentage
    #[arg(short, long, default_value = "0")]
    loss: LossProbability,

    /// Seed for the fault simulator
    #[arg(long)]
    seed: Option<u64>,

    /// Keep answering retransmissions this long after the last unit
    #[arg(long, default_value = "1000")]
    linger_ms: u64,

    /// Append `iteration,loss_percent,unix_millis` here on completion
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

    let mut simulator = SimulatorConfig::new(args.scenario, args.loss);
    if let Some(seed) = args.seed {
        simulator = simulator.with_seed(seed);
    }
    tracing::info!("Scenario {} at {}% loss", args.scenario, args.loss.percent());

    let socket = RdtSocket::bind(args.bind).await?;
    tracing::info!("Listening on {}", socket.local_addr()?);

    let config = ReceiverConfig::default().with_linger(Duration::from_millis(args.linger_ms));
    let mut receiver = RdtReceiver::new(ChannelSimulator::new(socket, simulator), config);

    let data = recv_stream(&mut receiver).await?;
    if let Some(path) = &args.results_file {
        append_result(path, args.iteration, args.loss)?;
    }

    std::fs::write(&args.output, &data)?;
    tracing::info!("Saved {} bytes to {}", data.len(), args.output.display());

    let answered = receiver.linger().await?;
    let stats = receiver.transport().stats();
    tracing::info!(
        "Done: {} duplicate frames answered after the last unit, {} faults injected",
        answered,
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
