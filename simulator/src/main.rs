use anyhow::Context;
use clap::Parser;
use generator::ChunkEncoding;
use gui_bridge::bridge::{gui_bind_address, GuiBridge};
use loracore::transport::MemoryTransport;
use loracore::{RadarPipeline, RadarSession};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use tokio::sync::oneshot;
use workflow::config::WorkflowConfig;
use workflow::runner::{Runner, WorkflowResult};

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Synthetic sensor driver for the LoRa radar core")]
struct Args {
    /// Run the scenario once on a simulated clock and emit a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Feed a captured serial text file instead of the generated scenario
    #[arg(long)]
    replay: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value_t = 6)]
    passes: usize,
    #[arg(long, value_enum, default_value_t = ChunkEncoding::Mixed)]
    encoding: ChunkEncoding,
    #[arg(long, default_value_t = 24)]
    max_chunk_bytes: usize,
    /// Where offline summaries are appended
    #[arg(long, default_value = "tools/data/offline_detection.log")]
    report: PathBuf,
    /// Stream the scenario through a live session and host the display bridge
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long)]
    bind: Option<SocketAddr>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.seed, args.passes, args.encoding, args.max_chunk_bytes)
    };
    let runner = Runner::new(workflow_config);

    if args.offline || args.replay.is_some() {
        let result = match &args.replay {
            Some(path) => {
                let capture = fs::read_to_string(path)
                    .with_context(|| format!("reading capture {}", path.display()))?;
                runner.execute(&runner.encode(&capture))?
            }
            None => runner.execute_scenario()?,
        };
        summarize(&result);
        append_report(&args.report, &result)?;
    }

    if args.serve {
        let runtime = TokioBuilder::new_multi_thread()
            .enable_all()
            .build()
            .context("creating runtime for the live session")?;
        runtime.block_on(serve(runner, args.bind.unwrap_or_else(gui_bind_address)))?;
    }

    Ok(())
}

fn summarize(result: &WorkflowResult) {
    println!(
        "Offline run -> chunks {}, samples {}, detections {}, live targets {}, parse errors {}, decode irregularities {}",
        result.chunks,
        result.metrics.samples,
        result.detections.len(),
        result.snapshot.targets.len(),
        result.metrics.frame_parse_errors,
        result.metrics.decode_irregularities,
    );
    for target in &result.detections {
        println!(
            "  {}: {:.0}° at {:.0}",
            target.id, target.angle, target.distance
        );
    }
}

fn append_report(path: &Path, result: &WorkflowResult) -> anyhow::Result<()> {
    let report = format!(
        "chunks={} samples={} detections={} live_targets={} metrics={}\n",
        result.chunks,
        result.metrics.samples,
        result.detections.len(),
        result.snapshot.targets.len(),
        serde_json::to_string(&result.metrics)?,
    );
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening report {}", path.display()))?;
    file.write_all(report.as_bytes())?;
    Ok(())
}

async fn serve(runner: Runner, address: SocketAddr) -> anyhow::Result<()> {
    let config = runner.config().clone();
    let transport = MemoryTransport::new();
    let mut session = RadarSession::new(RadarPipeline::new(config.pipeline.clone()));
    session.connect(Arc::new(transport.clone()));
    let session = Arc::new(Mutex::new(session));

    let bridge = GuiBridge::new(session.clone(), transport.clone(), config.pipeline.clone());
    bridge.publish_status("live session running (Ctrl+C to stop)...");

    // Replays the scenario at its frame cadence, looping until shutdown.
    let feeder_transport = transport.clone();
    let bursts = runner.scenario_bursts();
    let frame_interval = Duration::from_millis(config.scenario.frame_interval_ms.max(1));
    let feeder = tokio::spawn(async move {
        loop {
            for burst in &bursts {
                for chunk in burst {
                    feeder_transport.deliver(chunk.clone());
                }
                tokio::time::sleep(frame_interval).await;
            }
        }
    });

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(bridge.serve(address, async move {
        let _ = stop_rx.await;
    }));

    signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
    feeder.abort();
    let _ = stop_tx.send(());
    server.await.context("joining display bridge")??;

    let mut guard = session.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    guard.disconnect();
    Ok(())
}
