//! Command-line front end for the cleave segmentation engine.
//!
//! `cleave devices` lists input devices; `cleave monitor` runs a live
//! session against the microphone and writes one WAV file per chunk.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cleave_core::audio::device::list_input_devices;
use cleave_core::{CleaveEngine, MonitorConfig, SinkHandle, WavSink};

#[derive(Parser)]
#[command(name = "cleave", version, about = "Duration + silence audio chunker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List audio input devices.
    Devices {
        /// Emit machine-readable JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Monitor the microphone and cut chunk WAV files.
    Monitor {
        /// Input device name; defaults to the system default input.
        #[arg(long)]
        device: Option<String>,
        /// Seconds to run before stopping (Ctrl-C stops earlier).
        #[arg(long, default_value_t = 22)]
        duration: u64,
        /// Minimum chunk duration in seconds.
        #[arg(long, default_value_t = 10.0)]
        min_chunk_secs: f64,
        /// Loudness at or below which a block counts as silent.
        #[arg(long, default_value_t = 2.0)]
        silence_level: f32,
        /// Seconds of unbroken silence required to arm a cut.
        #[arg(long, default_value_t = 2.0)]
        min_silence_secs: f64,
        /// Directory for chunk WAV files.
        #[arg(long, default_value = "chunks")]
        out_dir: PathBuf,
        /// Print a live level meter bar per processed block.
        #[arg(long)]
        meter: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Devices { json } => devices(json),
        Command::Monitor {
            device,
            duration,
            min_chunk_secs,
            silence_level,
            min_silence_secs,
            out_dir,
            meter,
        } => {
            let config = MonitorConfig {
                min_chunk_duration: Duration::from_secs_f64(min_chunk_secs),
                silence_level_threshold: silence_level,
                min_silence_duration: Duration::from_secs_f64(min_silence_secs),
                ..MonitorConfig::default()
            };
            monitor(config, device, Duration::from_secs(duration), out_dir, meter).await
        }
    }
}

fn devices(json: bool) -> Result<()> {
    let devices = list_input_devices();
    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }
    if devices.is_empty() {
        println!("no input devices found");
        return Ok(());
    }
    for d in devices {
        let marker = if d.is_default { ">" } else { " " };
        println!(
            "{marker} {} ({} ch, {} Hz)",
            d.name, d.input_channels, d.default_sample_rate
        );
    }
    Ok(())
}

async fn monitor(
    config: MonitorConfig,
    device: Option<String>,
    run_for: Duration,
    out_dir: PathBuf,
    meter: bool,
) -> Result<()> {
    let engine = CleaveEngine::new(config, SinkHandle::new(WavSink::new(&out_dir)));

    let mut boundaries = engine.subscribe_boundaries();
    let mut levels = engine.subscribe_levels();

    engine.start_with_device(device)?;
    println!("monitoring — chunks land in {}", out_dir.display());

    tokio::spawn(async move {
        loop {
            match boundaries.recv().await {
                Ok(event) => {
                    println!(
                        "chunk #{} cut at {:.2}s",
                        event.seq,
                        event.timestamp.as_secs_f64()
                    );
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    if meter {
        tokio::spawn(async move {
            loop {
                match levels.recv().await {
                    Ok(event) => {
                        let bar = "|".repeat((event.level as usize).min(60));
                        println!("{:7.2} {bar}", event.level);
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    tokio::select! {
        _ = tokio::time::sleep(run_for) => {
            info!("run duration elapsed");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
        }
    }

    engine.stop()?;
    // Give the session a beat to flush the trailing chunk.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let snap = engine.diagnostics_snapshot();
    println!(
        "done: {} chunk(s) written, {} block(s) processed, {} silent",
        snap.chunks_written, snap.blocks_in, snap.silent_blocks
    );
    Ok(())
}
