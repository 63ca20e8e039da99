//! HandType - gesture typing
//!
//! Main entry point. This application:
//! - Receives hand landmarks (UDP tracker or simulated hand)
//! - Drives the cursor and the on-screen keyboard from hand gestures
//! - Corrects / completes the typed text on request
//! - Logs the typed text as it changes

use anyhow::Result;
use clap::Parser;
use handtype::{FrameSnapshot, HandType, HandTypeConfig, SessionCommand, SourceConfig};
use log::LevelFilter;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "handtype")]
#[command(about = "HandType - type with hand gestures in front of a camera", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Receive landmarks over UDP on this address instead of simulating a hand
    #[arg(long, value_name = "ADDR")]
    udp: Option<SocketAddr>,

    /// Cursor smoothing factor (0, 1]
    #[arg(long)]
    smoothing: Option<f32>,

    /// Pinch distance threshold (normalized units)
    #[arg(long)]
    pinch_threshold: Option<f32>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info })
        .parse_default_env()
        .init();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => HandTypeConfig::load(path)?,
        None => HandTypeConfig::default(),
    };

    // Override with CLI options
    if let Some(addr) = cli.udp.or_else(handtype::vision::udp_landmark_addr_from_env) {
        config.source = SourceConfig::Udp { addr };
    }
    if let Some(smoothing) = cli.smoothing {
        config.cursor_smoothing = smoothing;
    }
    if let Some(threshold) = cli.pinch_threshold {
        config.gesture.pinch_threshold = threshold;
    }

    log::info!("═══════════════════════════════════════");
    log::info!("  HandType - gesture typing");
    log::info!("═══════════════════════════════════════");

    let mut app = match HandType::new(config) {
        Ok(app) => app,
        Err(e) => {
            log::error!("Failed to initialize HandType: {}", e);
            return Err(e.into());
        }
    };

    // Stand-in for the UI: report text changes and state transitions.
    let (out_tx, out_rx) = crossbeam_channel::unbounded::<FrameSnapshot>();
    app.connect_output(out_tx);
    let reporter = std::thread::spawn(move || {
        let mut last_text = String::new();
        let mut last_status = None;
        for snap in out_rx.iter() {
            if snap.text != last_text {
                log::info!("Text: {:?}", snap.text);
                last_text = snap.text.clone();
            }
            if last_status.as_ref() != Some(&snap.status) {
                log::info!("Status: {:?}", snap.status);
                last_status = Some(snap.status.clone());
            }
        }
    });

    // Set up Ctrl+C handler
    let handle = app.handle();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal...");
        handle.send(SessionCommand::Shutdown);
    })?;

    log::info!("Open hand to move, pinch to press. Press Ctrl+C to exit");
    log::info!("───────────────────────────────────────");

    let result = app.run().await;
    drop(app);
    let _ = reporter.join();

    match result {
        Ok(()) => {
            log::info!("HandType shutdown complete.");
            Ok(())
        }
        Err(e) => {
            log::error!("HandType error: {}", e);
            Err(e)
        }
    }
}
