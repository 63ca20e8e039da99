//! # HandType
//!
//! Type by moving a hand in front of a camera. An open hand moves the cursor
//! over an on-screen keyboard, a pinch (or a two-finger pose) presses the key
//! under it, and a text service can correct or extend what was typed.
//!
//! Per frame: landmarks -> [`gesture`] classifier -> [`cursor`] filter ->
//! [`layout`] hit test -> [`click`] edge detector -> [`dispatch`] on press.

pub mod click;
pub mod config;
pub mod cursor;
pub mod dispatch;
pub mod error;
pub mod gesture;
pub mod layout;
pub mod llm;
pub mod session;
pub mod types;
pub mod vision;

pub use config::{HandTypeConfig, SourceConfig};
pub use error::HandTypeError;
pub use llm::{HeuristicTextService, TextConnector, TextService};
pub use session::{Session, SessionCommand, SessionHandle};
pub use types::*;
pub use vision::LandmarkSource;

use crossbeam_channel::Sender;
use std::time::Duration;
use vision::{SimulatedHandSource, UdpLandmarkSource};

/// Phrase typed by the simulated hand
pub const DEMO_PHRASE: &str = "hello world";

/// Wires a landmark source to a session.
pub struct HandType {
    session: Session,
    source: Box<dyn LandmarkSource>,
}

impl HandType {
    /// Build from configuration with the built-in heuristic text service.
    pub fn new(config: HandTypeConfig) -> Result<Self, HandTypeError> {
        let text = TextConnector::heuristic(Duration::from_millis(config.text_timeout_ms));
        Self::with_text_service(config, text)
    }

    pub fn with_text_service(
        config: HandTypeConfig,
        text: TextConnector,
    ) -> Result<Self, HandTypeError> {
        log::info!("Initializing HandType...");
        config.validate()?;

        let source: Box<dyn LandmarkSource> = match &config.source {
            SourceConfig::Simulated => Box::new(SimulatedHandSource::new(
                DEMO_PHRASE,
                config.screen,
                Duration::from_millis(config.frame_interval_ms()),
            )),
            SourceConfig::Udp { addr } => {
                log::info!("UDP landmark input on {addr}");
                Box::new(UdpLandmarkSource::new(*addr))
            }
        };

        let session = Session::new(config, text);
        log::info!("HandType initialization complete");
        Ok(Self { session, source })
    }

    pub fn with_source(config: HandTypeConfig, source: Box<dyn LandmarkSource>) -> Self {
        let text = TextConnector::heuristic(Duration::from_millis(config.text_timeout_ms));
        Self { session: Session::new(config, text), source }
    }

    /// Handle for sending UI commands while [`run`](Self::run) is active
    pub fn handle(&self) -> SessionHandle {
        self.session.handle()
    }

    pub fn connect_output(&mut self, tx: Sender<FrameSnapshot>) {
        self.session.connect_output(tx);
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run until the source ends or a shutdown command arrives.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.session.run(self.source.as_mut()).await
    }
}
