#![allow(clippy::collapsible_if)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod models;
pub mod sink;
pub mod utils;

// Re-export commonly used types outside of crate
pub use analysis::{Classifier, classify};
pub use config::{EndpointSettings, Lexicon};
pub use data::WsConnector;
pub use domain::{Alert, Category, IncomingAlert};
pub use engine::{AlertEngine, Aggregator, ChannelKind, ChannelState, CombinedStatus, EngineCommand};
pub use error::EngineError;
pub use sink::{ConsoleSink, PresentationSink};

// CLI argument parsing
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Backend host (and port) serving both stream endpoints
    #[arg(long, default_value_t = config::STREAM.endpoints.default_host.to_string())]
    pub host: String,

    /// Path of the alert event stream
    #[arg(long, default_value_t = config::STREAM.endpoints.alert_path.to_string())]
    pub alert_path: String,

    /// Path of the video frame stream
    #[arg(long, default_value_t = config::STREAM.endpoints.video_path.to_string())]
    pub video_path: String,

    /// Use wss:// instead of ws://
    #[arg(long, default_value_t = false)]
    pub secure: bool,

    /// JSON keyword lexicon replacing the built-in classification table
    #[arg(long)]
    pub lexicon: Option<PathBuf>,

    /// Wait for an explicit `connect` instead of connecting at start-up
    #[arg(long, default_value_t = false)]
    pub manual: bool,
}

impl Cli {
    pub fn endpoints(&self) -> EndpointSettings {
        EndpointSettings {
            host: self.host.clone(),
            alert_path: self.alert_path.clone(),
            video_path: self.video_path.clone(),
            secure: self.secure,
        }
    }

    /// Commands queued before the operator types anything.
    pub fn startup_commands(&self) -> Vec<EngineCommand> {
        if self.manual {
            Vec::new()
        } else {
            vec![EngineCommand::Connect]
        }
    }

    pub fn load_lexicon(&self) -> anyhow::Result<Lexicon> {
        match &self.lexicon {
            Some(path) => Lexicon::load(path),
            None => Ok(Lexicon::default()),
        }
    }
}

/// Operator input line -> engine command. `None` for anything unrecognised.
pub fn parse_command(line: &str) -> Option<EngineCommand> {
    let mut parts = line.split_whitespace();
    let command = match parts.next()? {
        "c" | "connect" => EngineCommand::Connect,
        "d" | "disconnect" => EngineCommand::Disconnect,
        "r" | "reconnect" => EngineCommand::Reconnect,
        "s" | "show" => EngineCommand::ShowDetail(parts.next()?.parse().ok()?),
        "q" | "quit" => EngineCommand::Shutdown,
        _ => return None,
    };
    Some(command)
}
