//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// File name the session is persisted under
pub const SESSION_FILE_NAME: &str = "auth-storage.json";

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "theater-dashboard")]
#[command(about = "Live operating-theater dashboard with smooth timers and session recovery")]
#[command(version)]
pub struct Config {
    /// Base URL of the remote monitoring service
    #[arg(long, default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Room to monitor
    #[arg(short, long)]
    pub room: String,

    /// Room state poll interval in milliseconds
    #[arg(long, default_value = "2000")]
    pub poll_interval_ms: u64,

    /// Display frame interval in milliseconds
    #[arg(long, default_value = "16")]
    pub frame_interval_ms: u64,

    /// Host address of the local dashboard surface
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port of the local dashboard surface
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Where the session is persisted between runs
    #[arg(long)]
    pub session_file: Option<PathBuf>,

    /// Timeout for regular API requests in seconds
    #[arg(long, default_value = "30")]
    pub request_timeout_secs: u64,

    /// Timeout for token refresh requests in seconds
    #[arg(long, default_value = "10")]
    pub refresh_timeout_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the local server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }

    /// Resolve the session file, falling back to the platform data directory
    pub fn session_path(&self) -> Option<PathBuf> {
        self.session_file.clone().or_else(|| {
            dirs::data_dir().map(|dir| dir.join("theater-dashboard").join(SESSION_FILE_NAME))
        })
    }
}
