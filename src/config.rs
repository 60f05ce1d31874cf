//! Configuration and CLI argument handling

use std::time::Duration;
use clap::Parser;

/// CLI argument parsing structure
#[derive(Debug, Clone, Parser)]
#[command(name = "stopwatch-sync")]
#[command(about = "A stopwatch shared between a phone endpoint and a paired watch endpoint")]
#[command(version)]
pub struct Config {
    /// Port to bind the control server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Elapsed time recomputation interval in milliseconds
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// Interval between context re-broadcasts to the watch while running, in milliseconds
    #[arg(long, default_value = "1000")]
    pub broadcast_ms: u64,

    /// Delay before the demo notification is delivered, in seconds
    #[arg(long, default_value = "5")]
    pub notification_delay: u64,

    /// Start with the phone/watch session not activated
    #[arg(long)]
    pub offline: bool,

    /// Deny notification authorization when requested
    #[arg(long)]
    pub deny_notifications: bool,

    /// Refuse live activity requests
    #[arg(long)]
    pub disable_live_activity: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_ms)
    }

    pub fn notification_delay(&self) -> Duration {
        Duration::from_secs(self.notification_delay)
    }
}
