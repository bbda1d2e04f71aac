//! Configuration and CLI argument handling

use std::path::PathBuf;
use clap::Parser;

use crate::state::TimerSettings;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "workout-timer")]
#[command(about = "Workout clock and rest timer daemon")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory for persisted timer state
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Default rest between sets in seconds
    #[arg(short, long, default_value = "90")]
    pub rest: u32,

    /// Seconds added by the notification's Add Time action
    #[arg(long, default_value = "30")]
    pub add_time: u32,

    /// Label shown on the overlay
    #[arg(long, default_value = "Workout")]
    pub workout_label: String,

    /// Overlay status file (defaults to <data-dir>/overlay.json)
    #[arg(long)]
    pub overlay_file: Option<PathBuf>,

    /// Do not send desktop notifications
    #[arg(long)]
    pub no_notifications: bool,

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

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join("workout-timer"))
                .unwrap_or_else(|| PathBuf::from(".workout-timer"))
        })
    }

    pub fn state_dir(&self) -> PathBuf {
        self.data_dir().join("state")
    }

    pub fn overlay_file(&self) -> PathBuf {
        self.overlay_file
            .clone()
            .unwrap_or_else(|| self.data_dir().join("overlay.json"))
    }

    pub fn timer_settings(&self) -> TimerSettings {
        TimerSettings {
            add_time_seconds: self.add_time,
            default_rest_seconds: self.rest,
            workout_label: self.workout_label.clone(),
            ..TimerSettings::default()
        }
    }
}
