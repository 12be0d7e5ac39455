//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use glyphdeck_config::Config;

/// Terminal dashboard with glyph rain, rolling stat counters and scrambled headlines.
#[derive(Debug, Parser)]
#[command(name = "glyphdeck", version, about)]
pub struct Cli {
    /// Config file to read instead of the default location.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Stats endpoint base URL; `/api/v1/stats` is appended.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Seed for every random choice, for reproducible animation.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Write logs here instead of the default data directory.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Do not poll the stats endpoint.
    #[arg(long)]
    pub offline: bool,
}

impl Cli {
    /// Override config values given on the command line.
    pub fn apply(&self, config: &mut Config) {
        if let Some(endpoint) = &self.endpoint {
            config.stats.endpoint = endpoint.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
    }
}
