pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "redirect-mapper")]
#[command(about = "Build redirect maps for a shop domain migration")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "redirect-config.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Show what would be processed without fetching or writing anything
    #[arg(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Reconcile the live sitemap with the handle workbook, per target shop
    Sitemap {
        /// Only run the shop with this new domain
        #[arg(long)]
        shop: Option<String>,
    },
    /// Format a pre-matched URL workbook for the redirect importer
    Matched,
}
