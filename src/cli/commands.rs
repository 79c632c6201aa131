use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Page URL used when none is given; the adventure id is read from it.
pub const DEFAULT_URL: &str = "https://play.example/adventure/local";

/// `bdbridge` - in-band script message bridge and widget engine.
#[derive(Parser, Debug)]
#[command(name = "bdbridge")]
#[command(version = "0.1.0")]
#[command(about = "Run story text through the script message bridge.", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.bdbridge/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Feed a transcript into a simulated page and print what the user would see
    Replay {
        /// Transcript file; each non-empty line is one output chunk
        file: PathBuf,

        /// Simulated milliseconds between chunks
        #[arg(long, default_value = "100")]
        chunk_ms: u64,

        /// Page URL
        #[arg(long, default_value = DEFAULT_URL)]
        url: String,

        /// Keep protocol text visible for this run (not persisted)
        #[arg(long)]
        debug: bool,

        /// Print events as JSON lines
        #[arg(long)]
        events: bool,
    },

    /// Read story chunks from stdin in real time and print events as JSON lines
    Watch {
        /// Pump interval in milliseconds
        #[arg(long, default_value = "50")]
        tick_ms: u64,

        /// Page URL
        #[arg(long, default_value = DEFAULT_URL)]
        url: String,
    },

    /// Sanitize untrusted HTML from a file or stdin
    Sanitize {
        file: Option<PathBuf>,
    },

    /// Print the parse outcome of every protocol span in a file or stdin
    Scan {
        file: Option<PathBuf>,
    },

    /// Show or set the persisted debug mode
    Debug {
        /// `true` or `false`; omit to show the current value
        enable: Option<bool>,
    },

    /// Show configuration and settings locations
    Status,
}
