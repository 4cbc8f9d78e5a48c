use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "read-for-me", about = "Read For Me - Chinese text to pinyin, word gloss and speech")]
pub struct CliArgs {
    /// Settings file to use instead of the platform default
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// `.env` file with GMI_API_KEY / READFORME_MODEL / PORT overrides
    #[arg(long, global = true, default_value = ".env")]
    pub env_file: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the service proxy and static file server
    Serve,

    /// Convert text and print pinyin, words and audio status
    Convert {
        text: String,

        /// Save the audio to this file when available
        #[arg(long)]
        audio: Option<PathBuf>,

        /// Also create a share link for the result
        #[arg(long)]
        share: bool,
    },

    /// Save a share built from text already in the cache
    ShareSave { text: String },

    /// Load and print a share by identifier
    ShareLoad { id: String },

    /// Manage your own API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Show (or reset) the service usage budget
    Usage {
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum KeyAction {
    /// Store a key; requests then bypass the service budget
    Set { key: String },
    /// Forget the stored key
    Clear,
}
