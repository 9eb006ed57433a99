//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// UNSWtalk - a small social network for UNSW students
#[derive(Parser)]
#[command(name = "unswtalk")]
#[command(version)]
#[command(about = "A small social network for UNSW students", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands; no command means `serve`
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve,

    /// Set a user's password
    ResetPassword {
        /// zID of the account
        z_id: String,

        /// New password (visible in shell history)
        #[arg(long, conflicts_with = "stdin")]
        password: Option<String>,

        /// Read the password from stdin (for scripting)
        #[arg(long)]
        stdin: bool,
    },

    /// Mark an account as verified without the e-mailed link
    VerifyUser {
        /// zID of the account
        z_id: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate an example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite without asking
        #[arg(long)]
        force: bool,
    },
}
