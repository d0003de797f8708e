//! Command-line interface for murmur.

pub mod commands;

use clap::{Parser, Subcommand};

/// Murmur - a minimal social posting service
#[derive(Parser)]
#[command(name = "murmur")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default when no subcommand is given)
    Serve,

    /// Create a superuser account
    CreateSuperuser {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        /// Read from MURMUR_SUPERUSER_PASSWORD when omitted
        #[arg(long)]
        password: Option<String>,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,
    },
}
