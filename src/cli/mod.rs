//! CLI module for the protocol retrieval service
//!
//! - `serve`: run the HTTP API
//! - `check-config`: load and validate configuration, then exit

pub mod check_config;
pub mod serve;

use clap::{Parser, Subcommand};

/// Protocol Retrieval - jurisdiction-aware protocol search
#[derive(Parser)]
#[command(name = "protocol-retrieval")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,

    /// Validate configuration and print a summary
    CheckConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["protocol-retrieval", "check-config"]).unwrap();
        assert!(matches!(cli.command, Some(Command::CheckConfig)));

        let cli = Cli::try_parse_from(["protocol-retrieval"]).unwrap();
        assert!(cli.command.is_none());
    }
}
