//! CLI module for Poke.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Poke - a personal assistant that looks you up before it talks to you
///
/// Runs the HTTP message service or an interactive chat in the terminal.
#[derive(Parser, Debug)]
#[command(name = "poke")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server and the message processor
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Start an interactive chat session
    Chat {
        /// Your name (skips the name prompt)
        #[arg(short, long)]
        name: Option<String>,

        /// Skip linking an external account
        #[arg(long)]
        no_link: bool,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_flags() {
        let cli = Cli::try_parse_from(["poke", "-vv", "chat", "--name", "Ana", "--no-link"]).unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Chat { name, no_link, model } => {
                assert_eq!(name.as_deref(), Some("Ana"));
                assert!(no_link);
                assert!(model.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_defaults_to_settings() {
        let cli = Cli::try_parse_from(["poke", "serve"]).unwrap();

        assert!(matches!(cli.command, Commands::Serve { host: None, port: None }));
    }
}
