// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use jawab_config::Mode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "jawab",
    about = "Ask questions about your documents from the terminal",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file (overrides auto-discovery)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Starting mode (overrides session.default_mode)
    #[arg(long, short = 'm', value_enum)]
    pub mode: Option<Mode>,

    /// Base URL of the RAG backend, e.g. "http://127.0.0.1:8000"
    #[arg(long, env = "JAWAB_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Answer locally without contacting a backend
    #[arg(long)]
    pub offline: bool,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Print the effective configuration and exit
    ShowConfig,
    /// Upload a document, ask each question in order and print the answers.
    Ask {
        /// Document to upload before asking
        #[arg(long, short = 'f', required = true)]
        file: PathBuf,
        /// Questions, asked one after another in the same conversation
        #[arg(value_name = "QUESTION", required = true)]
        questions: Vec<String>,
        /// Do not print supporting excerpts
        #[arg(long)]
        no_sources: bool,
    },
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "jawab", &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_ask_with_multiple_questions() {
        let cli = Cli::parse_from([
            "jawab", "--mode", "invoice", "ask", "-f", "bill.pdf", "Total?", "Due date?",
        ]);
        assert_eq!(cli.mode, Some(Mode::Invoice));
        match cli.command {
            Some(Commands::Ask { file, questions, no_sources }) => {
                assert_eq!(file, PathBuf::from("bill.pdf"));
                assert_eq!(questions, vec!["Total?", "Due date?"]);
                assert!(!no_sources);
            }
            other => panic!("expected ask, got {other:?}"),
        }
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::parse_from(["jawab", "-vv"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.command.is_none());
    }
}
