// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::PathBuf;

use anyhow::Context;
use jawab_client::DocumentUpload;
use jawab_config::Mode;
use jawab_core::{AskOutcome, SessionController};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::view::{render_status, ViewModel};

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Upload(PathBuf),
    Mode(Mode),
    Reset,
    ToggleSources,
    History,
    Status,
    Help,
    Quit,
    Ask(String),
}

const HELP: &str = "\
commands:
  /upload PATH   upload a document for the current mode
  /mode MODE     switch mode (study | invoice); clears the document
  /reset         forget the document and the conversation
  /sources       show or hide supporting excerpts
  /history       print the conversation
  /status        print mode and document state
  /quit          exit
anything else is sent as a question";

impl Command {
    /// Parse a non-empty input line.  Lines not starting with `/` are
    /// questions.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Command::Ask(line.to_string()));
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((n, a)) => (n, a.trim()),
            None => (rest, ""),
        };
        match name {
            "upload" if arg.is_empty() => Err("usage: /upload PATH".into()),
            "upload" => Ok(Command::Upload(PathBuf::from(arg))),
            "mode" => arg.parse().map(Command::Mode),
            "reset" => Ok(Command::Reset),
            "sources" => Ok(Command::ToggleSources),
            "history" => Ok(Command::History),
            "status" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(format!("unknown command /{other} (try /help)")),
        }
    }
}

/// Interactive loop over stdin until EOF or `/quit`.
pub async fn run(controller: &SessionController, mut view: ViewModel) -> anyhow::Result<()> {
    println!("{}", render_status(&controller.snapshot()));
    println!("type /help for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match Command::parse(&line) {
            Ok(c) => c,
            Err(msg) => {
                eprintln!("{msg}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        execute(controller, &mut view, command).await;
    }
    Ok(())
}

async fn execute(controller: &SessionController, view: &mut ViewModel, command: Command) {
    match command {
        Command::Upload(path) => {
            let upload = match DocumentUpload::from_path(&path).await {
                Ok(u) => u,
                Err(e) => {
                    eprintln!("cannot read {}: {e}", path.display());
                    return;
                }
            };
            match controller.upload_document(upload).await {
                Ok(receipt) => {
                    let message = receipt.message.as_deref().unwrap_or("document ready");
                    println!("{message} ({})", receipt.document_id);
                }
                Err(e) => eprintln!("{e}"),
            }
        }
        Command::Mode(mode) => match controller.set_mode(mode) {
            Ok(true) => println!("{mode}: {}", mode.tagline()),
            Ok(false) => println!("already in {mode} mode"),
            Err(e) => eprintln!("{e}"),
        },
        Command::Reset => match controller.reset_document() {
            Ok(()) => println!("document and conversation cleared"),
            Err(e) => eprintln!("{e}"),
        },
        Command::ToggleSources => {
            let shown = view.toggle_sources();
            println!("sources {}", if shown { "shown" } else { "hidden" });
        }
        Command::History => println!("{}", view.render_conversation(&controller.snapshot())),
        Command::Status => println!("{}", render_status(&controller.snapshot())),
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
        Command::Ask(question) => match controller.ask(&question).await {
            Ok(outcome) => {
                println!("{}", view.render_turn(outcome.turn()));
                if let AskOutcome::Fallback { error, .. } = &outcome {
                    tracing::debug!("fallback reply after: {error}");
                }
            }
            Err(e) => eprintln!("{e}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_line_is_a_question() {
        assert_eq!(
            Command::parse("  What is chapter 2 about?  "),
            Ok(Command::Ask("What is chapter 2 about?".into()))
        );
    }

    #[test]
    fn upload_takes_path_with_spaces() {
        assert_eq!(
            Command::parse("/upload my notes.pdf"),
            Ok(Command::Upload(PathBuf::from("my notes.pdf")))
        );
        assert!(Command::parse("/upload").is_err());
    }

    #[test]
    fn mode_is_case_insensitive() {
        assert_eq!(Command::parse("/mode Invoice"), Ok(Command::Mode(Mode::Invoice)));
        assert!(Command::parse("/mode legal").is_err());
    }

    #[test]
    fn simple_commands() {
        assert_eq!(Command::parse("/reset"), Ok(Command::Reset));
        assert_eq!(Command::parse("/sources"), Ok(Command::ToggleSources));
        assert_eq!(Command::parse("/history"), Ok(Command::History));
        assert_eq!(Command::parse("/status"), Ok(Command::Status));
        assert_eq!(Command::parse("/quit"), Ok(Command::Quit));
        assert!(Command::parse("/frobnicate").is_err());
    }
}
