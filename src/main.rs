// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod cli;
mod repl;
mod view;

use std::path::Path;

use anyhow::Context;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use clap::Parser;
use jawab_client::DocumentUpload;
use jawab_config::Config;
use jawab_core::{AskOutcome, SessionController};
use view::ViewModel;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // Handle subcommands that need no session first
    if let Some(Commands::Completions { shell }) = &cli.command {
        cli::print_completions(*shell);
        return Ok(());
    }

    let config = load_config(&cli)?;

    if let Some(Commands::ShowConfig) = &cli.command {
        println!("{}", serde_yaml::to_string(&config).unwrap_or_default());
        return Ok(());
    }

    let backend = jawab_client::from_config(&config.backend)?;
    let controller = SessionController::new(backend, config.session.clone());
    let mut view = ViewModel::from_config(&config.ui);

    match cli.command {
        Some(Commands::Ask {
            file,
            questions,
            no_sources,
        }) => {
            if no_sources {
                view.show_sources = false;
            }
            run_ask(&controller, &view, &file, &questions).await
        }
        _ => repl::run(&controller, view).await,
    }
}

/// Merge command-line overrides into the layered file configuration.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = jawab_config::load(cli.config.as_deref())?;
    if let Some(url) = &cli.backend_url {
        config.backend.base_url = url.clone();
    }
    if cli.offline {
        config.backend.provider = "mock".into();
    }
    if let Some(mode) = cli.mode {
        config.session.default_mode = mode;
    }
    Ok(config)
}

/// Upload `file`, then ask each question in the same conversation.
async fn run_ask(
    controller: &SessionController,
    view: &ViewModel,
    file: &Path,
    questions: &[String],
) -> anyhow::Result<()> {
    let upload = DocumentUpload::from_path(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let receipt = controller
        .upload_document(upload)
        .await
        .with_context(|| format!("uploading {}", file.display()))?;
    eprintln!(
        "{} ({})",
        receipt.message.as_deref().unwrap_or("document ready"),
        receipt.document_id
    );

    let mut failures = 0;
    for question in questions {
        let outcome = controller.ask(question).await?;
        println!("{}", view.render_turn(outcome.turn()));
        if let AskOutcome::Fallback { error, .. } = &outcome {
            eprintln!("error: {error}");
            failures += 1;
        }
    }
    if failures > 0 {
        anyhow::bail!("{failures} of {} questions could not be answered", questions.len());
    }
    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
