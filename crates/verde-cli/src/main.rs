//! Verde CLI - Personal finance tracker
//!
//! Usage:
//!   verde tax --salary 60000          Estimate taxes and net income
//!   verde suggest "Coffee at Starbucks"  Suggest a category
//!   verde advise [--tool-calling]     Get financial advice
//!   verde summary                     Show the dashboard figures

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use verde_core::Store;

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let store = Store::new(commands::initial_state(cli.empty));

    match cli.command {
        Commands::Tax { salary } => {
            let ai = commands::ai_client()?;
            commands::cmd_tax(&store, &ai, salary, cli.json).await
        }
        Commands::Suggest { description } => {
            let ai = commands::ai_client()?;
            commands::cmd_suggest(&ai, &description, cli.json).await
        }
        Commands::Advise {
            salary,
            tool_calling,
        } => {
            let ai = commands::ai_client()?;
            commands::cmd_advise(&store, ai, salary, tool_calling, cli.json).await
        }
        Commands::Summary => {
            if store.state().needs_tax_bootstrap() {
                commands::bootstrap(&store).await;
            }
            commands::cmd_summary(&store.state(), cli.json)
        }
        Commands::Budgets => commands::cmd_budgets(&store.state(), cli.json),
        Commands::Trends => commands::cmd_trends(&store.state(), cli.json),
        Commands::Health => commands::cmd_health().await,
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { prompt_id }) => commands::cmd_prompts_show(&prompt_id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
    }
}
