//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI arguments.
//! The command implementations are in the `commands` module.

use clap::{Parser, Subcommand};

/// Verde - Track spending, budgets and taxes with AI assistance
#[derive(Parser)]
#[command(name = "verde")]
#[command(about = "Personal finance tracker with AI-assisted taxes and advice", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Start from an empty tracker instead of the demo data
    #[arg(long, global = true)]
    pub empty: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate taxes and net income for an annual salary
    Tax {
        /// Gross annual salary in USD
        #[arg(short, long)]
        salary: f64,
    },

    /// Suggest a category for a transaction description
    Suggest {
        /// Transaction description (e.g., "Coffee at Starbucks")
        description: String,
    },

    /// Get financial advice for the tracked transactions and budgets
    Advise {
        /// Annual salary to use instead of the tracked one
        #[arg(short, long)]
        salary: Option<f64>,

        /// Let the model call the tax tool itself
        /// (requires ANTHROPIC_COMPATIBLE_HOST)
        #[arg(long)]
        tool_calling: bool,
    },

    /// Show income, expenses and balance
    Summary,

    /// Show budget progress
    Budgets,

    /// Show monthly income and expense trends
    Trends,

    /// Check the configured AI backend
    Health,

    /// Manage AI prompts
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all available prompts and their override status
    List,

    /// Show the content of a specific prompt
    Show {
        /// Prompt ID (e.g., estimate_taxes, suggest_category)
        prompt_id: String,
    },

    /// Show the path where prompt overrides should be placed
    Path,
}
