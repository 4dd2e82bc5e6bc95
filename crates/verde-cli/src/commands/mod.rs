//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `advise` - Financial assistant
//! - `health` - AI backend and routing diagnostics
//! - `prompts` - Prompt library management commands
//! - `suggest` - Category suggestion
//! - `summary` - Dashboard figures, budgets and trends
//! - `tax` - Tax estimation

pub mod advise;
pub mod health;
pub mod prompts;
pub mod suggest;
pub mod summary;
pub mod tax;

// Re-export command functions for main.rs
pub use advise::*;
pub use health::*;
pub use prompts::*;
pub use suggest::*;
pub use summary::*;
pub use tax::*;

use anyhow::{Context, Result};
use tracing::warn;
use verde_core::{bootstrap_tax_details, AIClient, AppState, BootstrapOutcome, Store};

/// State the CLI starts from
pub fn initial_state(empty: bool) -> AppState {
    if empty {
        AppState::new()
    } else {
        AppState::demo()
    }
}

/// AI client configured from the environment
pub fn ai_client() -> Result<AIClient> {
    AIClient::from_env().context("Failed to configure AI backend (see AI_BACKEND)")
}

/// Estimate taxes for the tracked salary if the backend is available
///
/// Never fails: without a backend the dashboard shows placeholders.
pub async fn bootstrap(store: &Store) -> BootstrapOutcome {
    match AIClient::from_env() {
        Ok(ai) => bootstrap_tax_details(store, &ai).await,
        Err(e) => {
            warn!(error = %e, "No AI backend, skipping tax estimate");
            BootstrapOutcome::Failed(e.to_string())
        }
    }
}

/// Format an amount as dollars
pub fn money(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", -amount)
    } else {
        format!("${:.2}", amount)
    }
}

/// Extra line for errors worth retrying
pub(crate) fn retry_hint(err: &verde_core::Error) -> Option<&'static str> {
    err.is_retryable()
        .then_some("the AI service may be busy, try again in a moment")
}

/// Wrap a failed AI call for `main`'s error report, with a retry hint
/// when one applies
pub(crate) fn ai_failure(err: verde_core::Error, action: &str) -> anyhow::Error {
    let message = match retry_hint(&err) {
        Some(hint) => format!("{} ({})", action, hint),
        None => action.to_string(),
    };
    anyhow::Error::new(err).context(message)
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
