//! State container
//!
//! A `Store` owns the single logical `AppState`. Handles are cheap to clone
//! and share the same state; every mutation runs the reducer under the
//! channel's lock, so concurrent dispatches are serialized.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::ai::AIBackend;
use crate::flows;
use crate::state::{reduce, AppAction, AppState};

#[derive(Clone)]
pub struct Store {
    sender: Arc<watch::Sender<AppState>>,
}

impl Store {
    pub fn new(initial: AppState) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Apply an action and notify subscribers
    pub fn dispatch(&self, action: AppAction) {
        debug!(action = action.name(), "Dispatching");
        self.sender.send_modify(|state| {
            *state = reduce(std::mem::take(state), action);
        });
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AppState {
        self.sender.borrow().clone()
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.sender.subscribe()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

/// Result of [`bootstrap_tax_details`]
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapOutcome {
    /// No salary, or taxes were already known
    Skipped,
    Applied,
    Failed(String),
}

/// Estimate taxes for a salary that has none yet
///
/// Meant to run once at startup. Failure is logged and leaves the tax
/// snapshot unset; the salary stays as it was.
pub async fn bootstrap_tax_details(
    store: &Store,
    ai: &(impl AIBackend + ?Sized),
) -> BootstrapOutcome {
    let state = store.state();
    let salary = match state.annual_salary {
        Some(salary) if state.tax_details.is_none() => salary,
        _ => return BootstrapOutcome::Skipped,
    };

    match flows::tax::estimate_taxes(ai, salary).await {
        Ok(tax_details) => {
            info!(
                salary,
                net_monthly = tax_details.net_monthly_income,
                "Tax details bootstrapped"
            );
            store.dispatch(AppAction::SetSalaryAndTaxes {
                annual_salary: salary,
                tax_details,
            });
            BootstrapOutcome::Applied
        }
        Err(e) => {
            error!(salary, error = %e, "Failed to bootstrap tax details");
            BootstrapOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIClient, MockBackend};
    use crate::models::TaxDetails;

    #[test]
    fn test_clones_share_state() {
        let store = Store::new(AppState::demo());
        let other = store.clone();
        other.dispatch(AppAction::DeleteBudget("b1".into()));
        assert_eq!(store.state().budgets.len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_dispatch() {
        let store = Store::default();
        let mut rx = store.subscribe();
        store.dispatch(AppAction::SetSalaryAndTaxes {
            annual_salary: 50000.0,
            tax_details: TaxDetails::from_estimates(50000.0, 4000.0, 2500.0),
        });
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().annual_salary, Some(50000.0));
    }

    #[tokio::test]
    async fn test_bootstrap_applies_once() {
        let store = Store::new(AppState::demo());
        let ai = AIClient::mock();

        assert_eq!(
            bootstrap_tax_details(&store, &ai).await,
            BootstrapOutcome::Applied
        );
        let tax = store.state().tax_details.unwrap();
        assert_eq!(tax.gross_annual_income, 60000.0);

        assert_eq!(
            bootstrap_tax_details(&store, &ai).await,
            BootstrapOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn test_bootstrap_skips_without_salary() {
        let store = Store::default();
        assert_eq!(
            bootstrap_tax_details(&store, &AIClient::mock()).await,
            BootstrapOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn test_bootstrap_failure_leaves_taxes_unset() {
        let store = Store::new(AppState::demo());
        let ai = AIClient::Mock(MockBackend::failing());

        let outcome = bootstrap_tax_details(&store, &ai).await;
        assert!(matches!(outcome, BootstrapOutcome::Failed(_)));
        let state = store.state();
        assert_eq!(state.annual_salary, Some(60000.0));
        assert!(state.tax_details.is_none());
    }
}
