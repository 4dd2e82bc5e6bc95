//! Financial assistant flow
//!
//! Turns the tracker state into structured advice. Income is resolved
//! before the model sees anything: a salary goes through the tax flow (or
//! reuses a matching tax snapshot) and its net monthly figure becomes the
//! primary income; without a salary, income transactions are the income.
//!
//! In [`AdvisorMode::ToolCalling`] the model is instead handed the tax
//! calculator and decides for itself when to use it.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::ai::parsing::parse_financial_advice;
use crate::ai::types::borrow_vars;
use crate::ai::{
    render_prompt, AIBackend, AIClient, AIOrchestrator, FinancialAdvice, FinancialAdviceInput,
    IncomeSource, ToolCallRecord,
};
use crate::error::Result;
use crate::prompts::{PromptId, PromptLibrary};
use crate::state::AppState;
use crate::tools;

use super::tax::estimate_taxes;

/// How the assistant obtains the user's income
#[derive(Clone, Default)]
pub enum AdvisorMode {
    /// Resolve income in code, then make one advice call
    #[default]
    Deterministic,
    /// Let the model call the tax tool through the orchestrator
    ToolCalling(AIOrchestrator),
}

/// Advice plus how it was produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceReport {
    pub advice: FinancialAdvice,
    /// Income given to the model; `None` when the model resolved it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income: Option<IncomeSource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRecord>,
}

#[derive(Clone)]
pub struct FinancialAssistant {
    ai: AIClient,
    mode: AdvisorMode,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl FinancialAssistant {
    pub fn new(ai: AIClient) -> Self {
        Self {
            ai,
            mode: AdvisorMode::Deterministic,
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    pub fn with_mode(self, mode: AdvisorMode) -> Self {
        Self { mode, ..self }
    }

    /// Use a specific prompt library for the tool-calling prompt
    pub fn with_prompts(self, prompts: PromptLibrary) -> Self {
        Self {
            prompts: Arc::new(RwLock::new(prompts)),
            ..self
        }
    }

    pub fn mode(&self) -> &AdvisorMode {
        &self.mode
    }

    /// Income the model should budget against
    pub async fn resolve_income(&self, state: &AppState) -> Result<IncomeSource> {
        let Some(annual_salary) = state.annual_salary else {
            let monthly_income = state.income_transactions().map(|t| t.amount).sum();
            return Ok(IncomeSource::Transactions { monthly_income });
        };

        let details = match state.tax_details_for_salary() {
            Some(details) => *details,
            None => estimate_taxes(&self.ai, annual_salary).await?,
        };
        Ok(IncomeSource::Salary {
            annual_salary,
            net_monthly_income: details.net_monthly_income,
        })
    }

    /// Analyze the state and return advice
    pub async fn advise(&self, state: &AppState, now: DateTime<Utc>) -> Result<AdviceReport> {
        let input = FinancialAdviceInput::from_state(state, now);
        info!(
            transactions = input.transactions.len(),
            budgets = input.budgets.len(),
            salary = input.annual_salary.is_some(),
            "Requesting financial advice"
        );

        let report = match &self.mode {
            AdvisorMode::Deterministic => {
                let income = self.resolve_income(state).await?;
                let advice = self.ai.financial_advice(&input, &income).await?;
                AdviceReport {
                    advice,
                    income: Some(income),
                    tool_calls: Vec::new(),
                }
            }
            AdvisorMode::ToolCalling(orchestrator) => {
                let vars = input.agent_prompt_vars()?;
                let prompt = render_prompt(
                    &self.prompts,
                    PromptId::FinancialAdviceAgent,
                    &borrow_vars(&vars),
                )?;
                let result = orchestrator
                    .execute(
                        &self.ai,
                        prompt.system.as_deref(),
                        &prompt.user,
                        &tools::advice_tools(),
                    )
                    .await?;
                AdviceReport {
                    advice: parse_financial_advice(&result.response)?,
                    income: None,
                    tool_calls: result.tool_calls,
                }
            }
        };

        info!(
            recommendations = report.advice.expense_recommendations.len(),
            alerts = report.advice.smart_alerts.len(),
            "Financial advice ready"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;
    use crate::ai::MockBackend;
    use crate::categories;
    use crate::models::{TaxDetails, Transaction, TransactionType};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()
    }

    fn income(id: &str, amount: f64) -> Transaction {
        Transaction {
            id: id.to_string(),
            kind: TransactionType::Income,
            amount,
            date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            description: "Side project".to_string(),
            category: categories::find("Freelance").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_income_without_salary_sums_transactions() {
        let state = AppState {
            transactions: vec![income("1", 1000.0), income("2", 500.0)],
            ..AppState::new()
        };
        let mock = MockBackend::new();
        let assistant = FinancialAssistant::new(AIClient::Mock(mock.clone()));

        let income = assistant.resolve_income(&state).await.unwrap();
        assert_eq!(
            income,
            IncomeSource::Transactions {
                monthly_income: 1500.0
            }
        );
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_income_reuses_matching_snapshot() {
        let snapshot = TaxDetails::from_estimates(60000.0, 5000.0, 3000.0);
        let state = AppState {
            tax_details: Some(snapshot),
            ..AppState::demo()
        };
        let mock = MockBackend::new();
        let assistant = FinancialAssistant::new(AIClient::Mock(mock.clone()));

        let income = assistant.resolve_income(&state).await.unwrap();
        assert_eq!(income.monthly_income(), snapshot.net_monthly_income);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_income_estimates_stale_snapshot() {
        let state = AppState {
            tax_details: Some(TaxDetails::from_estimates(40000.0, 2000.0, 2000.0)),
            ..AppState::demo()
        };
        let mock = MockBackend::new();
        let assistant = FinancialAssistant::new(AIClient::Mock(mock.clone()));

        let income = assistant.resolve_income(&state).await.unwrap();
        match income {
            IncomeSource::Salary { annual_salary, .. } => assert_eq!(annual_salary, 60000.0),
            other => panic!("expected salary income, got {:?}", other),
        }
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_deterministic_advice() {
        let assistant = FinancialAssistant::new(AIClient::mock());
        let report = assistant.advise(&AppState::demo(), now()).await.unwrap();

        assert!(matches!(report.income, Some(IncomeSource::Salary { .. })));
        assert!(report.tool_calls.is_empty());
        assert!(report.advice.expense_recommendations[0].contains("Housing"));
    }

    #[tokio::test]
    async fn test_advice_fails_when_model_down() {
        let assistant = FinancialAssistant::new(AIClient::Mock(MockBackend::failing()));
        assert!(assistant.advise(&AppState::demo(), now()).await.is_err());
    }
}
