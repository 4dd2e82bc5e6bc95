//! Mock backend for testing
//!
//! Deterministic answers for every AI operation, so flows, the store and the
//! CLI can run without a model. Taxes come from the built-in single-filer
//! table, categories from keyword rules, advice from the input figures.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{TaxDetails, TransactionType};
use crate::tax;

use super::types::{FinancialAdvice, FinancialAdviceInput, IncomeSource};
use super::AIBackend;

/// Mock AI backend for testing
///
/// Clones share the call counter.
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Whether every operation should fail
    pub fail: bool,
    model: String,
    calls: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            fail: false,
            model: "mock".to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A backend whose operations all fail as if the model were down
    pub fn failing() -> Self {
        Self {
            healthy: false,
            fail: true,
            ..Self::new()
        }
    }

    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Number of operations invoked so far (health checks excluded)
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Api {
                status: 503,
                body: "mock backend unavailable".into(),
            });
        }
        Ok(())
    }
}

/// Keyword rules, first match wins
const CATEGORY_RULES: &[(&[&str], &str)] = &[
    (&["grocer", "supermarket", "whole foods", "trader joe"], "Groceries"),
    (&["uber", "lyft", "gas", "fuel", "bus", "metro", "parking"], "Transportation"),
    (&["rent", "mortgage"], "Housing"),
    (&["restaurant", "coffee", "starbucks", "dinner", "lunch", "pizza"], "Food"),
    (&["electric", "water bill", "internet", "phone bill"], "Utilities"),
    (&["netflix", "spotify", "movie", "concert", "cinema"], "Entertainment"),
    (&["amazon", "clothes", "mall"], "Shopping"),
    (&["flight", "hotel", "airbnb"], "Travel"),
    (&["haircut", "salon", "gym", "pharmacy"], "Personal Care"),
    (&["tuition", "course", "textbook"], "Education"),
    (&["stock", "etf", "brokerage"], "Investment"),
    (&["salary", "paycheck", "payroll"], "Salary"),
];

#[async_trait]
impl AIBackend for MockBackend {
    async fn estimate_taxes(&self, annual_salary: f64) -> Result<TaxDetails> {
        self.record_call()?;
        Ok(tax::estimate_single_filer(annual_salary))
    }

    async fn suggest_category(&self, description: &str) -> Result<String> {
        self.record_call()?;
        let lower = description.to_lowercase();
        let name = CATEGORY_RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(_, name)| *name)
            .unwrap_or("Other");
        Ok(name.to_string())
    }

    async fn financial_advice(
        &self,
        input: &FinancialAdviceInput,
        income: &IncomeSource,
    ) -> Result<FinancialAdvice> {
        self.record_call()?;

        let mut spent: BTreeMap<&str, f64> = BTreeMap::new();
        for tx in &input.transactions {
            if tx.kind == TransactionType::Expense {
                *spent.entry(tx.category.name.as_str()).or_default() += tx.amount;
            }
        }
        let total_expenses: f64 = spent.values().sum();
        let monthly_income = income.monthly_income();
        let savings = monthly_income - total_expenses;

        let mut expense_recommendations = Vec::new();
        if let Some((name, amount)) = spent.iter().max_by(|a, b| a.1.total_cmp(b.1)) {
            expense_recommendations.push(format!(
                "{} is your largest expense at ${:.2}; look for ways to trim it.",
                name, amount
            ));
        } else {
            expense_recommendations.push("Start logging expenses to get recommendations.".into());
        }

        let investment_suggestions = if savings > 0.0 {
            vec![
                format!(
                    "Move part of the ${:.2} you keep each month into a high-yield savings account.",
                    savings
                ),
                "Consider a low-cost index fund for long-term growth.".to_string(),
            ]
        } else {
            vec!["Build an emergency fund before investing.".to_string()]
        };

        let mut smart_alerts = Vec::new();
        for budget in &input.budgets {
            let used = spent.get(budget.category_name.as_str()).copied().unwrap_or(0.0);
            if used > budget.amount {
                smart_alerts.push(format!(
                    "You are ${:.2} over your {} budget.",
                    used - budget.amount,
                    budget.category_name
                ));
            }
        }
        if savings < 0.0 {
            smart_alerts.push(format!(
                "Expenses exceed income by ${:.2} this month.",
                -savings
            ));
        }

        Ok(FinancialAdvice {
            expense_recommendations,
            investment_suggestions,
            smart_alerts,
        })
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
