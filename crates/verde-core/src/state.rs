//! Application state and reducer
//!
//! All mutations go through [`reduce`], a pure function from the previous
//! state and an action to the next state. The reducer never fails and never
//! validates; validation happens in [`crate::forms`] before dispatch.

use chrono::NaiveDate;
use serde::Serialize;

use crate::categories;
use crate::models::{Budget, TaxDetails, Transaction, TransactionType};

/// Everything the tracker knows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Newest first
    pub transactions: Vec<Transaction>,
    /// Insertion order, at most one per category
    pub budgets: Vec<Budget>,
    pub annual_salary: Option<f64>,
    /// Derived from `annual_salary` when it was last set
    pub tax_details: Option<TaxDetails>,
}

/// A state transition
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    AddTransaction(Transaction),
    DeleteTransaction(String),
    SetBudget(Budget),
    DeleteBudget(String),
    SetSalaryAndTaxes {
        annual_salary: f64,
        tax_details: TaxDetails,
    },
}

impl AppAction {
    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddTransaction(_) => "add_transaction",
            Self::DeleteTransaction(_) => "delete_transaction",
            Self::SetBudget(_) => "set_budget",
            Self::DeleteBudget(_) => "delete_budget",
            Self::SetSalaryAndTaxes { .. } => "set_salary_and_taxes",
        }
    }
}

/// Apply one action to the state
pub fn reduce(mut state: AppState, action: AppAction) -> AppState {
    match action {
        AppAction::AddTransaction(tx) => {
            state.transactions.insert(0, tx);
        }
        AppAction::DeleteTransaction(id) => {
            state.transactions.retain(|t| t.id != id);
        }
        AppAction::SetBudget(budget) => {
            match state
                .budgets
                .iter_mut()
                .find(|b| b.category_name == budget.category_name)
            {
                Some(existing) => *existing = budget,
                None => state.budgets.push(budget),
            }
        }
        AppAction::DeleteBudget(id) => {
            state.budgets.retain(|b| b.id != id);
        }
        AppAction::SetSalaryAndTaxes {
            annual_salary,
            tax_details,
        } => {
            state.annual_salary = Some(annual_salary);
            state.tax_details = Some(tax_details);
        }
    }
    state
}

impl AppState {
    /// An empty tracker with no salary
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed data shown on first launch
    pub fn demo() -> Self {
        let expense = |id: &str, amount: f64, (y, m, d): (i32, u32, u32), desc: &str, cat: &str| {
            let category = categories::find(cat)?;
            Some(Transaction {
                id: id.to_string(),
                kind: TransactionType::Expense,
                amount,
                date: NaiveDate::from_ymd_opt(y, m, d)?,
                description: desc.to_string(),
                category,
            })
        };

        let transactions = [
            expense("2", 75.50, (2024, 7, 5), "Weekly Groceries", "Groceries"),
            expense("3", 30.0, (2024, 7, 6), "Gasoline", "Transportation"),
            expense("4", 1200.0, (2024, 7, 1), "Rent", "Housing"),
            expense("5", 25.00, (2024, 7, 10), "Movie tickets", "Entertainment"),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self {
            transactions,
            budgets: vec![
                Budget {
                    id: "b1".into(),
                    category_name: "Groceries".into(),
                    amount: 400.0,
                },
                Budget {
                    id: "b2".into(),
                    category_name: "Entertainment".into(),
                    amount: 150.0,
                },
            ],
            annual_salary: Some(60000.0),
            tax_details: None,
        }
    }

    pub fn budget_for(&self, category_name: &str) -> Option<&Budget> {
        self.budgets.iter().find(|b| b.category_name == category_name)
    }

    pub fn income_transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|t| t.is_income())
    }

    pub fn expense_transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|t| t.is_expense())
    }

    /// The tax snapshot, if it was computed for the current salary
    pub fn tax_details_for_salary(&self) -> Option<&TaxDetails> {
        let salary = self.annual_salary?;
        self.tax_details
            .as_ref()
            .filter(|t| (t.gross_annual_income - salary).abs() <= 1.0)
    }

    /// Salary is known but taxes have not been estimated yet
    pub fn needs_tax_bootstrap(&self) -> bool {
        self.annual_salary.is_some() && self.tax_details.is_none()
    }
}
