//! AI request and response types
//!
//! These types are backend-agnostic and used across all AI implementations.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::categories::CategoryKind;
use crate::error::Result;
use crate::models::{Budget, Transaction, TransactionType};
use crate::state::AppState;

/// Raw answer of the category suggestion prompt
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    /// One of the offered category names
    pub suggested_category: String,
}

/// Structured advice from the financial assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialAdvice {
    /// Actionable recommendations to reduce unnecessary expenses
    pub expense_recommendations: Vec<String>,
    /// Ways to invest monthly savings, safe or growth-oriented
    pub investment_suggestions: Vec<String>,
    /// Alerts about spending patterns and potential savings
    pub smart_alerts: Vec<String>,
}

/// Category as shown to the assistant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdviceCategory {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
}

/// Transaction as shown to the assistant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdviceTransaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    /// ISO-8601, midnight UTC
    pub date: String,
    pub description: String,
    pub category: AdviceCategory,
}

impl From<&Transaction> for AdviceTransaction {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.clone(),
            kind: tx.kind,
            amount: tx.amount,
            date: iso_midnight_utc(tx.date),
            description: tx.description.clone(),
            category: AdviceCategory {
                name: tx.category.name.to_string(),
                kind: tx.category.kind,
            },
        }
    }
}

/// Everything the financial assistant is given
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialAdviceInput {
    pub transactions: Vec<AdviceTransaction>,
    pub budgets: Vec<Budget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_salary: Option<f64>,
    /// ISO-8601 timestamp
    pub current_date: String,
}

impl FinancialAdviceInput {
    pub fn from_state(state: &AppState, now: DateTime<Utc>) -> Self {
        Self {
            transactions: state.transactions.iter().map(AdviceTransaction::from).collect(),
            budgets: state.budgets.clone(),
            annual_salary: state.annual_salary,
            current_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Variables for the `financial_advice` prompt
    pub fn prompt_vars(&self, income: &IncomeSource) -> Result<HashMap<&'static str, String>> {
        let mut vars = self.base_vars()?;
        match income {
            IncomeSource::Salary {
                annual_salary,
                net_monthly_income,
            } => {
                vars.insert("annual_salary", format!("{:.2}", annual_salary));
                vars.insert("net_monthly_income", format!("{:.2}", net_monthly_income));
            }
            IncomeSource::Transactions { monthly_income } => {
                vars.insert("transaction_income", format!("{:.2}", monthly_income));
            }
        }
        Ok(vars)
    }

    /// Variables for the `financial_advice_agent` prompt, where the model
    /// resolves income itself
    pub fn agent_prompt_vars(&self) -> Result<HashMap<&'static str, String>> {
        let mut vars = self.base_vars()?;
        if let Some(salary) = self.annual_salary {
            vars.insert("annual_salary", format!("{:.2}", salary));
        }
        Ok(vars)
    }

    fn base_vars(&self) -> Result<HashMap<&'static str, String>> {
        let mut vars = HashMap::new();
        vars.insert("current_date", self.current_date.clone());
        vars.insert("transactions", serde_json::to_string_pretty(&self.transactions)?);
        vars.insert("budgets", serde_json::to_string_pretty(&self.budgets)?);
        Ok(vars)
    }
}

/// Where the assistant's monthly income figure comes from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum IncomeSource {
    /// Net income derived from the salary; transaction income is supplementary
    #[serde(rename_all = "camelCase")]
    Salary {
        annual_salary: f64,
        net_monthly_income: f64,
    },
    /// No salary; income is the sum of income transactions
    #[serde(rename_all = "camelCase")]
    Transactions { monthly_income: f64 },
}

impl IncomeSource {
    pub fn monthly_income(&self) -> f64 {
        match self {
            Self::Salary {
                net_monthly_income, ..
            } => *net_monthly_income,
            Self::Transactions { monthly_income } => *monthly_income,
        }
    }
}

fn iso_midnight_utc(date: NaiveDate) -> String {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Borrow owned prompt variables as the `&str` map the prompt library renders
pub(crate) fn borrow_vars<'a>(
    vars: &'a HashMap<&'static str, String>,
) -> HashMap<&'a str, &'a str> {
    vars.iter().map(|(k, v)| (*k, v.as_str())).collect()
}
