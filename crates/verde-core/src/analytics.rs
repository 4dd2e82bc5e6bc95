//! Dashboard aggregations
//!
//! Read-only views computed from `AppState`. Nothing here is stored; every
//! figure is recomputed from the transactions on each call.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use crate::models::{Budget, Transaction};
use crate::state::AppState;

/// Expense totals keyed by category name
pub fn spent_by_category(transactions: &[Transaction]) -> BTreeMap<String, f64> {
    let mut spent = BTreeMap::new();
    for tx in transactions.iter().filter(|t| t.is_expense()) {
        *spent.entry(tx.category.name.to_string()).or_insert(0.0) += tx.amount;
    }
    spent
}

/// How far a budget has been used
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgress {
    pub budget_id: String,
    pub category_name: String,
    pub amount: f64,
    pub spent: f64,
    /// Negative when over budget
    pub remaining: f64,
    /// Share of the budget spent, can exceed 100
    pub percent: f64,
    pub over_budget: bool,
}

pub fn budget_progress(budget: &Budget, spent: f64) -> BudgetProgress {
    let remaining = budget.amount - spent;
    let percent = if budget.amount > 0.0 {
        spent / budget.amount * 100.0
    } else {
        0.0
    };
    BudgetProgress {
        budget_id: budget.id.clone(),
        category_name: budget.category_name.clone(),
        amount: budget.amount,
        spent,
        remaining,
        percent,
        over_budget: remaining < 0.0,
    }
}

/// Progress for every budget, in budget order
pub fn budget_overview(state: &AppState) -> Vec<BudgetProgress> {
    let spent = spent_by_category(&state.transactions);
    state
        .budgets
        .iter()
        .map(|b| budget_progress(b, spent.get(&b.category_name).copied().unwrap_or(0.0)))
        .collect()
}

/// Headline figures for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    /// Net monthly income from the tax snapshot, 0 without one
    pub net_salary_income: f64,
    /// Sum of income transactions
    pub supplementary_income: f64,
    pub total_monthly_income: f64,
    pub total_expenses: f64,
    pub estimated_monthly_taxes: Option<f64>,
    pub balance: f64,
    /// False means salary-derived figures should show as placeholders
    pub has_tax_snapshot: bool,
}

pub fn overview(state: &AppState) -> Overview {
    let net_salary_income = state
        .tax_details
        .as_ref()
        .map(|t| t.net_monthly_income)
        .unwrap_or(0.0);
    let supplementary_income: f64 = state.income_transactions().map(|t| t.amount).sum();
    let total_expenses: f64 = state.expense_transactions().map(|t| t.amount).sum();
    let total_monthly_income = net_salary_income + supplementary_income;

    Overview {
        net_salary_income,
        supplementary_income,
        total_monthly_income,
        total_expenses,
        estimated_monthly_taxes: state.tax_details.as_ref().map(|t| t.monthly_taxes()),
        balance: total_monthly_income - total_expenses,
        has_tax_snapshot: state.tax_details.is_some(),
    }
}

/// Expense totals per category, largest first
pub fn expense_summary(transactions: &[Transaction]) -> Vec<(String, f64)> {
    let mut summary: Vec<_> = spent_by_category(transactions).into_iter().collect();
    summary.sort_by(|a, b| b.1.total_cmp(&a.1));
    summary
}

/// Income and expense totals for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    /// "YYYY-MM"
    pub month: String,
    /// "Jul 2024"
    pub label: String,
    pub income: f64,
    pub expense: f64,
}

/// Monthly totals, oldest month first
pub fn monthly_trends(transactions: &[Transaction]) -> Vec<MonthlyTrend> {
    let mut months: BTreeMap<(i32, u32), MonthlyTrend> = BTreeMap::new();

    for tx in transactions {
        let key = (tx.date.year(), tx.date.month());
        let entry = months.entry(key).or_insert_with(|| MonthlyTrend {
            month: tx.date.format("%Y-%m").to_string(),
            label: tx.date.format("%b %Y").to_string(),
            income: 0.0,
            expense: 0.0,
        });
        if tx.is_income() {
            entry.income += tx.amount;
        } else {
            entry.expense += tx.amount;
        }
    }

    months.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories;
    use crate::models::{TaxDetails, TransactionType};
    use crate::state::{reduce, AppAction};
    use chrono::NaiveDate;

    fn tx(
        kind: TransactionType,
        amount: f64,
        date: (i32, u32, u32),
        category: &str,
    ) -> Transaction {
        Transaction {
            id: format!("{}-{}", category, amount),
            kind,
            amount,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            description: "test".into(),
            category: categories::find(category).unwrap(),
        }
    }

    #[test]
    fn test_adding_expense_only_touches_its_category() {
        let state = AppState::demo();
        let before = spent_by_category(&state.transactions);

        let dinner = Transaction {
            description: "Dinner".into(),
            ..tx(TransactionType::Expense, 50.0, (2024, 7, 15), "Food")
        };
        let state = reduce(state, AppAction::AddTransaction(dinner));
        let after = spent_by_category(&state.transactions);

        assert_eq!(after.get("Food"), Some(&50.0));
        for (name, amount) in &before {
            assert_eq!(after.get(name), Some(amount));
        }
        assert_eq!(after.len(), before.len() + 1);
    }

    #[test]
    fn test_income_not_counted_as_spending() {
        let txs = vec![
            tx(TransactionType::Income, 500.0, (2024, 7, 1), "Other"),
            tx(TransactionType::Expense, 20.0, (2024, 7, 2), "Other"),
        ];
        assert_eq!(spent_by_category(&txs).get("Other"), Some(&20.0));
    }

    #[test]
    fn test_budget_progress_over_budget() {
        let budget = Budget {
            id: "b".into(),
            category_name: "Food".into(),
            amount: 100.0,
        };
        let p = budget_progress(&budget, 125.0);
        assert_eq!(p.remaining, -25.0);
        assert_eq!(p.percent, 125.0);
        assert!(p.over_budget);

        let p = budget_progress(&budget, 100.0);
        assert!(!p.over_budget);
    }

    #[test]
    fn test_budget_overview_demo() {
        let progress = budget_overview(&AppState::demo());
        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].category_name, "Groceries");
        assert_eq!(progress[0].spent, 75.5);
        assert_eq!(progress[1].spent, 25.0);
        assert_eq!(progress[1].remaining, 125.0);
    }

    #[test]
    fn test_overview_without_salary() {
        let mut state = AppState::new();
        state.transactions = vec![
            tx(TransactionType::Income, 1000.0, (2024, 7, 1), "Freelance"),
            tx(TransactionType::Income, 500.0, (2024, 7, 3), "Other"),
            tx(TransactionType::Expense, 300.0, (2024, 7, 4), "Food"),
        ];
        let o = overview(&state);
        assert_eq!(o.total_monthly_income, 1500.0);
        assert_eq!(o.net_salary_income, 0.0);
        assert_eq!(o.balance, 1200.0);
        assert_eq!(o.estimated_monthly_taxes, None);
        assert!(!o.has_tax_snapshot);
    }

    #[test]
    fn test_overview_with_tax_snapshot() {
        let mut state = AppState::demo();
        state.tax_details = Some(TaxDetails::from_estimates(60000.0, 4800.0, 3000.0));
        let o = overview(&state);
        assert_eq!(o.net_salary_income, 52200.0 / 12.0);
        assert_eq!(o.total_expenses, 1330.5);
        assert_eq!(o.estimated_monthly_taxes, Some(650.0));
        assert!(o.has_tax_snapshot);
    }

    #[test]
    fn test_expense_summary_sorted_descending() {
        let summary = expense_summary(&AppState::demo().transactions);
        let names: Vec<_> = summary.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["Housing", "Groceries", "Transportation", "Entertainment"]
        );
    }

    #[test]
    fn test_monthly_trends_chronological() {
        let txs = vec![
            tx(TransactionType::Expense, 40.0, (2024, 8, 2), "Food"),
            tx(TransactionType::Income, 900.0, (2024, 7, 20), "Freelance"),
            tx(TransactionType::Expense, 10.0, (2024, 7, 1), "Food"),
            tx(TransactionType::Expense, 5.0, (2023, 12, 31), "Food"),
        ];
        let trends = monthly_trends(&txs);
        let months: Vec<_> = trends.iter().map(|t| t.month.as_str()).collect();
        assert_eq!(months, vec!["2023-12", "2024-07", "2024-08"]);
        assert_eq!(trends[1].label, "Jul 2024");
        assert_eq!(trends[1].income, 900.0);
        assert_eq!(trends[1].expense, 10.0);
    }

    #[test]
    fn test_monthly_trends_empty() {
        assert!(monthly_trends(&[]).is_empty());
    }
}
