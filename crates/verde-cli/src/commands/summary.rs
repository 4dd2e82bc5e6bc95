//! Dashboard figures: overview, budgets and trends

use anyhow::Result;
use verde_core::analytics;
use verde_core::AppState;

use super::{money, print_json};

const PLACEHOLDER: &str = "--";

pub fn cmd_summary(state: &AppState, json: bool) -> Result<()> {
    let overview = analytics::overview(state);
    if json {
        return print_json(&overview);
    }

    // Salary-derived figures without a tax snapshot show as placeholders
    let salary_figure = |value: f64| {
        if overview.has_tax_snapshot {
            money(value)
        } else if state.annual_salary.is_some() {
            PLACEHOLDER.to_string()
        } else {
            money(0.0)
        }
    };

    println!("Overview\n");
    println!("  Net salary income:     {:>12}", salary_figure(overview.net_salary_income));
    println!("  Supplementary income:  {:>12}", money(overview.supplementary_income));
    println!("  Total monthly income:  {:>12}", salary_figure(overview.total_monthly_income));
    println!("  Total expenses:        {:>12}", money(overview.total_expenses));
    println!(
        "  Est. monthly taxes:    {:>12}",
        overview
            .estimated_monthly_taxes
            .map(money)
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    );
    println!("  Balance:               {:>12}", salary_figure(overview.balance));

    let summary = analytics::expense_summary(&state.transactions);
    if !summary.is_empty() {
        println!("\nExpenses by category\n");
        for (category, amount) in summary {
            println!("  {:<20} {:>12}", category, money(amount));
        }
    }

    Ok(())
}

pub fn cmd_budgets(state: &AppState, json: bool) -> Result<()> {
    let progress = analytics::budget_overview(state);
    if json {
        return print_json(&progress);
    }

    if progress.is_empty() {
        println!("No budgets set.");
        return Ok(());
    }

    println!(
        "{:<20} {:>12} {:>12} {:>12} {:>7}",
        "CATEGORY", "BUDGET", "SPENT", "REMAINING", "USED"
    );
    println!("{}", "-".repeat(67));
    for p in progress {
        let flag = if p.over_budget { "  over budget" } else { "" };
        println!(
            "{:<20} {:>12} {:>12} {:>12} {:>6.0}%{}",
            p.category_name,
            money(p.amount),
            money(p.spent),
            money(p.remaining),
            p.percent,
            flag
        );
    }

    Ok(())
}

pub fn cmd_trends(state: &AppState, json: bool) -> Result<()> {
    let trends = analytics::monthly_trends(&state.transactions);
    if json {
        return print_json(&trends);
    }

    if trends.is_empty() {
        println!("No transactions yet.");
        return Ok(());
    }

    println!("{:<10} {:>12} {:>12}", "MONTH", "INCOME", "EXPENSES");
    println!("{}", "-".repeat(36));
    for t in trends {
        println!("{:<10} {:>12} {:>12}", t.label, money(t.income), money(t.expense));
    }

    Ok(())
}
