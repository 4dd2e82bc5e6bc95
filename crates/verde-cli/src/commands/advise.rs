//! Financial assistant command

use anyhow::{Context, Result};
use chrono::Utc;
use verde_core::flows::advisor::AdviceReport;
use verde_core::forms::validate_salary;
use verde_core::{AIClient, AIOrchestrator, AdvisorMode, FinancialAssistant, IncomeSource, Store};

use super::{ai_failure, money, print_json};

/// Ask the assistant about the tracked state
///
/// `salary` replaces the tracked salary for this run and drops any tax
/// snapshot so the assistant works from the new figure.
pub async fn cmd_advise(
    store: &Store,
    ai: AIClient,
    salary: Option<f64>,
    tool_calling: bool,
    json: bool,
) -> Result<()> {
    let mut state = store.state();
    if let Some(salary) = salary {
        state.annual_salary = Some(validate_salary(salary)?);
        state.tax_details = None;
    }

    let mode = if tool_calling {
        let orchestrator = AIOrchestrator::from_env()
            .context("--tool-calling requires ANTHROPIC_COMPATIBLE_HOST")?;
        AdvisorMode::ToolCalling(orchestrator)
    } else {
        AdvisorMode::Deterministic
    };

    let assistant = FinancialAssistant::new(ai).with_mode(mode);
    let report = assistant
        .advise(&state, Utc::now())
        .await
        .map_err(|e| ai_failure(e, "Could not get advice"))?;

    if json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &AdviceReport) {
    match &report.income {
        Some(IncomeSource::Salary {
            annual_salary,
            net_monthly_income,
        }) => println!(
            "Income: {} net per month from a {} salary\n",
            money(*net_monthly_income),
            money(*annual_salary)
        ),
        Some(IncomeSource::Transactions { monthly_income }) => {
            println!("Income: {} from income transactions\n", money(*monthly_income))
        }
        None => {}
    }

    for call in &report.tool_calls {
        let status = if call.success { "ok" } else { "failed" };
        println!("Tool {} ({}): {}", call.name, status, call.input);
    }
    if !report.tool_calls.is_empty() {
        println!();
    }

    print_section("Expense recommendations", &report.advice.expense_recommendations);
    print_section("Investment suggestions", &report.advice.investment_suggestions);
    print_section("Smart alerts", &report.advice.smart_alerts);
}

fn print_section(title: &str, items: &[String]) {
    println!("{}:", title);
    if items.is_empty() {
        println!("  (none)");
    }
    for item in items {
        println!("  - {}", item);
    }
    println!();
}
