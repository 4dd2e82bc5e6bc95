//! Tax estimation command

use anyhow::Result;
use verde_core::flows;
use verde_core::forms::validate_salary;
use verde_core::{AIBackend, AppAction, Store};

use super::{ai_failure, money, print_json};

/// Estimate taxes for `salary` and record it with its tax snapshot
pub async fn cmd_tax(
    store: &Store,
    ai: &(impl AIBackend + ?Sized),
    salary: f64,
    json: bool,
) -> Result<()> {
    let salary = validate_salary(salary)?;

    let tax_details = flows::estimate_taxes(ai, salary)
        .await
        .map_err(|e| ai_failure(e, "Could not estimate taxes"))?;

    store.dispatch(AppAction::SetSalaryAndTaxes {
        annual_salary: salary,
        tax_details,
    });

    if json {
        return print_json(&tax_details);
    }

    println!("Tax estimate for {} ({})\n", money(salary), ai.model());
    println!("  Federal taxes:     {:>14}", money(tax_details.estimated_federal_taxes));
    println!("  State taxes:       {:>14}", money(tax_details.estimated_state_taxes));
    println!("  Total taxes:       {:>14}", money(tax_details.total_estimated_taxes));
    println!();
    println!("  Net annual income: {:>14}", money(tax_details.net_annual_income));
    println!("  Net monthly:       {:>14}", money(tax_details.net_monthly_income));
    println!();
    println!("Estimates only. Consult a tax professional for filing.");

    Ok(())
}
