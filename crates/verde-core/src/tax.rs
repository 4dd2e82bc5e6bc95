//! Tax arithmetic
//!
//! `reconcile` checks a model-produced estimate against the requested salary
//! and recomputes the derived fields. `estimate_single_filer` is the
//! deterministic estimate used by the mock backend.

use tracing::warn;

use crate::error::{Error, Result};
use crate::models::TaxDetails;

/// Allowed difference, in dollars, between figures that should agree
const TOLERANCE: f64 = 1.0;

/// Flat state income tax rate
pub const STATE_TAX_RATE: f64 = 0.05;

/// 2024 standard deduction for a single filer
pub const STANDARD_DEDUCTION: f64 = 14_600.0;

/// 2024 single-filer federal brackets as (upper bound of taxable income, rate)
const FEDERAL_BRACKETS: &[(f64, f64)] = &[
    (11_600.0, 0.10),
    (47_150.0, 0.12),
    (100_525.0, 0.22),
    (191_950.0, 0.24),
    (243_725.0, 0.32),
    (609_350.0, 0.35),
    (f64::INFINITY, 0.37),
];

/// Validate a model estimate and make its derived fields consistent
///
/// Rejects an estimate for a different salary, negative taxes, or taxes
/// larger than the income. Totals and net figures are always recomputed from
/// the federal and state amounts.
pub fn reconcile(raw: TaxDetails, annual_salary: f64) -> Result<TaxDetails> {
    let fields = [
        raw.gross_annual_income,
        raw.estimated_federal_taxes,
        raw.estimated_state_taxes,
        raw.total_estimated_taxes,
        raw.net_annual_income,
        raw.net_monthly_income,
    ];
    if fields.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidData(
            "Tax estimate contains non-numeric values".into(),
        ));
    }

    if (raw.gross_annual_income - annual_salary).abs() > TOLERANCE {
        return Err(Error::InvalidData(format!(
            "Tax estimate is for {} but salary is {}",
            raw.gross_annual_income, annual_salary
        )));
    }

    if raw.estimated_federal_taxes < 0.0 || raw.estimated_state_taxes < 0.0 {
        return Err(Error::InvalidData("Tax estimate has negative taxes".into()));
    }

    let fixed = TaxDetails::from_estimates(
        annual_salary,
        raw.estimated_federal_taxes,
        raw.estimated_state_taxes,
    );

    if fixed.total_estimated_taxes > annual_salary {
        return Err(Error::InvalidData(format!(
            "Estimated taxes {} exceed income {}",
            fixed.total_estimated_taxes, annual_salary
        )));
    }

    let derived = [
        (
            "totalEstimatedTaxes",
            raw.total_estimated_taxes,
            fixed.total_estimated_taxes,
        ),
        ("netAnnualIncome", raw.net_annual_income, fixed.net_annual_income),
        ("netMonthlyIncome", raw.net_monthly_income, fixed.net_monthly_income),
    ];
    for (field, reported, computed) in derived {
        if (reported - computed).abs() > TOLERANCE {
            warn!(
                field,
                reported, computed, "Model tax arithmetic drifted, using computed value"
            );
        }
    }

    Ok(fixed)
}

/// Federal income tax on a gross salary after the standard deduction
pub fn federal_tax(gross: f64) -> f64 {
    let taxable = (gross - STANDARD_DEDUCTION).max(0.0);
    let mut tax = 0.0;
    let mut lower = 0.0;
    for &(upper, rate) in FEDERAL_BRACKETS {
        if taxable <= lower {
            break;
        }
        tax += (taxable.min(upper) - lower) * rate;
        lower = upper;
    }
    tax
}

/// Full estimate for a single filer with flat state tax
pub fn estimate_single_filer(gross: f64) -> TaxDetails {
    TaxDetails::from_estimates(gross, federal_tax(gross), gross * STATE_TAX_RATE)
}
