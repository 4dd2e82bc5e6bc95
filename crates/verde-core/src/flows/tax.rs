//! Tax estimation flow

use tracing::info;

use crate::ai::AIBackend;
use crate::error::{Error, Result};
use crate::models::TaxDetails;
use crate::tax;

/// Estimate taxes for a single filer earning `annual_salary`
///
/// The model's answer is reconciled against the salary before it is
/// returned: a mismatched gross is rejected and the derived fields are
/// recomputed from the federal and state estimates.
pub async fn estimate_taxes(
    ai: &(impl AIBackend + ?Sized),
    annual_salary: f64,
) -> Result<TaxDetails> {
    if !annual_salary.is_finite() || annual_salary <= 0.0 {
        return Err(Error::Validation(
            "Annual salary must be a positive number".into(),
        ));
    }

    info!(model = ai.model(), annual_salary, "Estimating taxes");
    let raw = ai.estimate_taxes(annual_salary).await?;
    let details = tax::reconcile(raw, annual_salary)?;
    info!(
        net_monthly_income = details.net_monthly_income,
        "Tax estimate complete"
    );
    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;

    #[tokio::test]
    async fn test_estimate_is_consistent() {
        let details = estimate_taxes(&MockBackend::new(), 60000.0).await.unwrap();
        assert_eq!(details.gross_annual_income, 60000.0);
        assert_eq!(
            details.total_estimated_taxes,
            details.estimated_federal_taxes + details.estimated_state_taxes
        );
        assert_eq!(
            details.net_annual_income,
            details.gross_annual_income - details.total_estimated_taxes
        );
        assert_eq!(details.net_monthly_income, details.net_annual_income / 12.0);
    }

    #[tokio::test]
    async fn test_rejects_bad_salary_without_calling() {
        let mock = MockBackend::new();
        for salary in [0.0, -100.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                estimate_taxes(&mock, salary).await,
                Err(Error::Validation(_))
            ));
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let err = estimate_taxes(&MockBackend::failing(), 60000.0)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
