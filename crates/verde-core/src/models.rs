//! Domain models for Verde

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::categories::Category;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single dated income or expense entry
///
/// Never edited in place: replacing a transaction means deleting it and
/// adding a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
    pub category: Category,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }
}

/// A spending ceiling for one expense category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub category_name: String,
    pub amount: f64,
}

/// Estimated tax burden and net income derived from a gross salary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaxDetails {
    /// The gross annual income provided
    pub gross_annual_income: f64,
    /// The estimated federal taxes for the year
    pub estimated_federal_taxes: f64,
    /// The estimated state taxes for the year
    pub estimated_state_taxes: f64,
    /// The total sum of federal and state taxes
    pub total_estimated_taxes: f64,
    /// The net income after all estimated taxes
    pub net_annual_income: f64,
    /// The net monthly income after taxes
    pub net_monthly_income: f64,
}

impl TaxDetails {
    /// Build a consistent snapshot from the two tax estimates
    pub fn from_estimates(gross: f64, federal: f64, state: f64) -> Self {
        let total = federal + state;
        let net_annual = gross - total;
        Self {
            gross_annual_income: gross,
            estimated_federal_taxes: federal,
            estimated_state_taxes: state,
            total_estimated_taxes: total,
            net_annual_income: net_annual,
            net_monthly_income: net_annual / 12.0,
        }
    }

    /// Estimated taxes withheld per month
    pub fn monthly_taxes(&self) -> f64 {
        self.total_estimated_taxes / 12.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_parse() {
        assert_eq!(
            "Expense".parse::<TransactionType>().unwrap(),
            TransactionType::Expense
        );
        assert!("transfer".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_tax_details_from_estimates() {
        let tax = TaxDetails::from_estimates(60000.0, 5000.0, 3000.0);
        assert_eq!(tax.total_estimated_taxes, 8000.0);
        assert_eq!(tax.net_annual_income, 52000.0);
        assert!((tax.net_monthly_income - 52000.0 / 12.0).abs() < 1e-9);
        assert!((tax.monthly_taxes() - 8000.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_tax_details_wire_format() {
        let json = r#"{
            "grossAnnualIncome": 60000,
            "estimatedFederalTaxes": 5000,
            "estimatedStateTaxes": 3000,
            "totalEstimatedTaxes": 8000,
            "netAnnualIncome": 52000,
            "netMonthlyIncome": 4333.33
        }"#;
        let tax: TaxDetails = serde_json::from_str(json).unwrap();
        assert_eq!(tax.gross_annual_income, 60000.0);
        assert_eq!(tax.net_monthly_income, 4333.33);
    }

    #[test]
    fn test_tax_details_missing_field_rejected() {
        let json = r#"{"grossAnnualIncome": 60000, "estimatedFederalTaxes": 5000}"#;
        assert!(serde_json::from_str::<TaxDetails>(json).is_err());
    }

    #[test]
    fn test_budget_wire_format() {
        let budget = Budget {
            id: "b1".into(),
            category_name: "Groceries".into(),
            amount: 400.0,
        };
        let json = serde_json::to_value(&budget).unwrap();
        assert_eq!(json["categoryName"], "Groceries");
    }
}
