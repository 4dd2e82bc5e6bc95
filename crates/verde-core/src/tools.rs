//! Tools the model may call during tool-calling advice
//!
//! There is one: `taxCalculatorTool`, which estimates taxes for an annual
//! salary. It runs the same validated flow as the deterministic path, so
//! whatever the model receives has already been reconciled.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ai::anthropic_compat::Tool;
use crate::ai::AIBackend;
use crate::error::{Error, Result};
use crate::flows;

/// Name the model uses to call the tax tool
pub const TAX_CALCULATOR_TOOL: &str = "taxCalculatorTool";

/// Input of the tax calculator tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaxCalculatorParams {
    #[schemars(description = "Gross annual salary in USD")]
    pub annual_salary: f64,
}

/// Tax calculator in Anthropic tool format
pub fn tax_calculator_tool() -> Tool {
    Tool::new(
        TAX_CALCULATOR_TOOL,
        "Estimate US federal and state taxes for a single filer from a gross annual salary. \
         Returns gross and net annual income, tax amounts and net monthly income.",
        schemars::schema_for!(TaxCalculatorParams).into(),
    )
}

/// All tools offered to the financial assistant
pub fn advice_tools() -> Vec<Tool> {
    vec![tax_calculator_tool()]
}

/// Run the tax tool and serialize its result for the model
pub async fn execute_tax_tool(ai: &dyn AIBackend, input: &serde_json::Value) -> Result<String> {
    let params: TaxCalculatorParams = serde_json::from_value(input.clone())
        .map_err(|e| Error::InvalidData(format!("Invalid params: {}", e)))?;
    let details = flows::tax::estimate_taxes(ai, params.annual_salary).await?;
    serde_json::to_string(&details)
        .map_err(|e| Error::InvalidData(format!("Failed to serialize: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::models::TaxDetails;

    #[test]
    fn test_tool_schema() {
        let tool = tax_calculator_tool();
        assert_eq!(tool.name, "taxCalculatorTool");
        assert!(tool.input_schema["properties"].get("annualSalary").is_some());
        assert_eq!(advice_tools().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_tax_tool() {
        let mock = MockBackend::new();
        let output = execute_tax_tool(&mock, &serde_json::json!({"annualSalary": 60000}))
            .await
            .unwrap();

        let details: TaxDetails = serde_json::from_str(&output).unwrap();
        assert_eq!(details.gross_annual_income, 60000.0);
        assert!((details.net_monthly_income * 12.0 - details.net_annual_income).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_execute_tax_tool_bad_input() {
        let mock = MockBackend::new();
        let err = execute_tax_tool(&mock, &serde_json::json!({"salary": "lots"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid params"));
        assert_eq!(mock.call_count(), 0);

        let err = execute_tax_tool(&mock, &serde_json::json!({"annualSalary": -5}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
