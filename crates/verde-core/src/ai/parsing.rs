//! JSON parsing helpers for AI backend responses
//!
//! Models often wrap their JSON in prose or code fences. These helpers pull
//! out the outermost object and deserialize it; anything that does not fit
//! the expected shape is `Error::InvalidData`.

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::models::TaxDetails;

use super::types::{CategoryResponse, FinancialAdvice};

/// Longest raw excerpt quoted in an error message
const MAX_EXCERPT: usize = 200;

/// Parse a tax breakdown from AI response
pub fn parse_tax_details(response: &str) -> Result<TaxDetails> {
    extract_json(response, "tax estimate")
}

/// Parse the raw category name from AI response
pub fn parse_category_suggestion(response: &str) -> Result<String> {
    let parsed: CategoryResponse = extract_json(response, "category suggestion")?;
    Ok(parsed.suggested_category)
}

/// Parse financial advice from AI response
pub fn parse_financial_advice(response: &str) -> Result<FinancialAdvice> {
    extract_json(response, "financial advice")
}

/// Deserialize the first `{` to last `}` span of a response
pub fn extract_json<T: DeserializeOwned>(response: &str, what: &str) -> Result<T> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            serde_json::from_str(json_str).map_err(|err| {
                Error::InvalidData(format!(
                    "Invalid {} JSON from AI: {} | Raw: {}",
                    what,
                    err,
                    excerpt(json_str)
                ))
            })
        }
        _ => Err(Error::InvalidData(format!(
            "No JSON found in AI {} response | Raw: {}",
            what,
            excerpt(response)
        ))),
    }
}

fn excerpt(text: &str) -> String {
    if text.chars().count() > MAX_EXCERPT {
        let cut: String = text.chars().take(MAX_EXCERPT).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
