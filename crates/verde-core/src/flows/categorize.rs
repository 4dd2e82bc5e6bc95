//! Category suggestion flow

use tracing::{debug, info};

use crate::ai::AIBackend;
use crate::categories::{self, Category};
use crate::error::Result;

/// Outcome of asking the model for a category
#[derive(Debug, Clone, PartialEq)]
pub enum CategorySuggestion {
    /// The model named a category in the registry
    Suggested(Category),
    /// The model answered with a name the registry does not know
    Unrecognized(String),
    /// Nothing to categorize
    NoSuggestion,
}

impl CategorySuggestion {
    /// The category to apply, if any
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::Suggested(category) => Some(*category),
            Self::Unrecognized(_) | Self::NoSuggestion => None,
        }
    }
}

/// Suggest a registry category for a transaction description
pub async fn suggest_category(
    ai: &(impl AIBackend + ?Sized),
    description: &str,
) -> Result<CategorySuggestion> {
    let description = description.trim();
    if description.is_empty() {
        return Ok(CategorySuggestion::NoSuggestion);
    }

    info!(model = ai.model(), description, "Suggesting category");
    let raw = ai.suggest_category(description).await?;
    let suggestion = resolve(&raw);
    debug!(raw = %raw, ?suggestion, "Category suggestion resolved");
    Ok(suggestion)
}

/// Match a raw model answer against the registry
fn resolve(raw: &str) -> CategorySuggestion {
    let cleaned = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim_end_matches('.')
        .trim();

    match categories::find_loose(cleaned) {
        Some(category) => CategorySuggestion::Suggested(category),
        None => CategorySuggestion::Unrecognized(raw.to_string()),
    }
}
