//! Category suggestion command

use anyhow::Result;
use serde_json::json;
use verde_core::flows::{self, CategorySuggestion};
use verde_core::AIBackend;

use super::{ai_failure, print_json};

pub async fn cmd_suggest(
    ai: &(impl AIBackend + ?Sized),
    description: &str,
    json: bool,
) -> Result<()> {
    let suggestion = flows::suggest_category(ai, description)
        .await
        .map_err(|e| ai_failure(e, "Could not suggest a category"))?;

    if json {
        let value = match &suggestion {
            CategorySuggestion::Suggested(c) => {
                json!({"suggested": c.name, "kind": c.kind.as_str()})
            }
            CategorySuggestion::Unrecognized(raw) => json!({"suggested": null, "raw": raw}),
            CategorySuggestion::NoSuggestion => json!({"suggested": null}),
        };
        return print_json(&value);
    }

    match suggestion {
        CategorySuggestion::Suggested(c) => {
            println!("{} {} ({})", c.icon, c.name, c.kind.as_str());
        }
        CategorySuggestion::Unrecognized(raw) => {
            println!("No matching category (model said \"{}\")", raw);
        }
        CategorySuggestion::NoSuggestion => {
            println!("Enter a description to get a suggestion");
        }
    }

    Ok(())
}
