//! User-facing flows built on the AI backends
//!
//! Each flow validates its input, makes the model call and checks what came
//! back before anything reaches application state.

pub mod advisor;
pub mod categorize;
pub mod tax;

pub use advisor::{AdvisorMode, FinancialAssistant};
pub use categorize::{suggest_category, CategorySuggestion};
pub use tax::estimate_taxes;
