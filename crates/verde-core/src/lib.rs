//! Verde Core Library
//!
//! Shared functionality for the Verde personal finance tracker:
//! - Transaction, budget and salary state with a pure reducer
//! - Category registry and form validation
//! - Budget, overview and trend analytics
//! - Pluggable AI backends (Gemini, Ollama, mock) and a tool-calling orchestrator
//! - Tax estimation, category suggestion and financial advice flows
//! - Model router and prompt library for customizable AI behaviour

pub mod ai;
pub mod analytics;
pub mod categories;
pub mod error;
pub mod flows;
pub mod forms;
pub mod model_router;
pub mod models;
pub mod prompts;
pub mod state;
pub mod store;
pub mod tax;
pub mod tools;

/// Test utilities including a mock LLM server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIBackend, AIClient, AIOrchestrator, AnthropicCompatBackend, FinancialAdvice,
    FinancialAdviceInput, GeminiBackend, IncomeSource, MockBackend, OllamaBackend,
};
pub use analytics::{BudgetProgress, MonthlyTrend, Overview};
pub use categories::{Category, CategoryKind};
pub use error::{Error, Result};
pub use flows::{AdvisorMode, CategorySuggestion, FinancialAssistant};
pub use forms::{BudgetDraft, TransactionDraft};
pub use model_router::{ModelRouter, RouterConfig, TaskConfig, TaskType};
pub use models::{Budget, TaxDetails, Transaction, TransactionType};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use state::{reduce, AppAction, AppState};
pub use store::{bootstrap_tax_details, BootstrapOutcome, Store};
