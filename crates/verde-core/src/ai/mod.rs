//! Pluggable AI backend abstraction
//!
//! The model is a black box: text in, JSON out, fallible, with unbounded
//! latency. Backends turn domain requests into prompts and parse the JSON
//! that comes back; the flows in [`crate::flows`] add validation on top.
//!
//! # Architecture
//!
//! - `AIBackend` trait: defines the interface for all AI operations
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `OllamaBackend`, `MockBackend`
//! - `AnthropicCompatBackend` + `AIOrchestrator`: tool-calling loop used by
//!   the assistant when the model should call the tax tool itself
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (gemini, ollama, mock). Default: gemini
//! - `GEMINI_API_KEY`: API key (required for gemini backend)
//! - `GEMINI_MODEL`: Model name (default: gemini-1.5-flash)
//! - `GEMINI_BASE_URL`: API root (default: https://generativelanguage.googleapis.com)
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)

pub mod anthropic_compat;
mod gemini;
mod mock;
mod ollama;
pub mod orchestrator;
pub mod parsing;
pub mod types;

pub use anthropic_compat::{AnthropicCompatBackend, Message};
pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use orchestrator::{AIOrchestrator, OrchestratorResult, ToolCallRecord};
pub use types::*;

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::TaxDetails;
use crate::prompts::{PromptId, PromptLibrary};

/// Trait defining the interface for all AI backends
///
/// Implementations return what the model said, parsed into the expected
/// shape but otherwise unchecked. Backends should be Send + Sync to allow
/// use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Estimate US taxes for a single filer earning `annual_salary`
    async fn estimate_taxes(&self, annual_salary: f64) -> Result<TaxDetails>;

    /// Suggest a category name for a transaction description
    async fn suggest_category(&self, description: &str) -> Result<String>;

    /// Produce advice with income already resolved
    async fn financial_advice(
        &self,
        input: &FinancialAdviceInput,
        income: &IncomeSource,
    ) -> Result<FinancialAdvice>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Google Gemini (generateContent API)
    Gemini(GeminiBackend),
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `gemini` (default): Uses GEMINI_API_KEY, GEMINI_MODEL, GEMINI_BASE_URL
    /// - `ollama`: Uses OLLAMA_HOST and OLLAMA_MODEL
    /// - `mock`: Deterministic offline backend
    pub fn from_env() -> Result<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "gemini".to_string());

        match backend.to_lowercase().as_str() {
            "gemini" | "google" => GeminiBackend::from_env().map(AIClient::Gemini),
            "ollama" => OllamaBackend::from_env()
                .map(AIClient::Ollama)
                .ok_or_else(|| Error::Config("OLLAMA_HOST is not set".into())),
            "mock" => Ok(AIClient::mock()),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to gemini");
                GeminiBackend::from_env().map(AIClient::Gemini)
            }
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a Gemini backend directly
    pub fn gemini(api_key: &str, model: &str) -> Self {
        AIClient::Gemini(GeminiBackend::new(api_key, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Backend name for display
    pub fn kind(&self) -> &'static str {
        match self {
            AIClient::Gemini(_) => "gemini",
            AIClient::Ollama(_) => "ollama",
            AIClient::Mock(_) => "mock",
        }
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            AIClient::Gemini(b) => AIClient::Gemini(b.with_model(model)),
            AIClient::Ollama(b) => AIClient::Ollama(b.with_model(model)),
            AIClient::Mock(b) => AIClient::Mock(b.with_model(model)),
        }
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn estimate_taxes(&self, annual_salary: f64) -> Result<TaxDetails> {
        match self {
            AIClient::Gemini(b) => b.estimate_taxes(annual_salary).await,
            AIClient::Ollama(b) => b.estimate_taxes(annual_salary).await,
            AIClient::Mock(b) => b.estimate_taxes(annual_salary).await,
        }
    }

    async fn suggest_category(&self, description: &str) -> Result<String> {
        match self {
            AIClient::Gemini(b) => b.suggest_category(description).await,
            AIClient::Ollama(b) => b.suggest_category(description).await,
            AIClient::Mock(b) => b.suggest_category(description).await,
        }
    }

    async fn financial_advice(
        &self,
        input: &FinancialAdviceInput,
        income: &IncomeSource,
    ) -> Result<FinancialAdvice> {
        match self {
            AIClient::Gemini(b) => b.financial_advice(input, income).await,
            AIClient::Ollama(b) => b.financial_advice(input, income).await,
            AIClient::Mock(b) => b.financial_advice(input, income).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Gemini(b) => b.health_check().await,
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.model(),
            AIClient::Ollama(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.host(),
            AIClient::Ollama(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

/// A prompt rendered for one request
pub(crate) struct RenderedPrompt {
    pub system: Option<String>,
    pub user: String,
}

/// Render a prompt from the shared library
///
/// The lock is released before returning, so callers never hold it across
/// an await.
pub(crate) fn render_prompt(
    prompts: &RwLock<PromptLibrary>,
    id: PromptId,
    vars: &HashMap<&str, &str>,
) -> Result<RenderedPrompt> {
    let mut prompts = prompts
        .write()
        .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
    let template = prompts.get(id)?;
    Ok(RenderedPrompt {
        system: template.render_system(vars),
        user: template.render_user(vars),
    })
}

/// Variables for the `suggest_category` prompt
pub(crate) fn category_prompt_vars(description: &str) -> HashMap<&'static str, String> {
    let mut vars = HashMap::new();
    vars.insert("description", description.to_string());
    vars.insert("categories", crate::categories::SUGGESTION_LABELS.join(", "));
    vars
}

/// Variables for the `estimate_taxes` prompt
pub(crate) fn tax_prompt_vars(annual_salary: f64) -> HashMap<&'static str, String> {
    let mut vars = HashMap::new();
    vars.insert("annual_salary", format!("{:.2}", annual_salary));
    vars
}
