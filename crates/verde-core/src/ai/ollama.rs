//! Ollama backend implementation
//!
//! HTTP client for the Ollama API. Uses the model router for task-based
//! model selection and the prompt library for customizable prompts.
//! Structured output is requested by passing the JSON schema of the
//! expected response as `format`.
//!
//! # Configuration
//!
//! Configure routing via `~/.local/share/verde/config/models.toml`:
//!
//! ```toml
//! [models.categorization]
//! model = "gemma3"
//!
//! [models.advice]
//! model = "qwen2.5:14b"
//! timeout_secs = 120
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model_router::{ModelRouter, TaskType};
use crate::models::TaxDetails;
use crate::prompts::{PromptId, PromptLibrary};

use super::parsing::{parse_category_suggestion, parse_financial_advice, parse_tax_details};
use super::types::{
    borrow_vars, CategoryResponse, FinancialAdvice, FinancialAdviceInput, IncomeSource,
};
use super::{category_prompt_vars, render_prompt, tax_prompt_vars, AIBackend, RenderedPrompt};

/// Ollama backend with model router integration
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    router: Arc<ModelRouter>,
    default_model: String,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, default_model: &str) -> Self {
        Self::with_router(
            base_url,
            default_model,
            ModelRouter::default(),
            PromptLibrary::new(),
        )
    }

    /// Create with a custom router and prompt library
    pub fn with_router(
        base_url: &str,
        default_model: &str,
        router: ModelRouter,
        prompts: PromptLibrary,
    ) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            router: Arc::new(router),
            default_model: default_model.to_string(),
            prompts: Arc::new(RwLock::new(prompts)),
        }
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            default_model: model.to_string(),
            ..self.clone()
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&host, &model))
    }

    /// Run one prompt, constraining the output to `T`'s schema
    async fn generate<T: JsonSchema>(&self, task: TaskType, prompt: RenderedPrompt) -> Result<String> {
        let request = OllamaRequest {
            model: self
                .router
                .model_for_task(task, &self.default_model)
                .to_string(),
            prompt: prompt.user,
            system: prompt.system,
            format: serde_json::to_value(schemars::schema_for!(T))?,
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.router.timeout_for_task(task))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, body });
        }

        let ollama_response: OllamaResponse = response.json().await?;
        debug!(
            task = task.as_str(),
            "Ollama response: {}", ollama_response.response
        );
        Ok(ollama_response.response)
    }

    fn render(
        &self,
        id: PromptId,
        vars: &HashMap<&'static str, String>,
    ) -> Result<RenderedPrompt> {
        render_prompt(&self.prompts, id, &borrow_vars(vars))
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// JSON schema the response must follow
    format: serde_json::Value,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn estimate_taxes(&self, annual_salary: f64) -> Result<TaxDetails> {
        let prompt = self.render(PromptId::EstimateTaxes, &tax_prompt_vars(annual_salary))?;
        let text = self
            .generate::<TaxDetails>(TaskType::TaxEstimation, prompt)
            .await?;
        parse_tax_details(&text)
    }

    async fn suggest_category(&self, description: &str) -> Result<String> {
        let prompt = self.render(PromptId::SuggestCategory, &category_prompt_vars(description))?;
        let text = self
            .generate::<CategoryResponse>(TaskType::Categorization, prompt)
            .await?;
        parse_category_suggestion(&text)
    }

    async fn financial_advice(
        &self,
        input: &FinancialAdviceInput,
        income: &IncomeSource,
    ) -> Result<FinancialAdvice> {
        let prompt = self.render(PromptId::FinancialAdvice, &input.prompt_vars(income)?)?;
        let text = self
            .generate::<FinancialAdvice>(TaskType::Advice, prompt)
            .await?;
        parse_financial_advice(&text)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.default_model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_schema() {
        let request = OllamaRequest {
            model: "llama3.2".into(),
            prompt: "hi".into(),
            system: None,
            format: serde_json::to_value(schemars::schema_for!(CategoryResponse)).unwrap(),
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["stream"], false);
        assert!(json["format"]["properties"]
            .get("suggestedCategory")
            .is_some());
    }

    #[test]
    fn test_backend_new_trims_trailing_slash() {
        let backend = OllamaBackend::new("http://localhost:11434/", "llama3.2");
        assert_eq!(backend.host(), "http://localhost:11434");
        assert_eq!(backend.with_model("gemma3").model(), "gemma3");
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let backend = OllamaBackend::new("http://127.0.0.1:9", "llama3.2");
        assert!(!backend.health_check().await);
    }
}
