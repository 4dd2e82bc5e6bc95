//! Gemini backend implementation
//!
//! HTTP client for Google's `generateContent` API. Requests ask for a JSON
//! response (`responseMimeType`), and the text of the first candidate is
//! parsed with the shared helpers in [`super::parsing`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model_router::{ModelRouter, TaskType};
use crate::models::TaxDetails;
use crate::prompts::{PromptId, PromptLibrary};

use super::parsing::{parse_category_suggestion, parse_financial_advice, parse_tax_details};
use super::types::{borrow_vars, FinancialAdvice, FinancialAdviceInput, IncomeSource};
use super::{category_prompt_vars, render_prompt, tax_prompt_vars, AIBackend, RenderedPrompt};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini backend with model router integration
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
    default_model: String,
    router: Arc<ModelRouter>,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl GeminiBackend {
    pub fn new(api_key: &str, default_model: &str) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, default_model)
    }

    /// Point at a different API root (proxies, test servers)
    pub fn with_base_url(base_url: &str, api_key: &str, default_model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            default_model: default_model.to_string(),
            router: Arc::new(ModelRouter::default()),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Create with a custom router and prompt library
    pub fn with_router(self, router: ModelRouter, prompts: PromptLibrary) -> Self {
        Self {
            router: Arc::new(router),
            prompts: Arc::new(RwLock::new(prompts)),
            ..self
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
    ///
    /// Fails with `Error::Config` when `GEMINI_API_KEY` is missing.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("GEMINI_API_KEY is not set".into()))?;
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self::with_base_url(&base_url, &api_key, &model))
    }

    /// Send one prompt and return the text of the first candidate
    async fn generate(&self, task: TaskType, prompt: RenderedPrompt) -> Result<String> {
        let model = self.router.model_for_task(task, &self.default_model);
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        let request = GeminiRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![Part { text: prompt.user }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                response_mime_type: "application/json",
            },
            system_instruction: prompt.system.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
        };

        info!(model = %model, task = task.as_str(), "Calling Gemini API");

        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.router.timeout_for_task(task))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, body });
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let text = gemini_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| Error::InvalidData("Empty response from Gemini".into()))?;

        debug!("Gemini response: {}", text);
        Ok(text)
    }

    fn render(
        &self,
        id: PromptId,
        vars: &HashMap<&'static str, String>,
    ) -> Result<RenderedPrompt> {
        render_prompt(&self.prompts, id, &borrow_vars(vars))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[async_trait]
impl AIBackend for GeminiBackend {
    async fn estimate_taxes(&self, annual_salary: f64) -> Result<TaxDetails> {
        let prompt = self.render(PromptId::EstimateTaxes, &tax_prompt_vars(annual_salary))?;
        let text = self.generate(TaskType::TaxEstimation, prompt).await?;
        parse_tax_details(&text)
    }

    async fn suggest_category(&self, description: &str) -> Result<String> {
        let prompt = self.render(PromptId::SuggestCategory, &category_prompt_vars(description))?;
        let text = self.generate(TaskType::Categorization, prompt).await?;
        parse_category_suggestion(&text)
    }

    async fn financial_advice(
        &self,
        input: &FinancialAdviceInput,
        income: &IncomeSource,
    ) -> Result<FinancialAdvice> {
        let prompt = self.render(PromptId::FinancialAdvice, &input.prompt_vars(income)?)?;
        let text = self.generate(TaskType::Advice, prompt).await?;
        parse_financial_advice(&text)
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/v1beta/models/{}", self.base_url, self.default_model);
        match self
            .http_client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
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
    fn test_request_serialization() {
        let request = GeminiRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![Part {
                    text: "Estimate taxes".to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                response_mime_type: "application/json",
            },
            system_instruction: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Estimate taxes");
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"suggestedCategory\": \"Food\"}"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10}
        }"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        let text = &response.candidates[0].content.as_ref().unwrap().parts[0].text;
        assert_eq!(parse_category_suggestion(text).unwrap(), "Food");
    }

    #[test]
    fn test_backend_new_trims_trailing_slash() {
        let backend = GeminiBackend::with_base_url("http://localhost:8080/", "key", "gemini-pro");
        assert_eq!(backend.host(), "http://localhost:8080");
        assert_eq!(backend.model(), "gemini-pro");
        assert_eq!(backend.with_model("other").model(), "other");
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let backend =
            GeminiBackend::with_base_url("http://127.0.0.1:9", "SECRET-KEY-123", "gemini-pro");
        let err = crate::flows::estimate_taxes(&backend, 60000.0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)));
        assert!(!err.to_string().contains("SECRET-KEY-123"));
        assert!(!format!("{:?}", err).contains("SECRET-KEY-123"));
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let backend = GeminiBackend::with_base_url("http://127.0.0.1:9", "key", "gemini-pro");
        assert!(!backend.health_check().await);
    }
}
