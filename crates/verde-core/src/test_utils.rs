//! Test utilities for verde-core
//!
//! A mock LLM server speaking the three wire formats the backends use:
//! Ollama (`/api/generate`, `/api/tags`), Gemini (`generateContent`) and the
//! Messages API (`/v1/messages`). Answers are picked by matching the
//! embedded prompt text, so prompt edits that change those phrases need a
//! matching edit here.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::ai::{AIBackend, MockBackend};
use crate::tax;

/// How the mock server misbehaves
#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    /// Answer every category prompt with this name
    pub category_answer: Option<String>,
    /// Report taxes whose totals do not add up
    pub inconsistent_taxes: bool,
    /// Leave `smartAlerts` out of advice
    pub malformed_advice: bool,
    /// Answer every request with this status and no body
    pub fail_status: Option<u16>,
}

/// A request the server received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub body: Value,
}

struct ServerState {
    behavior: MockBehavior,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ServerState {
    fn record(&self, path: &str, body: &Value) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                path: path.to_string(),
                body: body.clone(),
            });
        }
    }

    fn failure(&self) -> Option<StatusCode> {
        self.behavior
            .fail_status
            .and_then(|s| StatusCode::from_u16(s).ok())
    }
}

/// Mock LLM server for integration tests
pub struct MockLlmServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockLlmServer {
    /// Start a well-behaved server on an available port
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(MockBehavior::default()).await
    }

    pub async fn start_with(behavior: MockBehavior) -> std::io::Result<Self> {
        let state = Arc::new(ServerState {
            behavior,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_ollama_generate))
            .route("/v1/messages", post(handle_messages))
            .route(
                "/v1beta/models/:model",
                get(handle_gemini_model).post(handle_gemini_generate),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await;
        });

        Ok(Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockLlmServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_tags() -> Json<Value> {
    Json(json!({
        "models": [{"name": "llama3.2:latest", "size": 2_000_000_000u64}]
    }))
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
}

async fn handle_ollama_generate(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    state.record("/api/generate", &body);
    if let Some(status) = state.failure() {
        return Err(status);
    }
    let request: GenerateRequest =
        serde_json::from_value(body).map_err(|_| StatusCode::BAD_REQUEST)?;

    let response = answer_prompt(&request.prompt, &state.behavior).await;
    Ok(Json(json!({
        "model": request.model,
        "response": response,
        "done": true
    })))
}

/// Gemini keys travel in a header, never in the URL
fn gemini_authorized(headers: &HeaderMap) -> bool {
    headers
        .get("x-goog-api-key")
        .is_some_and(|key| !key.is_empty())
}

async fn handle_gemini_model(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> StatusCode {
    if !gemini_authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    state.failure().unwrap_or(StatusCode::OK)
}

async fn handle_gemini_generate(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    state.record("generateContent", &body);
    if !gemini_authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if let Some(status) = state.failure() {
        return Err(status);
    }
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .ok_or(StatusCode::BAD_REQUEST)?;

    let response = answer_prompt(prompt, &state.behavior).await;
    Ok(Json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": response}]},
            "finishReason": "STOP"
        }]
    })))
}

/// Messages API: call the tax tool once when a salary is mentioned, then
/// answer with advice
async fn handle_messages(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    state.record("/v1/messages", &body);
    if let Some(status) = state.failure() {
        return Err(status);
    }

    let messages = body["messages"].as_array().cloned().unwrap_or_default();
    let has_tools = body["tools"].as_array().is_some_and(|t| !t.is_empty());
    let tool_results: Vec<&Value> = messages
        .iter()
        .filter_map(|m| m["content"].as_array())
        .flatten()
        .filter(|b| b["type"] == "tool_result")
        .collect();
    let first_prompt = messages
        .first()
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default();

    let content = match (has_tools, tool_results.is_empty(), salary_in(first_prompt)) {
        (true, true, Some(salary)) => json!([
            {"type": "text", "text": "Let me work out your net income."},
            {
                "type": "tool_use",
                "id": "toolu_mock_1",
                "name": "taxCalculatorTool",
                "input": {"annualSalary": salary}
            }
        ]),
        _ => {
            let net_monthly = tool_results
                .iter()
                .filter_map(|b| b["content"].as_str())
                .filter_map(|c| serde_json::from_str::<Value>(c).ok())
                .find_map(|v| v["netMonthlyIncome"].as_f64());
            json!([{"type": "text", "text": advice_json(net_monthly, &state.behavior)}])
        }
    };

    let stop_reason = if content.as_array().is_some_and(|c| c.len() > 1) {
        "tool_use"
    } else {
        "end_turn"
    };

    Ok(Json(json!({
        "id": "msg_mock",
        "type": "message",
        "role": "assistant",
        "model": body["model"],
        "content": content,
        "stop_reason": stop_reason,
        "usage": {"input_tokens": 10, "output_tokens": 10}
    })))
}

/// Pick an answer from the prompt's wording
async fn answer_prompt(prompt: &str, behavior: &MockBehavior) -> String {
    if prompt.contains("calculate the estimated US income taxes") {
        let salary = number_after(prompt, "annual salary of ").unwrap_or(0.0);
        tax_json(salary, behavior)
    } else if let Some(description) = line_after(prompt, "Transaction description: ") {
        let name = match &behavior.category_answer {
            Some(answer) => answer.clone(),
            None => MockBackend::new()
                .suggest_category(description)
                .await
                .unwrap_or_else(|_| "Other".to_string()),
        };
        json!({ "suggestedCategory": name }).to_string()
    } else if prompt.contains("Analyze the user's financial data") {
        advice_json(number_after(prompt, "net monthly income of $"), behavior)
    } else {
        "I'm not sure how to help with that.".to_string()
    }
}

fn tax_json(salary: f64, behavior: &MockBehavior) -> String {
    let mut details = tax::estimate_single_filer(salary);
    if behavior.inconsistent_taxes {
        details.total_estimated_taxes += 1234.0;
        details.net_monthly_income = 0.0;
    }
    serde_json::to_string(&details).unwrap_or_default()
}

fn advice_json(net_monthly: Option<f64>, behavior: &MockBehavior) -> String {
    let savings = match net_monthly {
        Some(net) => format!("You keep about ${:.2} a month; automate a transfer to savings.", net),
        None => "Open a high-yield savings account for your emergency fund.".to_string(),
    };
    let mut advice = json!({
        "expenseRecommendations": ["Cook at home twice more a week to cut Food spending."],
        "investmentSuggestions": [savings, "Put long-term savings in a broad index fund."],
        "smartAlerts": ["Housing is your largest expense this month."]
    });
    if behavior.malformed_advice {
        if let Some(obj) = advice.as_object_mut() {
            obj.remove("smartAlerts");
        }
    }
    advice.to_string()
}

fn salary_in(prompt: &str) -> Option<f64> {
    number_after(prompt, "gross annual salary is $")
}

fn line_after<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let start = text.find(marker)? + marker.len();
    text[start..].lines().next().map(str::trim)
}

fn number_after(text: &str, marker: &str) -> Option<f64> {
    let start = text.find(marker)? + marker.len();
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .filter(|c| *c != ',')
        .collect();
    digits.trim_end_matches('.').parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::OllamaBackend;

    #[tokio::test]
    async fn test_mock_server_health_check() {
        let server = MockLlmServer::start().await.unwrap();
        let client = OllamaBackend::new(&server.url(), "llama3.2");
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_server_records_requests() {
        let server = MockLlmServer::start().await.unwrap();
        let client = OllamaBackend::new(&server.url(), "llama3.2");
        let raw = client.suggest_category("Coffee at Starbucks").await.unwrap();
        assert_eq!(raw, "Food");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/api/generate");
        assert_eq!(requests[0].body["stream"], false);
    }

    #[tokio::test]
    async fn test_mock_server_failure_status() {
        let server = MockLlmServer::start_with(MockBehavior {
            fail_status: Some(503),
            ..Default::default()
        })
        .await
        .unwrap();
        let client = OllamaBackend::new(&server.url(), "llama3.2");
        let err = client.estimate_taxes(60000.0).await.unwrap_err();
        assert!(matches!(err, crate::Error::Api { status: 503, .. }));
    }

    #[test]
    fn test_prompt_helpers() {
        assert_eq!(
            number_after("annual salary of 60000.00 USD", "annual salary of "),
            Some(60000.0)
        );
        assert_eq!(
            salary_in("The user's gross annual salary is $72,500.50. Use"),
            Some(72500.5)
        );
        assert_eq!(
            line_after("Transaction description: Uber ride\nJust", "Transaction description: "),
            Some("Uber ride")
        );
    }
}
