//! AI Orchestrator for tool-calling advice
//!
//! Runs the Messages API loop: the model gets the prompt plus tools, any
//! tool it asks for is executed against an [`AIBackend`], results go back as
//! `tool_result` blocks, and the loop repeats until the model answers in
//! text or `max_iterations` is reached.
//!
//! ```text
//!   1. Send prompt + tools
//!   2. If the response has tool calls:
//!      a. Execute each tool
//!      b. Send results back
//!      c. Repeat until end_turn or max_iterations
//!   3. Return final text
//! ```

use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model_router::{ModelRouter, TaskType};
use crate::tools;

use super::anthropic_compat::{
    AnthropicCompatBackend, ContentBlock, Message, MessagesResponse, Tool,
};
use super::AIBackend;

const FUNCTION_PATTERN: &str = r"(?s)<function=([^>]+)>(.*?)</function>";
const PARAMETER_PATTERN: &str = r"<parameter=([^>]+)>([^<]*)</parameter>";

/// Parsed tool call from XML-style output
#[derive(Debug, Clone)]
struct ParsedToolCall {
    name: String,
    params: serde_json::Value,
}

/// Record of a tool call made during orchestration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub name: String,
    pub input: serde_json::Value,
    pub success: bool,
    /// Output or error message
    pub output: Option<String>,
}

/// Result of an orchestrator execution including tool call history
#[derive(Debug, Clone)]
pub struct OrchestratorResult {
    pub response: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub iterations: usize,
}

/// Tool-calling loop over a Messages-compatible backend
#[derive(Clone)]
pub struct AIOrchestrator {
    backend: AnthropicCompatBackend,
    max_iterations: usize,
}

impl AIOrchestrator {
    pub fn new(backend: AnthropicCompatBackend) -> Self {
        Self {
            backend,
            max_iterations: 5,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Create from environment (`ANTHROPIC_COMPATIBLE_*`), using the advice
    /// timeout from the model router
    pub fn from_env() -> Option<Self> {
        let timeout: Duration = ModelRouter::default().timeout_for_task(TaskType::Advice);
        AnthropicCompatBackend::from_env().map(|backend| Self::new(backend.with_timeout(timeout)))
    }

    pub fn backend(&self) -> &AnthropicCompatBackend {
        &self.backend
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Run the loop, executing tools against `ai`
    pub async fn execute(
        &self,
        ai: &dyn AIBackend,
        system_prompt: Option<&str>,
        user_message: &str,
        available_tools: &[Tool],
    ) -> Result<OrchestratorResult> {
        let mut messages = vec![Message::user(user_message)];
        let mut tool_calls: Vec<ToolCallRecord> = Vec::new();

        info!(
            model = %self.backend.model(),
            tools = available_tools.len(),
            "Starting orchestrator execution"
        );

        for iteration in 0..self.max_iterations {
            debug!(iteration, "Orchestrator iteration");

            let response = self
                .backend
                .messages(system_prompt, messages.clone(), Some(available_tools))
                .await?;

            let tool_uses = response.tool_uses();

            // Some models emit XML tool calls with stop_reason "end_turn"
            let xml_tool_calls = if tool_uses.is_empty() {
                match response.text() {
                    Some(text) => Self::parse_xml_tool_calls(&text)?,
                    None => Vec::new(),
                }
            } else {
                Vec::new()
            };

            if tool_uses.is_empty() && xml_tool_calls.is_empty() {
                info!(iteration, "Orchestrator complete (no tool calls)");
                return Ok(OrchestratorResult {
                    response: Self::extract_text(&response)?,
                    tool_calls,
                    iterations: iteration + 1,
                });
            }

            if !tool_uses.is_empty() {
                debug!(iteration, tool_count = tool_uses.len(), "Executing tool calls");
                messages.push(Message::assistant_blocks(response.content.clone()));

                let mut tool_results = Vec::new();
                for (id, name, input) in tool_uses {
                    let record = Self::run_tool(ai, name, input).await;
                    tool_results.push(if record.success {
                        ContentBlock::tool_result(id, record.output.clone().unwrap_or_default())
                    } else {
                        ContentBlock::tool_error(id, record.output.clone().unwrap_or_default())
                    });
                    tool_calls.push(record);
                }
                messages.push(Message::tool_results(tool_results));
            } else {
                info!(
                    iteration,
                    count = xml_tool_calls.len(),
                    "Executing XML-style tool calls"
                );

                let preamble = match response.text() {
                    Some(text) => Self::strip_xml_tool_calls(&text)?,
                    None => String::new(),
                };
                if !preamble.is_empty() {
                    messages.push(Message::assistant(preamble));
                }

                let mut tool_outputs = Vec::new();
                for (i, call) in xml_tool_calls.iter().enumerate() {
                    let record = Self::run_tool(ai, &call.name, &call.params).await;
                    let output = record.output.clone().unwrap_or_default();
                    tool_outputs.push(if record.success {
                        format!("Tool {} ({}) result:\n{}", i + 1, call.name, output)
                    } else {
                        format!("Tool {} ({}) error: {}", i + 1, call.name, output)
                    });
                    tool_calls.push(record);
                }

                messages.push(Message::user(format!(
                    "Here are the results from the tools you requested:\n\n{}",
                    tool_outputs.join("\n\n")
                )));
            }
        }

        warn!(
            max_iterations = self.max_iterations,
            "Orchestrator hit max iterations"
        );
        Err(Error::InvalidData(format!(
            "Max iterations ({}) reached without completion",
            self.max_iterations
        )))
    }

    /// Execute one tool call; failures become error records, never `Err`
    async fn run_tool(ai: &dyn AIBackend, name: &str, input: &serde_json::Value) -> ToolCallRecord {
        debug!(tool = name, "Executing tool");
        let result = match name {
            tools::TAX_CALCULATOR_TOOL => tools::execute_tax_tool(ai, input).await,
            _ => Err(Error::InvalidData(format!("Unknown tool: {}", name))),
        };

        match result {
            Ok(output) => {
                debug!(tool = name, output_len = output.len(), "Tool succeeded");
                ToolCallRecord {
                    name: name.to_string(),
                    input: input.clone(),
                    success: true,
                    output: Some(output),
                }
            }
            Err(e) => {
                warn!(tool = name, error = %e, "Tool failed");
                ToolCallRecord {
                    name: name.to_string(),
                    input: input.clone(),
                    success: false,
                    output: Some(e.to_string()),
                }
            }
        }
    }

    fn extract_text(response: &MessagesResponse) -> Result<String> {
        response
            .text()
            .ok_or_else(|| Error::InvalidData("No text in response".into()))
    }

    /// Parse XML-style tool calls from text output
    ///
    /// ```text
    /// <function=taxCalculatorTool>
    /// <parameter=annualSalary>60000</parameter>
    /// </function>
    /// ```
    fn parse_xml_tool_calls(text: &str) -> Result<Vec<ParsedToolCall>> {
        let function_re = compile(FUNCTION_PATTERN)?;
        let param_re = compile(PARAMETER_PATTERN)?;

        let calls = function_re
            .captures_iter(text)
            .map(|func_cap| {
                let mut params = serde_json::Map::new();
                for param_cap in param_re.captures_iter(&func_cap[2]) {
                    params.insert(
                        param_cap[1].trim().to_string(),
                        scalar_value(param_cap[2].trim()),
                    );
                }
                ParsedToolCall {
                    name: func_cap[1].trim().to_string(),
                    params: serde_json::Value::Object(params),
                }
            })
            .collect();

        Ok(calls)
    }

    /// Text content without XML tool calls
    fn strip_xml_tool_calls(text: &str) -> Result<String> {
        let without_calls = compile(FUNCTION_PATTERN)?.replace_all(text, "");
        let cleanup_re = compile(r"(?i)</?\s*tool_?call\s*>")?;
        Ok(cleanup_re
            .replace_all(&without_calls, "")
            .trim()
            .to_string())
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::InvalidData(format!("Bad pattern: {}", e)))
}

/// Number, bool, or string, in that order
fn scalar_value(value: &str) -> serde_json::Value {
    if let Ok(n) = value.parse::<i64>() {
        serde_json::Value::Number(n.into())
    } else if let Some(n) = value
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
    {
        serde_json::Value::Number(n)
    } else if let Ok(b) = value.parse::<bool>() {
        serde_json::Value::Bool(b)
    } else {
        serde_json::Value::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;

    fn orchestrator() -> AIOrchestrator {
        AIOrchestrator::new(AnthropicCompatBackend::new(
            "http://localhost:11434",
            "test-model",
        ))
    }

    #[test]
    fn test_orchestrator_defaults() {
        let orchestrator = orchestrator();
        assert_eq!(orchestrator.model(), "test-model");
        assert_eq!(orchestrator.max_iterations(), 5);
        assert_eq!(orchestrator.with_max_iterations(2).max_iterations(), 2);
    }

    #[test]
    fn test_parse_xml_tool_calls() {
        let text = "Let me check.\n<function=taxCalculatorTool>\n\
                    <parameter=annualSalary>60000</parameter>\n</function>";
        let calls = AIOrchestrator::parse_xml_tool_calls(text).unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "taxCalculatorTool");
        assert_eq!(calls[0].params["annualSalary"], 60000);

        let stripped = AIOrchestrator::strip_xml_tool_calls(&format!("{}</tool_call>", text)).unwrap();
        assert_eq!(stripped, "Let me check.");
    }

    #[test]
    fn test_scalar_value() {
        assert_eq!(scalar_value("42"), serde_json::json!(42));
        assert_eq!(scalar_value("4315.5"), serde_json::json!(4315.5));
        assert_eq!(scalar_value("true"), serde_json::json!(true));
        assert_eq!(scalar_value("USD"), serde_json::json!("USD"));
    }

    #[tokio::test]
    async fn test_run_tool_records_outcomes() {
        let mock = MockBackend::new();

        let ok = AIOrchestrator::run_tool(
            &mock,
            "taxCalculatorTool",
            &serde_json::json!({"annualSalary": 60000}),
        )
        .await;
        assert!(ok.success);
        assert!(ok.output.unwrap().contains("netMonthlyIncome"));

        let unknown = AIOrchestrator::run_tool(&mock, "get_weather", &serde_json::json!({})).await;
        assert!(!unknown.success);
        assert!(unknown.output.unwrap().contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_error() {
        let orchestrator = AIOrchestrator::new(AnthropicCompatBackend::new(
            "http://127.0.0.1:9",
            "test-model",
        ));
        let result = orchestrator
            .execute(&MockBackend::new(), None, "hi", &tools::advice_tools())
            .await;
        assert!(matches!(result, Err(Error::Http(_))));
    }
}
