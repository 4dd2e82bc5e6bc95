//! Model Router for task-based model selection
//!
//! Routes each AI task to a model and timeout based on configuration.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/verde/config/models.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/models.toml");

/// Task types for model routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    /// Salary to tax breakdown
    TaxEstimation,
    /// Transaction description to category
    Categorization,
    /// Financial assistant, with or without tool calls
    Advice,
}

impl TaskType {
    /// Get the config key for this task type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaxEstimation => "tax_estimation",
            Self::Categorization => "categorization",
            Self::Advice => "advice",
        }
    }

    pub fn all() -> &'static [TaskType] {
        &[Self::TaxEstimation, Self::Categorization, Self::Advice]
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.as_str() == key)
    }
}

/// Configuration for a specific task type
#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    /// Model override; `None` uses the backend's own model
    pub model: Option<String>,
    /// Timeout for API calls
    pub timeout: Duration,
}

/// Router configuration
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Model override for every task without its own
    pub default_model: Option<String>,
    pub default_timeout: Duration,
    pub tasks: HashMap<TaskType, TaskConfig>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_model: None,
            default_timeout: Duration::from_secs(30),
            tasks: HashMap::new(),
        }
    }
}

/// Model Router for task-based model selection
#[derive(Debug, Clone)]
pub struct ModelRouter {
    config: RouterConfig,
    config_path: Option<PathBuf>,
}

impl ModelRouter {
    /// Create a new model router, reading the override file if present
    pub fn new() -> Result<Self> {
        let config = load_config(None)?;
        Ok(Self {
            config,
            config_path: default_config_path(),
        })
    }

    /// Create with a custom config path
    pub fn with_config_path(path: PathBuf) -> Result<Self> {
        let config = load_config(Some(&path))?;
        Ok(Self {
            config,
            config_path: Some(path),
        })
    }

    /// Create with an explicit configuration (for testing)
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            config,
            config_path: None,
        }
    }

    /// Model to use for a task, falling back to `backend_model`
    pub fn model_for_task<'a>(&'a self, task: TaskType, backend_model: &'a str) -> &'a str {
        self.config
            .tasks
            .get(&task)
            .and_then(|c| c.model.as_deref())
            .or(self.config.default_model.as_deref())
            .unwrap_or(backend_model)
    }

    /// Get the full task configuration
    pub fn config_for_task(&self, task: TaskType) -> TaskConfig {
        self.config
            .tasks
            .get(&task)
            .cloned()
            .unwrap_or_else(|| TaskConfig {
                model: self.config.default_model.clone(),
                timeout: self.config.default_timeout,
            })
    }

    pub fn timeout_for_task(&self, task: TaskType) -> Duration {
        self.config
            .tasks
            .get(&task)
            .map(|c| c.timeout)
            .unwrap_or(self.config.default_timeout)
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Get the config path (if using file-based config)
    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }

    /// Reload configuration from disk
    pub fn reload(&mut self) -> Result<()> {
        self.config = load_config(self.config_path.as_ref())?;
        Ok(())
    }
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::new().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Model config unreadable, using built-in defaults");
            Self::with_config(RouterConfig::default())
        })
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("verde").join("config").join("models.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&PathBuf>) -> Result<RouterConfig> {
    let path = override_path.cloned().or_else(default_config_path);

    let content = match path {
        Some(path) if path.exists() => fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?,
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    defaults: Option<RawTaskConfig>,
    models: Option<HashMap<String, RawTaskConfig>>,
}

#[derive(Debug, Deserialize)]
struct RawTaskConfig {
    model: Option<String>,
    timeout_secs: Option<u64>,
}

fn parse_config(content: &str) -> Result<RouterConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = RouterConfig::default();

    if let Some(defaults) = raw.defaults {
        config.default_model = defaults.model;
        if let Some(timeout) = defaults.timeout_secs {
            config.default_timeout = Duration::from_secs(timeout);
        }
    }

    for (task_name, task_config) in raw.models.unwrap_or_default() {
        let Some(task) = TaskType::from_key(&task_name) else {
            tracing::warn!(task = %task_name, "Ignoring unknown task in model config");
            continue;
        };

        config.tasks.insert(
            task,
            TaskConfig {
                model: task_config.model.or_else(|| config.default_model.clone()),
                timeout: task_config
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(config.default_timeout),
            },
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_config() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert!(config.default_model.is_none());
        assert_eq!(config.tasks.len(), 3);
        assert_eq!(
            config.tasks[&TaskType::Advice].timeout,
            Duration::from_secs(90)
        );
    }

    #[test]
    fn test_task_type_as_str() {
        assert_eq!(TaskType::TaxEstimation.as_str(), "tax_estimation");
        assert_eq!(TaskType::from_key("advice"), Some(TaskType::Advice));
        assert_eq!(TaskType::from_key("vision"), None);
    }

    #[test]
    fn test_router_model_selection() {
        let config = parse_config(
            r#"
            [defaults]
            timeout_secs = 20

            [models.categorization]
            model = "gemma3"
            "#,
        )
        .unwrap();
        let router = ModelRouter::with_config(config);

        assert_eq!(
            router.model_for_task(TaskType::Categorization, "gemini-1.5-flash"),
            "gemma3"
        );
        assert_eq!(
            router.model_for_task(TaskType::Advice, "gemini-1.5-flash"),
            "gemini-1.5-flash"
        );
        assert_eq!(
            router.timeout_for_task(TaskType::Categorization),
            Duration::from_secs(20)
        );
    }

    #[test]
    fn test_default_model_applies_to_all_tasks() {
        let config = parse_config("[defaults]\nmodel = \"llama3.2\"\n").unwrap();
        let router = ModelRouter::with_config(config);
        for task in TaskType::all() {
            assert_eq!(router.model_for_task(*task, "other"), "llama3.2");
        }
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(matches!(
            parse_config("[defaults\n"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_config_for_task() {
        let router = ModelRouter::with_config(parse_config(DEFAULT_CONFIG).unwrap());
        let advice = router.config_for_task(TaskType::Advice);
        let category = router.config_for_task(TaskType::Categorization);
        assert!(advice.timeout > category.timeout);
    }

    #[test]
    fn test_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.toml");
        std::fs::write(&path, "[models.advice]\nmodel = \"qwen2.5\"\ntimeout_secs = 5\n").unwrap();

        let router = ModelRouter::with_config_path(path).unwrap();
        assert_eq!(router.model_for_task(TaskType::Advice, "x"), "qwen2.5");
        assert_eq!(
            router.timeout_for_task(TaskType::Advice),
            Duration::from_secs(5)
        );
    }
}
