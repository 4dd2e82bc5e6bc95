//! Prompt library
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/verde/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Each prompt file carries YAML frontmatter (`id`, `version`, `task_type`)
//! followed by `# System` and `# User` sections.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const ESTIMATE_TAXES: &str = include_str!("../../../prompts/estimate_taxes.md");
    pub const SUGGEST_CATEGORY: &str = include_str!("../../../prompts/suggest_category.md");
    pub const FINANCIAL_ADVICE: &str = include_str!("../../../prompts/financial_advice.md");
    pub const FINANCIAL_ADVICE_AGENT: &str =
        include_str!("../../../prompts/financial_advice_agent.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    EstimateTaxes,
    SuggestCategory,
    /// Advice with income already resolved
    FinancialAdvice,
    /// Advice where the model may call the tax tool itself
    FinancialAdviceAgent,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EstimateTaxes => "estimate_taxes",
            Self::SuggestCategory => "suggest_category",
            Self::FinancialAdvice => "financial_advice",
            Self::FinancialAdviceAgent => "financial_advice_agent",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[
            Self::EstimateTaxes,
            Self::SuggestCategory,
            Self::FinancialAdvice,
            Self::FinancialAdviceAgent,
        ]
    }

    /// Look up a prompt by its string identifier
    pub fn parse(id: &str) -> Option<Self> {
        Self::all().iter().copied().find(|p| p.as_str() == id)
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::EstimateTaxes => defaults::ESTIMATE_TAXES,
            Self::SuggestCategory => defaults::SUGGEST_CATEGORY,
            Self::FinancialAdvice => defaults::FINANCIAL_ADVICE,
            Self::FinancialAdviceAgent => defaults::FINANCIAL_ADVICE_AGENT,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    /// Version number for tracking changes
    pub version: u32,
    /// Task type for model routing (tax_estimation, categorization, advice)
    pub task_type: String,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// The prompt content (system + user sections)
    pub content: String,
    pub is_override: bool,
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    pub fn system_section(&self) -> Option<&str> {
        extract_section(&self.content, "# System")
    }

    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render the whole prompt with template variables replaced
    pub fn render(&self, vars: &HashMap<&str, &str>) -> String {
        render_template(&self.content, vars)
    }

    /// Render just the system section, if there is one
    pub fn render_system(&self, vars: &HashMap<&str, &str>) -> Option<String> {
        self.system_section().map(|s| render_template(s, vars))
    }

    /// Render just the user section, or the whole prompt when it has none
    pub fn render_user(&self, vars: &HashMap<&str, &str>) -> String {
        match self.user_section() {
            Some(user) => render_template(user, vars),
            None => self.render(vars),
        }
    }
}

/// Prompt library for loading and caching prompts
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a new prompt library with default paths
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    /// Get a prompt by ID, loading from override or default
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if let std::collections::hash_map::Entry::Vacant(entry) = self.cache.entry(id) {
            let prompt = Self::load(self.override_dir.as_ref(), id)?;
            entry.insert(prompt);
        }
        self.cache
            .get(&id)
            .ok_or_else(|| Error::InvalidData(format!("Prompt {} not loaded", id.as_str())))
    }

    fn load(override_dir: Option<&PathBuf>, id: PromptId) -> Result<Prompt> {
        if let Some(dir) = override_dir {
            let override_path = dir.join(format!("{}.md", id.as_str()));
            if override_path.exists() {
                let content = fs::read_to_string(&override_path).map_err(|e| {
                    Error::InvalidData(format!("Failed to read prompt override: {}", e))
                })?;
                let (metadata, body) = parse_prompt(&content)?;
                return Ok(Prompt {
                    metadata,
                    content: body,
                    is_override: true,
                    override_path: Some(override_path),
                });
            }
        }

        let (metadata, body) = parse_prompt(id.default_content())?;
        Ok(Prompt {
            metadata,
            content: body,
            is_override: false,
            override_path: None,
        })
    }

    /// List all prompts with their override status
    pub fn list(&mut self) -> Vec<PromptInfo> {
        PromptId::all()
            .iter()
            .map(|&id| {
                let override_path = self.override_path(id);
                let prompt = self.get(id).ok();
                PromptInfo {
                    id: id.as_str().to_string(),
                    version: prompt.map(|p| p.metadata.version).unwrap_or(0),
                    task_type: prompt
                        .map(|p| p.metadata.task_type.clone())
                        .unwrap_or_default(),
                    has_override: override_path.is_some(),
                    override_path,
                }
            })
            .collect()
    }

    /// Path of the override file for a prompt, if one exists
    pub fn override_path(&self, id: PromptId) -> Option<PathBuf> {
        self.override_dir
            .as_ref()
            .map(|d| d.join(format!("{}.md", id.as_str())))
            .filter(|p| p.exists())
    }

    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }

    /// Clear the cache (useful after editing override files)
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Information about a prompt for listing
#[derive(Debug, Clone)]
pub struct PromptInfo {
    pub id: String,
    pub version: u32,
    pub task_type: String,
    pub has_override: bool,
    pub override_path: Option<PathBuf>,
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("verde").join("prompts").join("overrides"))
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    if !content.starts_with("---") {
        return Err(Error::InvalidData(
            "Prompt must start with YAML frontmatter (---)".into(),
        ));
    }

    let rest = &content[3..];
    let end = rest.find("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];

    // Runs to the next top-level header
    let end = after_header.find("\n# ").unwrap_or(after_header.len());

    Some(after_header[..end].trim())
}

/// Resolve conditionals, then substitute `{{var}}` placeholders
///
/// Substitution is a single left-to-right pass over the template, so
/// substituted values (often JSON or user text) are never scanned for
/// markers. Unknown placeholders are left as written.
fn render_template(template: &str, vars: &HashMap<&str, &str>) -> String {
    let resolved = resolve_conditionals(template, vars);
    let mut result = String::with_capacity(resolved.len());
    let mut rest = resolved.as_str();

    while let Some(open) = rest.find("{{") {
        result.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            rest = &rest[open..];
            break;
        };
        match vars.get(after_open[..close].trim()) {
            Some(value) => result.push_str(value),
            None => result.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &after_open[close + 2..];
    }
    result.push_str(rest);
    result
}

/// Expand `{{#if var}}...{{else}}...{{/if}}` blocks
///
/// A variable counts as set when present and non-empty. Blocks do not nest.
fn resolve_conditionals(content: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = content.to_string();

    while let Some(if_start) = result.find("{{#if ") {
        let var_start = if_start + 6;
        let Some(var_end) = result[var_start..].find("}}") else {
            break;
        };
        let var_name = result[var_start..var_start + var_end].trim();
        let block_start = var_start + var_end + 2;

        let Some(endif_pos) = result[block_start..].find("{{/if}}") else {
            break;
        };
        let block = &result[block_start..block_start + endif_pos];
        let full_end = block_start + endif_pos + 7;

        let (then_part, else_part) = match block.find("{{else}}") {
            Some(pos) => (&block[..pos], &block[pos + 8..]),
            None => (block, ""),
        };

        let is_set = vars.get(var_name).is_some_and(|v| !v.is_empty());
        let kept = if is_set { then_part } else { else_part };

        result = format!("{}{}{}", &result[..if_start], kept, &result[full_end..]);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prompt() {
        let content = r#"---
id: test_prompt
version: 1
task_type: categorization
---

# System
Test system prompt.

# User
Test user prompt with {{variable}}.
"#;

        let (metadata, body) = parse_prompt(content).unwrap();
        assert_eq!(metadata.id, "test_prompt");
        assert_eq!(metadata.version, 1);
        assert_eq!(metadata.task_type, "categorization");
        assert!(body.contains("# System"));
        assert!(body.contains("# User"));
    }

    #[test]
    fn test_parse_prompt_requires_frontmatter() {
        assert!(parse_prompt("# User\nhello").is_err());
        assert!(parse_prompt("---\nid: x\n# User").is_err());
    }

    #[test]
    fn test_extract_section() {
        let content = r#"# System
System content here.

# User
User content here."#;

        assert_eq!(
            extract_section(content, "# System"),
            Some("System content here.")
        );
        assert_eq!(
            extract_section(content, "# User"),
            Some("User content here.")
        );
    }

    #[test]
    fn test_conditional_blocks() {
        let content = "Start{{#if salary}}\nSalary: {{salary}}{{/if}}\nEnd";

        let mut vars = HashMap::new();
        vars.insert("salary", "60000");
        let result = render_template(content, &vars);
        assert!(result.contains("Salary: 60000"));

        let empty_vars: HashMap<&str, &str> = HashMap::new();
        let result = render_template(content, &empty_vars);
        assert!(!result.contains("Salary:"));
        assert!(result.contains("Start"));
        assert!(result.contains("End"));
    }

    #[test]
    fn test_else_branch() {
        let content = "{{#if salary}}Net {{salary}}{{else}}From transactions{{/if}}.";

        let mut vars = HashMap::new();
        vars.insert("salary", "");
        assert_eq!(render_template(content, &vars), "From transactions.");

        vars.insert("salary", "4350");
        assert_eq!(render_template(content, &vars), "Net 4350.");
    }

    #[test]
    fn test_json_values_not_treated_as_markers() {
        let content = "Data: {{json}}";
        let mut vars = HashMap::new();
        vars.insert("json", r#"[{"category":{"name":"Food"}}]"#);
        assert_eq!(
            render_template(content, &vars),
            r#"Data: [{"category":{"name":"Food"}}]"#
        );
    }

    #[test]
    fn test_placeholders_in_values_stay_literal() {
        let content = "Transactions: {{transactions}}\nBudgets: {{budgets}}";
        // Fresh maps get fresh hash seeds, so iteration order varies
        for _ in 0..20 {
            let mut vars = HashMap::new();
            vars.insert("transactions", r#"[{"description":"Pay {{budgets}} now"}]"#);
            vars.insert("budgets", "[]");
            assert_eq!(
                render_template(content, &vars),
                "Transactions: [{\"description\":\"Pay {{budgets}} now\"}]\nBudgets: []"
            );
        }
    }

    #[test]
    fn test_unknown_placeholder_left_as_written() {
        let vars = HashMap::from([("a", "1")]);
        assert_eq!(render_template("{{a}} {{b}} {{", &vars), "1 {{b}} {{");
    }

    #[test]
    fn test_prompt_library_embedded() {
        let mut lib = PromptLibrary::embedded_only();

        for id in PromptId::all() {
            let prompt = lib.get(*id).unwrap();
            assert!(!prompt.is_override);
            assert!(prompt.user_section().is_some());
        }
    }

    #[test]
    fn test_prompt_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("suggest_category.md"),
            "---\nid: suggest_category\nversion: 7\ntask_type: categorization\n---\n# User\nPick one for {{description}}",
        )
        .unwrap();

        let mut lib = PromptLibrary::with_override_dir(dir.path().to_path_buf());
        let prompt = lib.get(PromptId::SuggestCategory).unwrap();
        assert!(prompt.is_override);
        assert_eq!(prompt.metadata.version, 7);

        let mut vars = HashMap::new();
        vars.insert("description", "Coffee");
        assert_eq!(prompt.render_user(&vars), "Pick one for Coffee");

        let infos = lib.list();
        let info = infos.iter().find(|i| i.id == "suggest_category").unwrap();
        assert!(info.has_override);
        let other = infos.iter().find(|i| i.id == "estimate_taxes").unwrap();
        assert!(!other.has_override);
    }

    #[test]
    fn test_prompt_id_parse() {
        assert_eq!(
            PromptId::parse("financial_advice"),
            Some(PromptId::FinancialAdvice)
        );
        assert_eq!(PromptId::parse("classify_merchant"), None);
    }

    #[test]
    fn test_default_prompts_parse() {
        for id in PromptId::all() {
            let result = parse_prompt(id.default_content());
            assert!(
                result.is_ok(),
                "Failed to parse {}: {:?}",
                id.as_str(),
                result.err()
            );

            let (metadata, _) = result.unwrap();
            assert_eq!(metadata.id, id.as_str(), "Prompt ID mismatch");
        }
    }
}
