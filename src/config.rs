use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::validation::DEFAULT_FIELD_CEILING;

pub const DEFAULT_CONFIG_PATH: &str = "ax-architect.yaml";

/// Service configuration: defaults, then an optional YAML file, then
/// environment overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub narrative: NarrativeConfig,
    pub ideas: IdeasConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Ceiling applied to each business-area field.
    pub max_field_chars: usize,
    /// Refuse to start without a gateway credential.
    pub require_credential: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            max_field_chars: DEFAULT_FIELD_CEILING,
            require_credential: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Extra attempts after a 429. Zero means a rate limit is final.
    pub rate_limit_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ai.gateway.lovable.dev/v1/chat/completions".to_string(),
            model: "google/gemini-2.5-flash".to_string(),
            api_key: None,
            timeout_secs: 60,
            rate_limit_retries: 0,
            retry_base_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeOutput {
    /// Markdown string as produced.
    #[default]
    Raw,
    /// Markdown plus the regex-split sections.
    Sections,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    pub output: NarrativeOutput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdeasConfig {
    /// Check tool arguments against the schema and require one idea per
    /// category.
    pub enforce_schema: bool,
}

impl Default for IdeasConfig {
    fn default() -> Self {
        Self {
            enforce_schema: true,
        }
    }
}

impl Config {
    /// Load `.env`, the YAML file named by `AX_CONFIG_PATH` (or
    /// `ax-architect.yaml` when present), then apply environment overrides.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::info!("Loaded .env from {}", path.display());
        }

        let explicit = std::env::var("AX_CONFIG_PATH").ok();
        let path = explicit
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&path).exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {path}"))?;
            let config = Self::from_yaml(&contents)
                .with_context(|| format!("failed to parse config file {path}"))?;
            tracing::info!("Loaded configuration from {}", path);
            config
        } else if explicit.is_some() {
            return Err(anyhow!("config file {path} does not exist"));
        } else {
            tracing::debug!("No config file, using defaults");
            Config::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Apply `AX_*` / `LOVABLE_API_KEY` overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("LOVABLE_API_KEY") {
            self.gateway.api_key = Some(key);
        }
        if let Some(url) = lookup("AX_GATEWAY_URL") {
            self.gateway.base_url = url;
        }
        if let Some(model) = lookup("AX_MODEL") {
            self.gateway.model = model;
        }
        if let Some(bind) = lookup("AX_BIND") {
            self.server.bind = bind;
        }
        if let Some(v) = lookup("AX_REQUEST_TIMEOUT_SECS") {
            self.gateway.timeout_secs = parse_var("AX_REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("AX_RATE_LIMIT_RETRIES") {
            self.gateway.rate_limit_retries = parse_var("AX_RATE_LIMIT_RETRIES", &v)?;
        }
        if let Some(v) = lookup("AX_MAX_FIELD_CHARS") {
            self.server.max_field_chars = parse_var("AX_MAX_FIELD_CHARS", &v)?;
        }
        if let Some(v) = lookup("AX_REQUIRE_CREDENTIAL") {
            self.server.require_credential = parse_var("AX_REQUIRE_CREDENTIAL", &v)?;
        }
        if let Some(v) = lookup("AX_ENFORCE_IDEA_SCHEMA") {
            self.ideas.enforce_schema = parse_var("AX_ENFORCE_IDEA_SCHEMA", &v)?;
        }
        if let Some(v) = lookup("AX_NARRATIVE_OUTPUT") {
            self.narrative.output = match v.trim().to_ascii_lowercase().as_str() {
                "raw" => NarrativeOutput::Raw,
                "sections" => NarrativeOutput::Sections,
                other => {
                    return Err(anyhow!(
                        "AX_NARRATIVE_OUTPUT must be raw or sections, got {other}"
                    ))
                }
            };
        }
        Ok(())
    }

    pub fn has_credential(&self) -> bool {
        self.gateway
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| anyhow!("invalid value for {name}: {value:?} ({e})"))
}
