//! Startup configuration.
//!
//! Settings come from `config/default.toml` (optional) and are then
//! overridden by environment variables.  Everything is validated once; a
//! validation failure is the only fatal error after the process starts.
//!
//! | Variable | Overrides |
//! |---|---|
//! | `DISCORD_TOKEN` | Discord bot token |
//! | `HF_TOKEN` / `QUIPSTER_API_KEY` | inference credential |
//! | `HF_MODEL` / `QUIPSTER_MODEL` | `[inference] model` |
//! | `QUIPSTER_PROVIDER` | `[inference] provider` |
//! | `QUIPSTER_API_BASE_URL` | `[inference] base_url` |
//! | `PORT` | `[web] port` |
//! | `COOLDOWN_SECS` | `[bot] cooldown_secs` |

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{debug, info};

use quipster_agent::{
    CooldownGate, DEFAULT_FALLBACK_MODELS, DEFAULT_MODEL, DEFAULT_PERSONA, DEFAULT_STYLE,
    InferenceClient, InferenceConfig, Notices, PromptBuilder, Provider, ReplyOrchestrator,
    SamplingParams, Sanitizer, SanitizerConfig,
};
use quipster_web::WebConfig;

use crate::helpers::{clean_value, env_non_empty};

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// `[bot]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotSection {
    /// Minimum seconds between accepted requests from one guild.
    pub cooldown_secs: f64,
    /// Reject banned input before calling the model.
    pub filter_input: bool,
    pub persona: Option<String>,
    pub style: Option<String>,
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            cooldown_secs: 3.5,
            filter_input: true,
            persona: None,
            style: None,
        }
    }
}

/// `[inference]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceSection {
    pub provider: Provider,
    pub model: String,
    /// Defaults to the provider's public endpoint.
    pub base_url: Option<String>,
    /// Defaults to the built-in chain for Hugging Face, empty otherwise.
    pub fallback_models: Option<Vec<String>>,
    pub timeout_secs: u64,
    #[serde(flatten)]
    pub sampling: SamplingParams,
}

impl Default for InferenceSection {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: DEFAULT_MODEL.to_owned(),
            base_url: None,
            fallback_models: None,
            timeout_secs: 75,
            sampling: SamplingParams::default(),
        }
    }
}

/// `[web]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSection {
    pub bind: String,
    pub port: u16,
}

impl Default for WebSection {
    fn default() -> Self {
        let web = WebConfig::default();
        Self {
            bind: web.bind_addr,
            port: web.port,
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// All runtime settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bot: BotSection,
    pub inference: InferenceSection,
    pub filter: SanitizerConfig,
    pub messages: Notices,
    pub web: WebSection,
    /// Only ever read from the environment.
    #[serde(skip)]
    pub discord_token: Option<String>,
    /// Only ever read from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Settings {
    /// Load settings from `path` (skipped if the file does not exist) and
    /// apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let parsed = Self::from_toml(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            info!(path = %path.display(), "configuration loaded");
            parsed
        } else {
            debug!(path = %path.display(), "no configuration file, using defaults");
            Self::default()
        };

        settings.apply_env(env_non_empty)?;
        Ok(settings)
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| lookup(*name))
                .map(|v| clean_value(&v))
                .filter(|v| !v.is_empty())
        };

        if let Some(token) = first(&["DISCORD_TOKEN"]) {
            self.discord_token = Some(token);
        }
        if let Some(key) = first(&["HF_TOKEN", "QUIPSTER_API_KEY"]) {
            self.api_key = Some(key);
        }
        if let Some(model) = first(&["HF_MODEL", "QUIPSTER_MODEL"]) {
            self.inference.model = model;
        }
        if let Some(provider) = first(&["QUIPSTER_PROVIDER"]) {
            self.inference.provider = provider.parse()?;
        }
        if let Some(url) = first(&["QUIPSTER_API_BASE_URL"]) {
            self.inference.base_url = Some(url);
        }
        if let Some(port) = first(&["PORT"]) {
            self.web.port = port
                .parse()
                .with_context(|| format!("PORT is not a valid port: {port}"))?;
        }
        if let Some(secs) = first(&["COOLDOWN_SECS"]) {
            self.bot.cooldown_secs = secs
                .parse()
                .with_context(|| format!("COOLDOWN_SECS is not a number: {secs}"))?;
        }
        Ok(())
    }

    /// Check everything the requested subcommand needs.
    pub fn validate(&self, require_discord: bool) -> Result<()> {
        if require_discord && self.discord_token.is_none() {
            bail!("DISCORD_TOKEN missing");
        }

        let Some(key) = self.api_key.as_deref() else {
            bail!("HF_TOKEN (or QUIPSTER_API_KEY) missing");
        };
        if self.inference.provider == Provider::HuggingFace && !key.starts_with("hf_") {
            bail!("HF_TOKEN invalid (must start with hf_)");
        }

        let base_url = self.base_url();
        let parsed = url::Url::parse(&base_url)
            .with_context(|| format!("invalid inference base URL: {base_url}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("inference base URL must be http(s): {base_url}");
        }

        if !self.bot.cooldown_secs.is_finite() || self.bot.cooldown_secs < 0.0 {
            bail!("cooldown_secs must be a non-negative number");
        }
        if self.inference.timeout_secs == 0 {
            bail!("timeout_secs must be positive");
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    /// Effective inference base URL.
    pub fn base_url(&self) -> String {
        self.inference
            .base_url
            .clone()
            .unwrap_or_else(|| self.inference.provider.default_base_url().to_owned())
    }

    /// Effective fallback chain.
    pub fn fallback_models(&self) -> Vec<String> {
        match (&self.inference.fallback_models, self.inference.provider) {
            (Some(models), _) => models.clone(),
            (None, Provider::HuggingFace) => DEFAULT_FALLBACK_MODELS
                .iter()
                .map(|m| (*m).to_owned())
                .collect(),
            (None, Provider::OpenAi) => Vec::new(),
        }
    }

    pub fn inference_config(&self) -> InferenceConfig {
        InferenceConfig {
            provider: self.inference.provider,
            api_key: self.api_key.clone().unwrap_or_default(),
            base_url: self.base_url(),
            model: self.inference.model.clone(),
            fallback_models: self.fallback_models(),
            timeout: Duration::from_secs(self.inference.timeout_secs),
        }
    }

    pub fn build_client(&self) -> Result<InferenceClient> {
        let client = InferenceClient::new(self.inference_config())
            .context("failed to create inference client")?;
        info!(
            provider = %client.provider(),
            model = %client.model(),
            candidates = client.candidates().len(),
            url = %client.endpoint_for(client.model()),
            "inference client ready"
        );
        Ok(client)
    }

    pub fn build_orchestrator(&self, client: InferenceClient) -> Result<ReplyOrchestrator> {
        let sanitizer =
            Sanitizer::from_config(&self.filter).context("invalid [filter] configuration")?;
        let prompts = PromptBuilder::new(
            self.bot.persona.as_deref().unwrap_or(DEFAULT_PERSONA),
            self.bot.style.as_deref().unwrap_or(DEFAULT_STYLE),
            self.inference.sampling,
        );
        let window = Duration::try_from_secs_f64(self.bot.cooldown_secs)
            .context("cooldown_secs must be a non-negative number")?;
        let gate = CooldownGate::new(window);

        Ok(ReplyOrchestrator::new(client, sanitizer)
            .with_gate(gate)
            .with_prompts(prompts)
            .with_notices(self.messages.clone())
            .with_input_filter(self.bot.filter_input))
    }

    pub fn web_config(&self) -> WebConfig {
        WebConfig {
            bind_addr: self.web.bind.clone(),
            port: self.web.port,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
