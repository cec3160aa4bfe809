//! Runtime configuration loader.

use crate::error::RuntimeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use webpilot_core::{AutonomyLevel, Viewport};
use webpilot_executor::DispatchSettings;
use webpilot_policy::GuardrailProfile;
use webpilot_providers::OpenAICompatibleProvider;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key, if the endpoint needs one.
    pub api_key_env: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub inference: InferenceConfig,
    /// Guardrail document; built-in profiles are used when unset.
    pub guardrails_path: Option<PathBuf>,
    pub profile: String,
    pub autonomy_default: Option<AutonomyLevel>,
    pub pacing_ms: u64,
    pub shell_timeout_ms: u64,
    pub max_context_elements: usize,
    pub fallback_viewport: Viewport,
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inference: InferenceConfig::default(),
            guardrails_path: None,
            profile: "conservative".to_string(),
            autonomy_default: None,
            pacing_ms: 250,
            shell_timeout_ms: 30_000,
            max_context_elements: 50,
            fallback_viewport: Viewport::FALLBACK,
            log_level: "info".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.profile.trim().is_empty() {
            return Err(RuntimeError::ConfigError("profile must not be empty".to_string()));
        }
        if self.inference.model.trim().is_empty() {
            return Err(RuntimeError::ConfigError(
                "inference.model must not be empty".to_string(),
            ));
        }
        if self.max_context_elements == 0 {
            return Err(RuntimeError::ConfigError(
                "max_context_elements must be greater than zero".to_string(),
            ));
        }
        if self.fallback_viewport.width == 0 || self.fallback_viewport.height == 0 {
            return Err(RuntimeError::ConfigError(
                "fallback_viewport must have a non-zero size".to_string(),
            ));
        }
        if self.shell_timeout_ms == 0 {
            return Err(RuntimeError::ConfigError(
                "shell_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Dispatcher settings for a run under `profile`.
    pub fn dispatch_settings(&self, profile: &GuardrailProfile) -> DispatchSettings {
        DispatchSettings {
            min_interval: Duration::from_millis(self.pacing_ms),
            require_origin_confirmation: profile.require_origin_confirmation,
            shell_timeout: Duration::from_millis(self.shell_timeout_ms),
            ..DispatchSettings::default()
        }
    }

    pub fn api_key(&self) -> Option<String> {
        self.inference
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn build_provider(&self) -> OpenAICompatibleProvider {
        OpenAICompatibleProvider::with_timeout(
            self.inference.endpoint.clone(),
            self.api_key(),
            Duration::from_secs(self.inference.timeout_secs),
        )
        .with_max_retries(self.inference.max_retries)
    }
}

/// Load runtime configuration from a YAML file.
///
/// # Errors
/// Returns `ConfigError` if the file is missing, empty or invalid.
pub fn load_runtime_config<P: AsRef<Path>>(config_path: P) -> Result<RuntimeConfig, RuntimeError> {
    let config_file = config_path.as_ref();

    if !config_file.exists() {
        return Err(RuntimeError::ConfigError(format!(
            "Config file not found: {}",
            config_file.display()
        )));
    }

    let content = std::fs::read_to_string(config_file)?;

    if content.trim().is_empty() {
        return Err(RuntimeError::ConfigError("Config file is empty".to_string()));
    }

    let mut config: RuntimeConfig = serde_yaml::from_str(&content)
        .map_err(|e| RuntimeError::ConfigError(format!("Invalid YAML: {}", e)))?;

    // Relative guardrail paths resolve against the config file's directory.
    if let Some(path) = config.guardrails_path.as_mut() {
        if path.is_relative() {
            if let Some(parent) = config_file.parent() {
                *path = parent.join(&*path);
            }
        }
    }

    config.validate()?;
    Ok(config)
}
