//! # Configuration
//!
//! Built once at startup and passed by reference afterwards. Layering, each
//! step overriding the previous one field by field:
//!
//! 1. `Config::default()`
//! 2. the JSON config file (`ai_config.json` unless told otherwise); any
//!    field, nested ones included, may be left out
//! 3. environment variables (a `.env` file in the working directory is
//!    loaded first):
//!    - `TERMAI_API_KEY`, falling back to `DEEPINFRA_API_KEY` then `OPENROUTER_API`
//!    - `TERMAI_BASE_URL`, `TERMAI_MODEL`
//!    - `TERMAI_EXECUTION`: `confirm` or `auto`

use crate::error::{self, Error, Result};
use crate::exec::ShellExecutor;
use crate::provider::ProviderConfig;
use crate::transcript::DEFAULT_CONTEXT_WINDOW;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "ai_config.json";

/// Environment variables searched for the API key, in order
pub const API_KEY_VARS: &[&str] = &["TERMAI_API_KEY", "DEEPINFRA_API_KEY", "OPENROUTER_API"];

/// Placeholder shipped in the default self-updater URL
pub const PLACEHOLDER_REPO_URL: &str = "https://github.com/your/repo/raw/main/";

/// Whether model-suggested commands run straight away
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPolicy {
    /// Ask on the terminal before each command
    #[default]
    Confirm,
    /// Run without asking
    Auto,
}

impl std::str::FromStr for ExecutionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "confirm" => Ok(Self::Confirm),
            "auto" => Ok(Self::Auto),
            other => Err(Error::config_invalid(format!(
                "unknown execution policy '{}', expected 'confirm' or 'auto'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Only read from the file or environment; never written back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    /// Upper bound on every model call
    pub timeout_secs: u64,
    /// Transcript entries included as context
    pub context_window: usize,
    pub execution: ExecutionPolicy,
    pub shell: String,
    pub max_output_chars: usize,
    /// Append OS / cwd / time details to the system instruction
    pub include_system_context: bool,
    /// Replaces the built-in system instruction when set
    pub system_prompt: Option<String>,
    pub headers: HashMap<String, String>,
    pub features: Features,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.deepinfra.com/v1/openai".to_string(),
            model: "deepseek-ai/DeepSeek-V3-0324".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            timeout_secs: 30,
            context_window: DEFAULT_CONTEXT_WINDOW,
            execution: ExecutionPolicy::Confirm,
            shell: "sh".to_string(),
            max_output_chars: 20_000,
            include_system_context: false,
            system_prompt: None,
            headers: HashMap::new(),
            features: Features::default(),
        }
    }
}

// ============================================================================
// Feature flags for `!` commands
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub command_suggest: Toggle,
    pub package_manager: PackageManagerFeature,
    pub task_scheduler: TaskSchedulerFeature,
    pub self_updater: SelfUpdaterFeature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Toggle {
    pub enabled: bool,
}

impl Default for Toggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageManagerFeature {
    pub enabled: bool,
    /// Ask before `!pkg remove`
    pub confirm_destructive: bool,
}

impl Default for PackageManagerFeature {
    fn default() -> Self {
        Self {
            enabled: true,
            confirm_destructive: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSchedulerFeature {
    pub enabled: bool,
    pub cron_dir: PathBuf,
}

impl Default for TaskSchedulerFeature {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            enabled: true,
            cron_dir: home.join(".cronjobs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfUpdaterFeature {
    pub enabled: bool,
    pub repo_url: String,
}

impl Default for SelfUpdaterFeature {
    fn default() -> Self {
        Self {
            enabled: false,
            repo_url: PLACEHOLDER_REPO_URL.to_string(),
        }
    }
}

impl SelfUpdaterFeature {
    pub fn has_placeholder_url(&self) -> bool {
        self.repo_url.trim().is_empty()
            || self.repo_url.contains("your/repo")
            || self.repo_url.contains("YOUR_OFFICIAL_REPO")
    }
}

// ============================================================================
// Loading
// ============================================================================

impl Config {
    /// Load `.env`, then the config file at `path`, then the process environment
    pub fn load(path: &Path) -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(env_path) => debug!(path = %env_path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(error::config_unreadable(".env", e.to_string()).set_source(e)),
        }
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Same layering as [`Config::load`] with an explicit variable lookup
    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::from_file(path)?;
        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Defaults overlaid with the file's fields; a missing file means defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(error::config_unreadable(path.display().to_string(), e.to_string())
                    .set_source(e))
            }
        };

        let config: Config = serde_json::from_str(&content).map_err(|e| {
            error::config_unreadable(path.display().to_string(), e.to_string()).set_source(e)
        })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = API_KEY_VARS.iter().find_map(|var| non_empty(*var)) {
            self.api_key = Some(key);
        }
        if let Some(url) = non_empty("TERMAI_BASE_URL") {
            self.base_url = url;
        }
        if let Some(model) = non_empty("TERMAI_MODEL") {
            self.model = model;
        }
        if let Some(policy) = non_empty("TERMAI_EXECUTION") {
            self.execution = policy.parse()?;
        }
        Ok(())
    }

    /// The API key, or the startup-fatal configuration error
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::credential_missing(API_KEY_VARS).with_operation("config::require_api_key")
            })
    }

    pub fn provider_config(&self) -> Result<ProviderConfig> {
        let key = self.require_api_key()?;
        let mut provider = ProviderConfig::deepinfra(key)
            .with_base_url(&self.base_url)
            .with_model(&self.model)
            .with_timeout(self.timeout_secs);
        provider.headers = self.headers.clone();
        Ok(provider)
    }

    pub fn executor(&self) -> ShellExecutor {
        ShellExecutor::new(&self.shell, self.max_output_chars)
    }
}
