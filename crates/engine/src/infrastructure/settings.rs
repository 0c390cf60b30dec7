//! Engine configuration from environment variables.
//!
//! Every value has a default; unparsable numbers fall back to it.

use std::path::{Path, PathBuf};

use crate::infrastructure::retry::RetryConfig;
use crate::infrastructure::stage_client::DEFAULT_STAGE_ENDPOINT;

/// Model parameters for one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Clone, PartialEq)]
pub struct EngineSettings {
    pub endpoint: String,
    pub api_key: String,
    pub writer: StageSettings,
    pub analyst: StageSettings,
    pub retry: RetryConfig,
    pub timeout_secs: u64,
    pub stories_dir: PathBuf,
}

impl std::fmt::Debug for EngineSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("writer", &self.writer)
            .field("analyst", &self.analyst)
            .field("retry", &self.retry)
            .field("timeout_secs", &self.timeout_secs)
            .field("stories_dir", &self.stories_dir)
            .finish()
    }
}

const DEFAULT_WRITER_MODEL: &str = "openai/gpt-4o";
const DEFAULT_ANALYST_MODEL: &str = "openai/gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_STORIES_DIR: &str = "stories";

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl EngineSettings {
    /// Load `.env.local` / `.env` from the working directory, then read the
    /// process environment.
    pub fn from_env() -> Self {
        load_dotenv(Path::new("."));
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str, default: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let retry_defaults = RetryConfig::default();

        Self {
            endpoint: text("STAGE_ENDPOINT", DEFAULT_STAGE_ENDPOINT),
            api_key: text("STAGE_API_KEY", ""),
            writer: StageSettings {
                model: text("WRITER_MODEL", DEFAULT_WRITER_MODEL),
                temperature: parse_or(&lookup, "WRITER_TEMPERATURE", 0.8),
                max_tokens: parse_or(&lookup, "WRITER_MAX_TOKENS", 4096),
            },
            analyst: StageSettings {
                model: text("ANALYST_MODEL", DEFAULT_ANALYST_MODEL),
                temperature: parse_or(&lookup, "ANALYST_TEMPERATURE", 0.2),
                max_tokens: parse_or(&lookup, "ANALYST_MAX_TOKENS", 1024),
            },
            retry: RetryConfig {
                max_retries: parse_or(&lookup, "STAGE_MAX_RETRIES", retry_defaults.max_retries),
                base_delay_ms: parse_or(&lookup, "STAGE_RETRY_BASE_DELAY_MS", retry_defaults.base_delay_ms),
            },
            timeout_secs: parse_or(&lookup, "STAGE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            stories_dir: PathBuf::from(text("STORIES_DIR", DEFAULT_STORIES_DIR)),
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, "Unparsable setting, using default");
            default
        }),
        None => default,
    }
}

/// Load env files from `dir`, local overrides first.
pub fn load_dotenv(dir: &Path) {
    for filename in [".env.local", ".env"] {
        let path = dir.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
