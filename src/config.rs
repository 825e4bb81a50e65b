//! Runtime configuration from environment variables

use crate::character::{Character, CharacterError};
use crate::dialogue::UnresolvedStatePolicy;
use crate::llm::DEFAULT_OLLAMA_BASE_URL;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "llama3.2";
pub const DEFAULT_CHARACTER: &str = "merchant";
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_AUTO_TURNS: usize = 10;
const LOG_JSON_KEY: &str = "NPC_LOG_JSON";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub base_url: String,
    pub model: String,
    pub character: String,
    /// JSON character definition, used instead of `character` when set
    pub character_file: Option<PathBuf>,
    pub state_policy: UnresolvedStatePolicy,
    /// `None` waits for the next chunk indefinitely
    pub idle_timeout: Option<Duration>,
    /// Self-reporting turns per cycle before asking to continue
    pub max_auto_turns: usize,
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            character: DEFAULT_CHARACTER.to_string(),
            character_file: None,
            state_policy: UnresolvedStatePolicy::default(),
            idle_timeout: Some(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS)),
            max_auto_turns: DEFAULT_MAX_AUTO_TURNS,
            log_json: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Whether logs should be JSON; read on its own so logging can be set up
    /// before the rest of the configuration reports invalid values
    pub fn log_json_from_env() -> bool {
        log_json_from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their default
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let idle_timeout = match parse_or_default(
            "NPC_STREAM_IDLE_TIMEOUT_SECS",
            get("NPC_STREAM_IDLE_TIMEOUT_SECS"),
            DEFAULT_IDLE_TIMEOUT_SECS,
        ) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let max_auto_turns = match parse_or_default(
            "NPC_MAX_AUTO_TURNS",
            get("NPC_MAX_AUTO_TURNS"),
            DEFAULT_MAX_AUTO_TURNS,
        ) {
            0 => {
                tracing::warn!(key = "NPC_MAX_AUTO_TURNS", "Must be at least 1, using default");
                DEFAULT_MAX_AUTO_TURNS
            }
            n => n,
        };

        Self {
            base_url: get("OLLAMA_BASE_URL").unwrap_or(defaults.base_url),
            model: get("NPC_MODEL").unwrap_or(defaults.model),
            character: get("NPC_CHARACTER").unwrap_or(defaults.character),
            character_file: get("NPC_CHARACTER_FILE").map(PathBuf::from),
            state_policy: parse_or_default(
                "NPC_STATE_POLICY",
                get("NPC_STATE_POLICY"),
                defaults.state_policy,
            ),
            idle_timeout,
            max_auto_turns,
            log_json: log_json_from_lookup(&lookup),
        }
    }

    /// Load the configured character, preferring the definition file
    pub fn load_character(&self) -> Result<Character, CharacterError> {
        match &self.character_file {
            Some(path) => Character::from_file(path),
            None => Character::builtin(&self.character),
        }
    }
}

fn parse_or_default<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = value else {
        return default;
    };
    match value.parse() {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(key, value = %value, error = %e, "Invalid configuration value, using default");
            default
        }
    }
}

fn log_json_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> bool {
    lookup(LOG_JSON_KEY).is_some_and(|v| is_truthy(v.trim()))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
