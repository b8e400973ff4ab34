use crate::chunking::DEFAULT_CHUNK_MAX_CHARS;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_HF_API_URL: &str = "https://api-inference.huggingface.co/models";
const DEFAULT_HF_MODEL: &str = "facebook/bart-large-cnn";
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const DEFAULT_FRONTEND_DIR: &str = "frontend";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the SummarizePro server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Backend that hosts the summarization model.
    pub summarization_provider: SummarizationProvider,
    /// Model identifier passed to the provider.
    pub summarization_model: String,
    /// Base URL of the Hugging Face inference API (model id is appended).
    pub hf_api_url: String,
    /// Optional bearer token for the Hugging Face inference API.
    pub hf_api_token: Option<String>,
    /// Base URL of the Ollama runtime.
    pub ollama_url: String,
    /// Character budget for a single chunk.
    pub chunk_max_chars: usize,
    /// Whether lines longer than the chunk budget are split.
    pub chunk_split_oversized_lines: bool,
    /// Upper bound on request bodies, uploads included.
    pub max_upload_bytes: usize,
    /// Directory holding the pre-built front-end.
    pub frontend_dir: PathBuf,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Supported summarization backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizationProvider {
    /// Hugging Face inference API or a compatible self-hosted endpoint.
    HuggingFace,
    /// Local Ollama runtime.
    Ollama,
}

impl SummarizationProvider {
    fn default_model(self) -> &'static str {
        match self {
            Self::HuggingFace => DEFAULT_HF_MODEL,
            Self::Ollama => DEFAULT_OLLAMA_MODEL,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let summarization_provider = match load_env_optional("SUMMARIZATION_PROVIDER") {
            Some(value) => value.parse().map_err(|()| {
                ConfigError::InvalidValue("SUMMARIZATION_PROVIDER".to_string())
            })?,
            None => SummarizationProvider::HuggingFace,
        };
        let chunk_max_chars =
            parse_optional("CHUNK_MAX_CHARS")?.unwrap_or(DEFAULT_CHUNK_MAX_CHARS);
        if chunk_max_chars == 0 {
            return Err(ConfigError::InvalidValue("CHUNK_MAX_CHARS".to_string()));
        }

        Ok(Self {
            summarization_provider,
            summarization_model: load_env_optional("SUMMARIZATION_MODEL")
                .unwrap_or_else(|| summarization_provider.default_model().to_string()),
            hf_api_url: load_env_optional("HF_API_URL")
                .unwrap_or_else(|| DEFAULT_HF_API_URL.to_string()),
            hf_api_token: load_env_optional("HF_API_TOKEN"),
            ollama_url: load_env_optional("OLLAMA_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            chunk_max_chars,
            chunk_split_oversized_lines: load_env_optional("CHUNK_SPLIT_OVERSIZED_LINES")
                .map(|value| {
                    parse_bool(&value).ok_or_else(|| {
                        ConfigError::InvalidValue("CHUNK_SPLIT_OVERSIZED_LINES".to_string())
                    })
                })
                .transpose()?
                .unwrap_or(true),
            max_upload_bytes: parse_optional("MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            frontend_dir: load_env_optional("FRONTEND_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FRONTEND_DIR)),
            server_port: parse_optional("SERVER_PORT")?,
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl FromStr for SummarizationProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

/// Merge `.env` from the working directory (when present) into the process environment.
///
/// Runs before tracing is installed, so `RUST_LOG` and `SUMMARIZE_PRO_LOG_FILE` may live there.
/// Variables already set in the environment win.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Read the environment into a validated [`Config`]. Call [`load_dotenv`] first.
pub fn init_config() -> Result<Config, ConfigError> {
    let config = Config::from_env()?;
    tracing::debug!(
        provider = ?config.summarization_provider,
        model = %config.summarization_model,
        chunk_max_chars = config.chunk_max_chars,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    Ok(config)
}

#[cfg(test)]
pub(crate) mod test_env {
    use std::env;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serializes environment mutation across tests and restores touched variables on drop.
    pub(crate) struct EnvGuard {
        saved: Vec<(String, Option<String>)>,
        _lock: MutexGuard<'static, ()>,
    }

    /// Take the lock, then set (`Some`) or unset (`None`) each variable.
    pub(crate) fn lock(vars: &[(&str, Option<&str>)]) -> EnvGuard {
        let lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let saved = vars
            .iter()
            .map(|(key, _)| (key.to_string(), env::var(key).ok()))
            .collect();
        for (key, value) in vars {
            apply(key, *value);
        }
        EnvGuard { saved, _lock: lock }
    }

    fn apply(key: &str, value: Option<&str>) {
        // SAFETY: every test that touches the environment holds ENV_LOCK.
        unsafe {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in &self.saved {
                apply(key, value.as_deref());
            }
        }
    }
}
