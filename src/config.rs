use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";
const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 120;
const DEFAULT_DOCUMENT_DIR: &str = "uploaded_pdfs";
const DEFAULT_SUMMARY_DIR: &str = "summary_results";
const DEFAULT_PROMPT_TEMPLATE_PATH: &str = "prompt.txt";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_MAX_TEXT_BYTES: usize = 64 * 1024 * 1024;
const DEFAULT_LOG_FILE: &str = "logs/summarist.log";
const LOG_FILE_DISABLED: &str = "off";
const DEFAULT_SERVER_PORT: u16 = 8000;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Summarist server.
///
/// Built once at process start and handed to the components that need it; nothing reads the
/// environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for the completion service.
    pub openai_api_key: String,
    /// Base URL of the OpenAI-compatible completion API.
    pub openai_base_url: String,
    /// Model identifier sent with every completion request.
    pub completion_model: String,
    /// Upper bound on a single completion call.
    pub completion_timeout: Duration,
    /// Directory holding uploaded documents named by content digest.
    pub document_dir: PathBuf,
    /// Directory holding cached summary records.
    pub summary_dir: PathBuf,
    /// Location of the prompt template resource.
    pub prompt_template_path: PathBuf,
    /// Largest multipart upload accepted by the HTTP surface.
    pub max_upload_bytes: usize,
    /// Largest JSON body accepted by the summarize endpoint.
    pub max_text_bytes: usize,
    /// Append-only log file; `None` when file logging is switched off.
    pub log_file: Option<PathBuf>,
    /// Port the HTTP server binds to.
    pub server_port: u16,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            openai_api_key: load_env_optional("OPENAI_API_KEY")
                .ok_or_else(|| ConfigError::MissingVariable("OPENAI_API_KEY".to_string()))?,
            openai_base_url: load_env_optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            completion_model: load_env_optional("COMPLETION_MODEL")
                .unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string()),
            completion_timeout: Duration::from_secs(
                parse_optional("COMPLETION_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_COMPLETION_TIMEOUT_SECS),
            ),
            document_dir: load_env_optional("DOCUMENT_DIR")
                .unwrap_or_else(|| DEFAULT_DOCUMENT_DIR.to_string())
                .into(),
            summary_dir: load_env_optional("SUMMARY_DIR")
                .unwrap_or_else(|| DEFAULT_SUMMARY_DIR.to_string())
                .into(),
            prompt_template_path: load_env_optional("PROMPT_TEMPLATE_PATH")
                .unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE_PATH.to_string())
                .into(),
            max_upload_bytes: parse_optional("MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            max_text_bytes: parse_optional("MAX_TEXT_BYTES")?.unwrap_or(DEFAULT_MAX_TEXT_BYTES),
            log_file: match load_env_optional("SUMMARIST_LOG_FILE") {
                Some(value) if value.trim().eq_ignore_ascii_case(LOG_FILE_DISABLED) => None,
                Some(value) => Some(PathBuf::from(value)),
                None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
            },
            server_port: parse_optional("SERVER_PORT")?.unwrap_or(DEFAULT_SERVER_PORT),
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Load `.env` (when present) and build the configuration from the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    Config::from_env()
}
