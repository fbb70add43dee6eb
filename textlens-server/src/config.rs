//! Process configuration, read once at startup.

use std::str::FromStr;
use std::time::Duration;

use textlens_core::AdmissionConfig;

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid admission limits: {0}")]
    Admission(#[from] textlens_core::ConfigError),
}

/// LLM backend settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Ollama-compatible base URL
    pub base_url: String,

    /// Model used for both summary and metadata calls
    pub model: String,

    /// Optional bearer token for hosted backends
    pub api_key: Option<String>,

    /// Upper bound for each individual LLM call
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Settings for the analysis orchestrator
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Texts with fewer words skip the summary call and are their own summary
    pub min_summary_words: usize,

    /// Length of the keyword list
    pub max_keywords: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_summary_words: 20,
            max_keywords: 5,
        }
    }
}

/// Full service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to listen on
    pub port: u16,

    /// SQLite connection string
    pub database_url: String,

    /// Longest accepted `/analyze` text, in characters
    pub max_text_chars: usize,

    pub llm: LlmConfig,
    pub analysis: AnalysisConfig,
    pub admission: AdmissionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            database_url: "sqlite://textlens.db".to_string(),
            max_text_chars: 10_000,
            llm: LlmConfig::default(),
            analysis: AnalysisConfig::default(),
            admission: AdmissionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Create config from environment variables.
    ///
    /// Environment variables:
    /// - `TEXTLENS_PORT`: listen port (default: 8000)
    /// - `TEXTLENS_DATABASE_URL`: SQLite URL (default: sqlite://textlens.db)
    /// - `OLLAMA_HOST` / `OLLAMA_URL`: LLM backend (default: http://localhost:11434)
    /// - `TEXTLENS_MODEL`: model name (default: llama3.2:3b)
    /// - `TEXTLENS_LLM_API_KEY`: bearer token (default: none)
    /// - `TEXTLENS_LLM_TIMEOUT_SECS`: per-call timeout (default: 30)
    /// - `TEXTLENS_MAX_CONCURRENT`: concurrent analyses, at least 1 (default: 4)
    /// - `TEXTLENS_MAX_QUEUE`: waiting analyses, 0 disables queueing (default: 16)
    /// - `TEXTLENS_MAX_TEXT_CHARS`: longest accepted text (default: 10000)
    /// - `TEXTLENS_MIN_SUMMARY_WORDS`: short-input threshold (default: 20)
    /// - `TEXTLENS_MAX_KEYWORDS`: keyword list length (default: 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build config from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let llm = LlmConfig {
            base_url: lookup("OLLAMA_HOST")
                .or_else(|| lookup("OLLAMA_URL"))
                .unwrap_or(defaults.llm.base_url),
            model: lookup("TEXTLENS_MODEL").unwrap_or(defaults.llm.model),
            api_key: lookup("TEXTLENS_LLM_API_KEY").filter(|k| !k.is_empty()),
            timeout: parse_var::<u64>(&lookup, "TEXTLENS_LLM_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.llm.timeout),
        };
        if llm.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                var: "TEXTLENS_LLM_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "timeout must be positive".to_string(),
            });
        }

        let admission = AdmissionConfig::new(
            parse_var(&lookup, "TEXTLENS_MAX_CONCURRENT")?
                .unwrap_or(defaults.admission.max_concurrent()),
            parse_var(&lookup, "TEXTLENS_MAX_QUEUE")?
                .unwrap_or(defaults.admission.max_queue_size()),
        )?;

        let analysis = AnalysisConfig {
            min_summary_words: parse_var(&lookup, "TEXTLENS_MIN_SUMMARY_WORDS")?
                .unwrap_or(defaults.analysis.min_summary_words),
            max_keywords: parse_var(&lookup, "TEXTLENS_MAX_KEYWORDS")?
                .unwrap_or(defaults.analysis.max_keywords),
        };

        Ok(Self {
            port: parse_var(&lookup, "TEXTLENS_PORT")?.unwrap_or(defaults.port),
            database_url: lookup("TEXTLENS_DATABASE_URL").unwrap_or(defaults.database_url),
            max_text_chars: parse_var(&lookup, "TEXTLENS_MAX_TEXT_CHARS")?
                .unwrap_or(defaults.max_text_chars),
            llm,
            analysis,
            admission,
        })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    let parsed = value.trim().parse::<T>();
    match parsed {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => Err(ConfigError::InvalidValue {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
