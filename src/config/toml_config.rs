use crate::core::extractor::{ExtractorSettings, DEFAULT_PROMPT_INSTRUCTIONS};
use crate::core::processor::{ProcessorSettings, SinkNames};
use crate::core::retry::RetryPolicy;
use crate::utils::error::{Result, ScraperError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub completion: CompletionConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub sinks: SinksConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub prompt_instructions: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    pub timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub backoff_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinksConfig {
    pub reviewers: Option<String>,
    pub manual_intervention: Option<String>,
    pub dead_letter: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub email_fallback: Option<bool>,
    pub name_fallback: Option<bool>,
    pub max_content_chars: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub output_path: String,
    pub concurrent_messages: Option<usize>,
}

const DEFAULT_USER_AGENT: &str = "profile-scraper/0.1";

impl ScraperConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScraperError::Io)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ScraperError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ScraperError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn prompt_instructions(&self) -> &str {
        self.completion
            .prompt_instructions
            .as_deref()
            .unwrap_or(DEFAULT_PROMPT_INSTRUCTIONS)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion.timeout_seconds.unwrap_or(60))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_seconds.unwrap_or(30))
    }

    pub fn user_agent(&self) -> &str {
        self.fetch.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy::new(
            self.retry.max_attempts.unwrap_or(defaults.max_attempts),
            self.retry
                .backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.backoff),
        )
    }

    pub fn sink_names(&self) -> SinkNames {
        let defaults = SinkNames::default();
        SinkNames {
            reviewers: self.sinks.reviewers.clone().unwrap_or(defaults.reviewers),
            manual_intervention: self
                .sinks
                .manual_intervention
                .clone()
                .unwrap_or(defaults.manual_intervention),
            dead_letter: self.sinks.dead_letter.clone().unwrap_or(defaults.dead_letter),
        }
    }

    pub fn processor_settings(&self) -> ProcessorSettings {
        ProcessorSettings {
            retry: self.retry_policy(),
            sinks: self.sink_names(),
        }
    }

    pub fn extractor_settings(&self) -> ExtractorSettings {
        let defaults = ExtractorSettings::default();
        ExtractorSettings {
            prompt_instructions: self.prompt_instructions().to_string(),
            max_content_chars: self
                .extraction
                .max_content_chars
                .unwrap_or(defaults.max_content_chars),
            email_fallback: self.extraction.email_fallback.unwrap_or(defaults.email_fallback),
            name_fallback: self.extraction.name_fallback.unwrap_or(defaults.name_fallback),
        }
    }

    pub fn output_path(&self) -> &str {
        &self.runtime.output_path
    }

    pub fn concurrent_messages(&self) -> usize {
        self.runtime.concurrent_messages.unwrap_or(4)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("completion.api_url", &self.completion.api_url)?;
        validation::validate_non_empty_string("completion.api_key", &self.completion.api_key)?;
        validation::validate_no_placeholder("completion.api_key", &self.completion.api_key)?;
        validation::validate_non_empty_string("completion.model", &self.completion.model)?;
        validation::validate_path("runtime.output_path", &self.runtime.output_path)?;

        if let Some(attempts) = self.retry.max_attempts {
            validation::validate_range("retry.max_attempts", attempts, 1, 10)?;
        }
        if let Some(backoff) = self.retry.backoff_ms {
            validation::validate_range("retry.backoff_ms", backoff, 0, 60_000)?;
        }
        if let Some(concurrent) = self.runtime.concurrent_messages {
            validation::validate_positive_number("runtime.concurrent_messages", concurrent, 1)?;
        }
        if let Some(max_chars) = self.extraction.max_content_chars {
            validation::validate_positive_number("extraction.max_content_chars", max_chars, 1)?;
        }

        let sinks = self.sink_names();
        for (field, name) in [
            ("sinks.reviewers", &sinks.reviewers),
            ("sinks.manual_intervention", &sinks.manual_intervention),
            ("sinks.dead_letter", &sinks.dead_letter),
        ] {
            validation::validate_non_empty_string(field, name)?;
        }
        if sinks.reviewers == sinks.manual_intervention
            || sinks.reviewers == sinks.dead_letter
            || sinks.manual_intervention == sinks.dead_letter
        {
            return Err(ScraperError::ConfigValidationError {
                field: "sinks".to_string(),
                message: "reviewers, manual_intervention and dead_letter must be distinct".to_string(),
            });
        }

        Ok(())
    }
}

impl Validate for ScraperConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
