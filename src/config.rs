//! Configuration types for model requests with structured replies.
//!
//! The extraction pipeline itself needs almost no configuration; everything
//! here governs the *request* layer around it: which provider answers, how
//! often we ask again when the reply is unusable, and how long we wait in
//! between. All knobs live in one [`ExtractConfig`], built via its
//! [`ExtractConfigBuilder`], so a config can be shared across tasks and
//! logged in one line.

use crate::error::{ExtractError, RequestError};
use crate::pipeline::normalize::NormalizeOptions;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Configuration for structured-reply requests.
///
/// # Example
/// ```rust
/// use llm_reply_json::{Backoff, ExtractConfig};
///
/// let config = ExtractConfig::builder()
///     .max_attempts(5)
///     .retry_delay_ms(500)
///     .backoff(Backoff::Exponential)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_attempts, 5);
/// ```
#[derive(Clone)]
pub struct ExtractConfig {
    /// Total attempts per request, first one included. Default: 3.
    ///
    /// Each attempt is a fresh chat call followed by a fresh pipeline run.
    /// Exhausting them is terminal and reported to the caller.
    pub max_attempts: u32,

    /// Base delay between attempts in milliseconds. Default: 2000.
    pub retry_delay_ms: u64,

    /// How the delay grows between attempts. Default: [`Backoff::Fixed`].
    pub backoff: Backoff,

    /// Which pipeline failures trigger another attempt.
    /// Default: [`RetryOn::ParseFailure`].
    pub retry_on: RetryOn,

    /// LLM model identifier. If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Low temperature keeps the model close to the requested JSON layout.
    pub temperature: f32,

    /// Maximum tokens the model may generate per reply. Default: 4096.
    pub max_tokens: usize,

    /// Custom system prompt. If None, uses
    /// [`crate::prompts::DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Per-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Normalization settings (fallback search endpoint).
    pub normalize: NormalizeOptions,

    /// In-flight requests for [`crate::request::request_many`]. Default: 4.
    pub concurrency: usize,

    /// Optional attempt/retry event sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 2000,
            backoff: Backoff::default(),
            retry_on: RetryOn::default(),
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 4096,
            system_prompt: None,
            api_timeout_secs: 60,
            normalize: NormalizeOptions::default(),
            concurrency: 4,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractConfig")
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("backoff", &self.backoff)
            .field("retry_on", &self.retry_on)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("search_base", &self.normalize.search_base.as_str())
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl ExtractConfig {
    /// Create a new builder for `ExtractConfig`.
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder {
            config: Self::default(),
            search_base: None,
        }
    }

    /// Delay before attempt number `attempt` (1-based; attempt 1 has none).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let ms = match self.backoff {
            Backoff::Fixed => self.retry_delay_ms,
            Backoff::Exponential => {
                let factor = 1u64.checked_shl(attempt - 2).unwrap_or(u64::MAX);
                self.retry_delay_ms.saturating_mul(factor)
            }
        };
        Duration::from_millis(ms)
    }
}

/// Builder for [`ExtractConfig`].
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
    search_base: Option<String>,
}

impl fmt::Debug for ExtractConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractConfigBuilder")
            .field("config", &self.config)
            .field("search_base", &self.search_base)
            .finish()
    }
}

impl ExtractConfigBuilder {
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n;
        self
    }

    pub fn retry_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry_delay_ms = ms;
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.config.backoff = backoff;
        self
    }

    pub fn retry_on(mut self, retry_on: RetryOn) -> Self {
        self.config.retry_on = retry_on;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Search endpoint for fallback resource links; validated in [`Self::build`].
    pub fn search_base(mut self, url: impl Into<String>) -> Self {
        self.search_base = Some(url.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ExtractConfig, RequestError> {
        if self.config.max_attempts == 0 {
            return Err(RequestError::InvalidConfig(
                "max_attempts must be ≥ 1".into(),
            ));
        }
        if self.config.api_timeout_secs == 0 {
            return Err(RequestError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if let Some(raw) = self.search_base.take() {
            let url = Url::parse(&raw).map_err(|e| {
                RequestError::InvalidConfig(format!("search base '{raw}' is not a URL: {e}"))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(RequestError::InvalidConfig(format!(
                    "search base '{raw}' must use http or https"
                )));
            }
            self.config.normalize.search_base = url;
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Growth of the delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Backoff {
    /// Same delay before every retry (default).
    #[default]
    Fixed,
    /// Delay doubles after each retry: d, 2d, 4d, …
    Exponential,
}

/// Which pipeline failures are worth another model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RetryOn {
    /// Empty or unparseable replies only (default). A reply with the wrong
    /// fields is returned to the caller immediately.
    #[default]
    ParseFailure,
    /// Every pipeline failure, schema mismatches included.
    AnyPipelineError,
}

impl RetryOn {
    pub fn should_retry(&self, err: &ExtractError) -> bool {
        match self {
            RetryOn::ParseFailure => err.is_retryable(),
            RetryOn::AnyPipelineError => true,
        }
    }
}
