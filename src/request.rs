//! Model interaction: send a prompt, extract the reply, ask again if needed.
//!
//! The pipeline in [`crate::extract`] never talks to a model. This module is
//! the only place that does, through the [`ChatSession`] seam: production code
//! uses [`ProviderSession`] (an `edgequake-llm` provider plus a system
//! prompt), tests script their own replies.
//!
//! ## Retry Strategy
//!
//! Each attempt is a fresh chat call followed by a fresh pipeline run.
//! Whether a failure earns another attempt is decided by
//! [`crate::config::RetryOn`] for reply errors and by
//! [`RequestError::is_transient`] for transport errors. Attempts are bounded
//! by `max_attempts`; with the defaults (3 attempts, 2000 ms fixed delay) a
//! hopeless prompt costs at most 3 calls and 4 s of waiting.

use crate::config::ExtractConfig;
use crate::error::RequestError;
use crate::extract::extract_with;
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use crate::schema::ReplySchema;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Default model when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// One raw model reply plus its token accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

impl ChatReply {
    /// A reply without token counts.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Anything that can answer a prompt with text.
pub trait ChatSession: Send + Sync {
    fn send_message(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<ChatReply, RequestError>> + Send;
}

/// [`ChatSession`] backed by an `edgequake-llm` provider.
///
/// Every message is sent as a two-turn conversation: the system prompt, then
/// the user prompt. No history is kept between calls, so a retry never sees
/// the reply that failed.
pub struct ProviderSession {
    provider: Arc<dyn LLMProvider>,
    label: String,
    options: CompletionOptions,
    system_prompt: String,
}

impl std::fmt::Debug for ProviderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSession")
            .field("provider", &self.label)
            .field("system_prompt_len", &self.system_prompt.len())
            .finish()
    }
}

impl ProviderSession {
    /// Wrap an already-built provider.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ExtractConfig) -> Self {
        Self::labelled(provider, "custom", config)
    }

    /// Resolve the provider from `config` and the environment.
    pub fn from_config(config: &ExtractConfig) -> Result<Self, RequestError> {
        let (provider, label) = resolve_provider(config)?;
        debug!("Using LLM provider '{}'", label);
        Ok(Self::labelled(provider, &label, config))
    }

    fn labelled(provider: Arc<dyn LLMProvider>, label: &str, config: &ExtractConfig) -> Self {
        Self {
            provider,
            label: label.to_string(),
            options: build_options(config),
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}

impl ChatSession for ProviderSession {
    async fn send_message(&self, prompt: &str) -> Result<ChatReply, RequestError> {
        let messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(prompt),
        ];
        match self.provider.chat(&messages, Some(&self.options)).await {
            Ok(response) => Ok(ChatReply {
                text: response.content,
                prompt_tokens: response.prompt_tokens,
                completion_tokens: response.completion_tokens,
            }),
            Err(e) => Err(classify_provider_error(&self.label, e.to_string())),
        }
    }
}

/// 401/403-style failures will not improve on retry; everything else might.
fn classify_provider_error(provider: &str, message: String) -> RequestError {
    let lower = message.to_lowercase();
    let auth = ["401", "403", "unauthorized", "forbidden", "invalid api key", "authentication"]
        .iter()
        .any(|needle| lower.contains(needle));
    if auth {
        RequestError::AuthError {
            provider: provider.to_string(),
            detail: message,
        }
    } else {
        RequestError::LlmApiError { message }
    }
}

fn build_options(config: &ExtractConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

// ── Provider resolution ──────────────────────────────────────────────────

const AUTO_DETECT_HINT: &str = "Nothing in the config or the environment names a provider. \
Pass a provider name (reply2json --provider), export EDGEQUAKE_LLM_PROVIDER together with \
EDGEQUAKE_MODEL, or export an API key such as OPENAI_API_KEY or ANTHROPIC_API_KEY.";

/// A provider requested by name, not yet built.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NamedProvider {
    name: String,
    model: String,
}

impl NamedProvider {
    fn build(&self) -> Result<Arc<dyn LLMProvider>, RequestError> {
        ProviderFactory::create_llm_provider(&self.name, &self.model).map_err(|e| {
            RequestError::ProviderNotConfigured {
                provider: self.name.clone(),
                hint: format!("could not build model '{}': {e}", self.model),
            }
        })
    }
}

/// The provider `config` or the environment asks for by name.
///
/// `config.provider_name` comes first, then the `EDGEQUAKE_LLM_PROVIDER` /
/// `EDGEQUAKE_MODEL` pair (ignored unless both are set), then OpenAI when an
/// `OPENAI_API_KEY` is present. Outside the environment pair the model is
/// `config.model` or [`DEFAULT_MODEL`]. Blank variables count as unset.
fn named_provider(
    config: &ExtractConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Option<NamedProvider> {
    let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());
    let configured_model = || {
        config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    };

    if let Some(name) = &config.provider_name {
        return Some(NamedProvider {
            name: name.clone(),
            model: configured_model(),
        });
    }
    if let (Some(name), Some(model)) = (var("EDGEQUAKE_LLM_PROVIDER"), var("EDGEQUAKE_MODEL")) {
        return Some(NamedProvider { name, model });
    }
    var("OPENAI_API_KEY").map(|_| NamedProvider {
        name: "openai".to_string(),
        model: configured_model(),
    })
}

/// Provider for `config` plus a label for logs. A prebuilt
/// `config.provider` is used as-is; with no name anywhere,
/// [`ProviderFactory::from_env`] picks whatever credentials it finds.
fn resolve_provider(
    config: &ExtractConfig,
) -> Result<(Arc<dyn LLMProvider>, String), RequestError> {
    if let Some(provider) = &config.provider {
        return Ok((Arc::clone(provider), "custom".to_string()));
    }

    if let Some(named) = named_provider(config, |key| std::env::var(key).ok()) {
        debug!("Building provider '{}' with model '{}'", named.name, named.model);
        let provider = named.build()?;
        return Ok((provider, named.name));
    }

    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| RequestError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!("{AUTO_DETECT_HINT}\n({e})"),
        })?;
    Ok((provider, "auto".to_string()))
}

// ── Requests ─────────────────────────────────────────────────────────────

/// A successful request and what it cost.
#[derive(Debug, Clone)]
pub struct RequestOutcome<T> {
    pub value: T,
    /// Attempt that succeeded (1-based).
    pub attempts: u32,
    pub duration_ms: u64,
    /// Token totals across every attempt, failed ones included.
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// Send `prompt` and extract a `T` from the reply, retrying per `config`.
///
/// # Errors
/// - [`RequestError::Extract`] when a reply fails in a way the retry policy
///   does not retry (a schema mismatch, by default)
/// - [`RequestError::AuthError`] / [`RequestError::ProviderNotConfigured`]
///   immediately, without retrying
/// - [`RequestError::RetriesExhausted`] when every attempt failed
pub async fn request<T, S>(
    session: &S,
    prompt: &str,
    config: &ExtractConfig,
) -> Result<RequestOutcome<T>, RequestError>
where
    T: ReplySchema,
    S: ChatSession,
{
    let start = Instant::now();
    let max = config.max_attempts.max(1);
    let call_timeout = Duration::from_secs(config.api_timeout_secs);
    let cb = config.progress_callback.as_ref();
    let mut prompt_tokens = 0;
    let mut completion_tokens = 0;
    let mut last_err: Option<RequestError> = None;

    for attempt in 1..=max {
        if let Some(cb) = cb {
            cb.on_attempt_start(attempt, max);
        }

        let result = match timeout(call_timeout, session.send_message(prompt)).await {
            Ok(Ok(reply)) => {
                prompt_tokens += reply.prompt_tokens;
                completion_tokens += reply.completion_tokens;
                debug!(
                    "'{}' attempt {}: {} input tokens, {} output tokens",
                    T::DESCRIPTOR.name,
                    attempt,
                    reply.prompt_tokens,
                    reply.completion_tokens
                );
                match extract_with::<T>(&reply.text, &config.normalize) {
                    Ok(value) => Ok(value),
                    Err(e) if config.retry_on.should_retry(&e) => Err(RequestError::Extract(e)),
                    Err(e) => {
                        debug!("raw reply was: {}", e.raw_reply());
                        if let Some(cb) = cb {
                            cb.on_gave_up(attempt, &e.to_string());
                        }
                        return Err(RequestError::Extract(e));
                    }
                }
            }
            Ok(Err(e)) if e.is_transient() => Err(e),
            Ok(Err(e)) => {
                if let Some(cb) = cb {
                    cb.on_gave_up(attempt, &e.to_string());
                }
                return Err(e);
            }
            Err(_) => Err(RequestError::ApiTimeout {
                secs: config.api_timeout_secs,
            }),
        };

        match result {
            Ok(value) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                info!(
                    "'{}' reply accepted on attempt {}/{} in {}ms",
                    T::DESCRIPTOR.name,
                    attempt,
                    max,
                    duration_ms
                );
                if let Some(cb) = cb {
                    cb.on_success(attempt);
                }
                return Ok(RequestOutcome {
                    value,
                    attempts: attempt,
                    duration_ms,
                    prompt_tokens,
                    completion_tokens,
                });
            }
            Err(e) => {
                let message = e.to_string();
                warn!(
                    "'{}' attempt {}/{} failed: {}",
                    T::DESCRIPTOR.name,
                    attempt,
                    max,
                    message
                );
                if let Some(cb) = cb {
                    cb.on_attempt_failed(attempt, max, &message);
                }
                last_err = Some(e);
            }
        }

        if attempt < max {
            let delay = config.delay_before(attempt + 1);
            if let Some(cb) = cb {
                cb.on_retry_scheduled(attempt + 1, delay);
            }
            sleep(delay).await;
        }
    }

    // max >= 1, so at least one attempt failed to get here.
    let last = last_err.unwrap_or_else(|| RequestError::Internal("no attempt was made".into()));
    if let Some(cb) = cb {
        cb.on_gave_up(max, &last.to_string());
    }
    Err(RequestError::RetriesExhausted {
        attempts: max,
        last: Box::new(last),
    })
}

/// Synchronous wrapper around [`request`].
///
/// Creates a temporary tokio runtime internally; do not call from inside an
/// async context.
pub fn request_sync<T, S>(
    session: &S,
    prompt: &str,
    config: &ExtractConfig,
) -> Result<RequestOutcome<T>, RequestError>
where
    T: ReplySchema,
    S: ChatSession,
{
    tokio::runtime::Runtime::new()
        .map_err(|e| RequestError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(request(session, prompt, config))
}

/// Run [`request`] for every prompt, at most `config.concurrency` at once.
///
/// Results come back in the order of `prompts`; one failure does not cancel
/// the others.
pub async fn request_many<T, S>(
    session: &S,
    prompts: &[String],
    config: &ExtractConfig,
) -> Vec<Result<RequestOutcome<T>, RequestError>>
where
    T: ReplySchema,
    S: ChatSession,
{
    stream::iter(prompts)
        .map(|prompt| request::<T, S>(session, prompt, config))
        .buffered(config.concurrency.max(1))
        .collect()
        .await
}
