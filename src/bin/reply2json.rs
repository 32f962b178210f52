//! CLI binary for llm-reply-json.
//!
//! A thin shim over the library crate: reads a saved reply (or a prompt with
//! `--ask`), runs it through the pipeline and prints the result as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use llm_reply_json::schema::{
    AnalysisComparison, AtsAnalysis, FileAnalysis, KeywordTopics, PaperAnalysis, ProjectOverview,
    Roadmap,
};
use llm_reply_json::{
    extract_with, parse_reply, request, Backoff, ExtractConfig, ProgressCallback,
    ProviderSession, ReplySchema, RequestProgressCallback,
};
use serde_json::Value;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that reports each attempt and retry while `--ask` waits on the
/// model.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Asking");
        bar.set_message("waiting for the model…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl RequestProgressCallback for CliProgressCallback {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        self.bar.set_message(format!("attempt {attempt}/{max_attempts}"));
    }

    fn on_attempt_failed(&self, attempt: u32, max_attempts: u32, error: &str) {
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} attempt {}/{}  {}",
            red("✗"),
            attempt,
            max_attempts,
            red(&msg)
        ));
    }

    fn on_retry_scheduled(&self, next_attempt: u32, delay: Duration) {
        self.bar.set_message(format!(
            "retrying ({next_attempt}) in {:.1}s",
            delay.as_secs_f64()
        ));
    }

    fn on_success(&self, attempt: u32) {
        self.bar.finish_and_clear();
        eprintln!("{} valid reply on attempt {}", green("✔"), attempt);
    }

    fn on_gave_up(&self, attempts: u32, _error: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} no valid reply after {} attempt(s)", red("✘"), attempts);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Validate a saved reply against the roadmap schema
  reply2json --schema roadmap reply.txt

  # Read the reply from stdin, compact output
  cat reply.txt | reply2json --schema ats --compact -

  # Parse only, no schema check
  reply2json --schema any reply.txt

  # Ask the model, with up to 5 attempts and exponential backoff
  reply2json --ask --schema paper --max-attempts 5 --exponential-backoff prompt.txt

  # Use a specific model
  reply2json --ask --provider anthropic --model claude-sonnet-4-20250514 prompt.txt

SCHEMAS:
  ats               JDMatch, MissingKeywords[], ProfileSummary, ScoreBreakdown{}
  paper             Summary, KeyPoints[], PaperAnalysis, Topics[]
  roadmap           steps[] of {title, description, resources[], timeEstimate}
  file-analysis     fileName, fileType, purpose, keyComponents[], ...
  project-overview  projectName, purpose, keyFeatures[], technologiesUsed[], complexity
  keyword-topics    categories{topic: [keywords]}
  paper-comparison  top-level array of {criteria, ratings{id: "n/10"}, notes}
  any               any JSON value, no field checks

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Override the log filter (e.g. llm_reply_json=debug)

EXIT STATUS:
  0 on success; 1 when the reply is empty, not JSON, or does not match the
  schema (every violation is listed on stderr).
"#;

/// Extract validated JSON from LLM replies.
#[derive(Parser, Debug)]
#[command(
    name = "reply2json",
    version,
    about = "Extract validated JSON from LLM replies",
    long_about = "Recover a JSON object from a free-form LLM reply (code fences, \
surrounding prose, trailing commas, stray escapes), check it against a known schema \
and print the normalised result. With --ask, send the input as a prompt and retry \
until the reply is usable.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Reply file (or prompt file with --ask); `-` reads stdin.
    input: String,

    /// Schema the reply must satisfy.
    #[arg(short, long, env = "REPLY2JSON_SCHEMA", value_enum, default_value = "any")]
    schema: SchemaArg,

    /// Treat the input as a prompt and ask the configured model.
    #[arg(long)]
    ask: bool,

    /// Print single-line JSON instead of pretty-printed.
    #[arg(long, env = "REPLY2JSON_COMPACT")]
    compact: bool,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Total attempts per request with --ask.
    #[arg(long, env = "REPLY2JSON_MAX_ATTEMPTS", default_value_t = 3)]
    max_attempts: u32,

    /// Delay between attempts in milliseconds.
    #[arg(long, env = "REPLY2JSON_RETRY_DELAY_MS", default_value_t = 2000)]
    retry_delay_ms: u64,

    /// Double the delay after each retry instead of keeping it fixed.
    #[arg(long, env = "REPLY2JSON_EXPONENTIAL_BACKOFF")]
    exponential_backoff: bool,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "REPLY2JSON_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Search endpoint for fallback resource links.
    #[arg(long, env = "REPLY2JSON_SEARCH_BASE")]
    search_base: Option<String>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "REPLY2JSON_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "REPLY2JSON_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SchemaArg {
    Ats,
    Paper,
    Roadmap,
    FileAnalysis,
    ProjectOverview,
    KeywordTopics,
    PaperComparison,
    Any,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback in --ask mode; keep library INFO logs
    // out of its way.
    let show_progress = cli.ask && !cli.quiet;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let input = read_input(&cli.input)?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new();
        Some(cb as Arc<dyn RequestProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    let value = if cli.ask {
        let session = ProviderSession::from_config(&config)
            .context("Failed to set up the LLM provider")?;
        ask(&session, cli.schema, &input, &config).await?
    } else {
        extract_offline(cli.schema, &input, &config)?
    };

    let json = if cli.compact {
        serde_json::to_string(&value)
    } else {
        serde_json::to_string_pretty(&value)
    }
    .context("Failed to serialise result")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{json}").context("Failed to write to stdout")?;

    if !cli.quiet && !cli.ask {
        eprintln!("{} {}", green("✔"), dim(&format!("{:?} reply is valid", cli.schema)));
    }

    Ok(())
}

/// Read the input file, or stdin for `-`.
fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {path:?}"))
    }
}

/// Map CLI args to `ExtractConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractConfig> {
    let mut builder = ExtractConfig::builder()
        .max_attempts(cli.max_attempts)
        .retry_delay_ms(cli.retry_delay_ms)
        .api_timeout_secs(cli.api_timeout);

    if cli.exponential_backoff {
        builder = builder.backoff(Backoff::Exponential);
    }
    if let Some(ref base) = cli.search_base {
        builder = builder.search_base(base.as_str());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.as_str());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.as_str());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn extract_offline(schema: SchemaArg, raw: &str, config: &ExtractConfig) -> Result<Value> {
    fn typed<T: ReplySchema>(raw: &str, config: &ExtractConfig) -> Result<Value> {
        let value: T = extract_with(raw, &config.normalize)
            .with_context(|| format!("Reply rejected ({})", cyan(T::DESCRIPTOR.name)))?;
        serde_json::to_value(value).context("Failed to serialise result")
    }

    match schema {
        SchemaArg::Ats => typed::<AtsAnalysis>(raw, config),
        SchemaArg::Paper => typed::<PaperAnalysis>(raw, config),
        SchemaArg::Roadmap => typed::<Roadmap>(raw, config),
        SchemaArg::FileAnalysis => typed::<FileAnalysis>(raw, config),
        SchemaArg::ProjectOverview => typed::<ProjectOverview>(raw, config),
        SchemaArg::KeywordTopics => typed::<KeywordTopics>(raw, config),
        SchemaArg::PaperComparison => typed::<AnalysisComparison>(raw, config),
        SchemaArg::Any => parse_reply(raw).context("Reply rejected"),
    }
}

async fn ask(
    session: &ProviderSession,
    schema: SchemaArg,
    prompt: &str,
    config: &ExtractConfig,
) -> Result<Value> {
    async fn typed<T: ReplySchema>(
        session: &ProviderSession,
        prompt: &str,
        config: &ExtractConfig,
    ) -> Result<Value> {
        let outcome = request::<T, _>(session, prompt, config)
            .await
            .with_context(|| format!("Request failed ({})", cyan(T::DESCRIPTOR.name)))?;
        tracing::info!(
            "{} tokens in / {} tokens out, {}ms",
            outcome.prompt_tokens,
            outcome.completion_tokens,
            outcome.duration_ms
        );
        serde_json::to_value(outcome.value).context("Failed to serialise result")
    }

    match schema {
        SchemaArg::Ats => typed::<AtsAnalysis>(session, prompt, config).await,
        SchemaArg::Paper => typed::<PaperAnalysis>(session, prompt, config).await,
        SchemaArg::Roadmap => typed::<Roadmap>(session, prompt, config).await,
        SchemaArg::FileAnalysis => typed::<FileAnalysis>(session, prompt, config).await,
        SchemaArg::ProjectOverview => typed::<ProjectOverview>(session, prompt, config).await,
        SchemaArg::KeywordTopics => typed::<KeywordTopics>(session, prompt, config).await,
        SchemaArg::PaperComparison => {
            typed::<AnalysisComparison>(session, prompt, config).await
        }
        SchemaArg::Any => anyhow::bail!(
            "--ask needs a concrete --schema; 'any' only applies to saved replies"
        ),
    }
}
