use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use oratio_core::Lexicon;
use oratio_engine::{DEFAULT_SPEECH_SAMPLE, Engine};
use oratio_llm::{
    CostTracker, DEFAULT_EXCERPT_CAP, DEFAULT_MAX_RETRIES, DEFAULT_MODEL, GeminiTransport,
    LlmClient, Pricing,
};
use oratio_store::{DebateFilter, DebateStore};

mod display;

#[derive(Parser)]
#[command(
    name = "oratio",
    about = "Two-stage Brexit classification of Hansard debates",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every debate in a corpus against the Brexit lexicon and LLM.
    Classify(ClassifyArgs),
    /// Summarise an already-classified corpus.
    Report(ReportArgs),
}

#[derive(Args)]
struct ClassifyArgs {
    /// Path to the debates database.
    #[arg(long, default_value = "debates.duckdb")]
    db: PathBuf,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Gemini model name.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Budget ceiling in USD; the run halts once cumulative cost reaches it.
    #[arg(long, default_value_t = 20.0)]
    budget: f64,

    /// USD per million input tokens.
    #[arg(long, default_value_t = 0.075)]
    input_price: f64,

    /// USD per million output tokens.
    #[arg(long, default_value_t = 0.30)]
    output_price: f64,

    /// Minimum seconds between LLM calls.
    #[arg(long, default_value_t = 6.0)]
    min_interval: f64,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// Retries after a rate-limited call, before giving up on the debate.
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Characters of speech excerpt included in the prompt, at most.
    #[arg(long, default_value_t = DEFAULT_EXCERPT_CAP)]
    excerpt_cap: usize,

    /// Speeches sampled per debate for scoring and the LLM excerpt.
    #[arg(long, default_value_t = DEFAULT_SPEECH_SAMPLE)]
    speech_sample: usize,

    /// Only debates on or after this date (YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Only debates on or before this date (YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,
}

#[derive(Args)]
struct ReportArgs {
    /// Path to the classified database.
    #[arg(long, default_value = "debates.duckdb")]
    db: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    tracing::info!("oratio v{}", env!("CARGO_PKG_VERSION"));

    match Cli::parse().command {
        Commands::Classify(args) => classify(args).await,
        Commands::Report(args) => report(args),
    }
}

async fn classify(args: ClassifyArgs) -> anyhow::Result<()> {
    let store = DebateStore::open_persistent(&args.db)?;

    let transport = GeminiTransport::new(
        args.api_key,
        args.model,
        Duration::from_secs(args.timeout),
    )?;
    let client = LlmClient::new(transport)
        .with_max_retries(args.max_retries)
        .with_excerpt_cap(args.excerpt_cap);
    let tracker = CostTracker::new(
        args.budget,
        Pricing {
            input_per_million: args.input_price,
            output_per_million: args.output_price,
        },
    );

    let engine = Engine::new(
        &store,
        client,
        Lexicon::brexit(),
        tracker,
        Duration::from_secs_f64(args.min_interval),
    )
    .with_speech_sample(args.speech_sample);

    let filter = DebateFilter {
        from: args.from,
        to: args.to,
    };
    let run = engine.run(&filter).await?;
    display::print_run_report(&run);

    let summary = store.summary()?;
    display::print_summary(&summary);
    Ok(())
}

fn report(args: ReportArgs) -> anyhow::Result<()> {
    let store = DebateStore::open_persistent(&args.db)?;
    let summary = store.summary()?;
    display::print_summary(&summary);
    Ok(())
}
