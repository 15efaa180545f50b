use anyhow::{bail, Context};
use clap::Parser;
use csv_wordlist_translator::csv_processor::file_exists;
use csv_wordlist_translator::{
    process_file, recover_failures, AppConfig, GoogleTranslator, LogProgress, ProgressObserver,
    RecoveryOptions, RunOptions, WordlistError,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Translate a book word-list CSV into a bilingual CSV: every book becomes a
/// translated row followed by its original row.
#[derive(Parser, Debug)]
#[command(name = "csv-wordlist-translator", version, about)]
struct Cli {
    /// Source CSV: level, title, then one word per column
    #[arg(value_name = "INPUT_PATH", default_value = "razfull.csv")]
    input_path: String,

    /// Bilingual CSV to write
    #[arg(value_name = "OUTPUT_PATH", default_value = "translated_output.csv")]
    output_path: String,

    /// Only process this many data rows (dry runs)
    #[arg(long)]
    limit: Option<usize>,

    /// Continue a partially written output file
    #[arg(long)]
    resume: bool,

    /// Re-translate only the failed cells of a finished INPUT_PATH into OUTPUT_PATH
    #[arg(long, conflicts_with = "resume")]
    retry_failures: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Source language tag (e.g. 'en')
    #[arg(long)]
    source_lang: Option<String>,

    /// Target language tag (e.g. 'zh-cn')
    #[arg(long)]
    target_lang: Option<String>,

    /// Words translated between two pacing pauses
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Pacing pause in milliseconds, also the retry backoff
    #[arg(long)]
    pause_ms: Option<u64>,

    /// Retries per word before a failure placeholder is written
    #[arg(long)]
    max_retries: Option<usize>,

    /// Do not log every translated word
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        let translation = &mut config.translation;
        if let Some(lang) = &self.source_lang {
            translation.source_lang = lang.clone();
        }
        if let Some(lang) = &self.target_lang {
            translation.target_lang = lang.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            translation.chunk_size = chunk_size;
        }
        if let Some(pause_ms) = self.pause_ms {
            translation.pause_ms = pause_ms;
        }
        if let Some(max_retries) = self.max_retries {
            translation.max_retries = max_retries;
        }
    }
}

fn ensure_input(path: &str) -> anyhow::Result<()> {
    if !file_exists(path) {
        bail!("input file not found: '{}'", path);
    }
    Ok(())
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn")
            .add_directive(format!("csv_wordlist_translator={}", level).parse()?),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Conflicting modes are rejected here, before any file is touched.
    let cli = Cli::parse();

    ensure_input(&cli.input_path)?;

    let (mut config, config_error) = match AppConfig::load_if_present(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    init_logging(&config.logging.level)?;
    if let Some(e) = config_error {
        tracing::warn!(path = %cli.config, error = %e, "Ignoring unusable config file");
    }
    cli.apply_overrides(&mut config);

    let translator = GoogleTranslator::new(&config.api).context("failed to build HTTP client")?;
    let observer: Option<&dyn ProgressObserver> = if cli.quiet {
        None
    } else {
        Some(&LogProgress)
    };

    let work = async {
        if cli.retry_failures {
            tracing::info!(input = %cli.input_path, "Starting failure recovery");
            let options = RecoveryOptions::from_config(&cli.input_path, &cli.output_path, &config);
            let stats = recover_failures(&options, &translator, observer).await?;
            tracing::info!(
                output = %cli.output_path,
                retried = stats.total_words,
                success = stats.success,
                fail = stats.fail,
                "Failure recovery finished"
            );
        } else {
            tracing::info!(
                input = %cli.input_path,
                limit = ?cli.limit,
                resume = cli.resume,
                "Starting translation"
            );
            let mut options = RunOptions::from_config(&cli.input_path, &cli.output_path, &config);
            options.limit = cli.limit;
            options.resume = cli.resume;
            let stats = process_file(&options, &translator, observer).await?;
            tracing::info!(output = %cli.output_path, "Translation finished: {}", stats);
        }
        Ok::<(), WordlistError>(())
    };

    let outcome = tokio::select! {
        result = work => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    match outcome {
        Some(result) => result.with_context(|| format!("failed to process '{}'", cli.input_path)),
        None => {
            tracing::warn!(
                output = %cli.output_path,
                "Interrupted by user, completed rows are kept and can be continued with --resume"
            );
            std::process::exit(130);
        }
    }
}
