// Sentiment analyzer entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Load the lexicon
// 4. Load the transformer model (fatal on failure)
// 5. Build the normalizer
// 6. Analyze command-line text once, or run the interactive loop

use sentiment_app::{app, render};
use sentiment_core::config;
use sentiment_core::model::{self, ModelSettings};
use sentiment_core::{AnalysisError, Lexicon, LexiconAnalyzer, ModelAnalyzer, ResultNormalizer};

use anyhow::Context;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Sentiment analyzer starting up");

    let (json, words) = parse_args(std::env::args().skip(1));

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: model={}, timeout={}ms, max_input_chars={}",
        config.model.identifier, config.model.inference_timeout_ms, config.model.max_input_chars
    );

    // 3. Load the lexicon
    let lexicon = Lexicon::load(config.lexicon.data_path.as_deref())
        .context("failed to load lexicon")?;

    // 4. Load the transformer model
    eprintln!("Loading models...");
    let handle = match model::load_transformer(&config.model.identifier).await {
        Ok(handle) => handle,
        Err(e) => {
            error!("Model load failed: {e}");
            return Err(e).context("failed to load sentiment model");
        }
    };

    // 5. Build the normalizer
    let normalizer = ResultNormalizer::new(
        LexiconAnalyzer::new(lexicon),
        ModelAnalyzer::new(handle, ModelSettings::from(&config.model)),
    );
    info!("Models loaded; ready");

    // 6. One-shot or interactive
    if !words.is_empty() {
        let text = words.join(" ");
        let comparison = match app::analyze_once(&normalizer, &text).await {
            Ok(comparison) => comparison,
            Err(e) => {
                if e == AnalysisError::InvalidInput {
                    eprintln!("{}", app::EMPTY_INPUT_MESSAGE);
                }
                return Err(e).context("analysis failed");
            }
        };
        let output = if json {
            let mut out =
                serde_json::to_string_pretty(&comparison).context("failed to encode comparison")?;
            out.push('\n');
            out
        } else {
            render::render_comparison(&comparison)
        };
        let mut stdout = tokio::io::stdout();
        stdout.write_all(output.as_bytes()).await?;
        stdout.flush().await?;
    } else {
        eprintln!("✅ Models loaded successfully!");
        let stdin = BufReader::new(tokio::io::stdin());
        app::run(&normalizer, stdin, tokio::io::stdout()).await?;
    }

    info!("Sentiment analyzer shut down cleanly");
    Ok(())
}

/// Split `--json` from the words to analyze.
fn parse_args(args: impl Iterator<Item = String>) -> (bool, Vec<String>) {
    let mut json = false;
    let mut words = Vec::new();
    for arg in args {
        if arg == "--json" {
            json = true;
        } else {
            words.push(arg);
        }
    }
    (json, words)
}

/// Initialize tracing to log to a file (stdout is the interactive surface).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("sentiment-analyzer.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("sentiment_app=info,sentiment_core=info,warn")
            }),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parse_args_splits_json_flag() {
        let (json, words) = parse_args(args(&["--json", "I", "love", "it"]));
        assert!(json);
        assert_eq!(words, vec!["I", "love", "it"]);
    }

    #[test]
    fn parse_args_without_flag() {
        let (json, words) = parse_args(args(&[]));
        assert!(!json);
        assert!(words.is_empty());
    }
}
