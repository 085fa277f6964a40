// Interactive read/compare/render loop.
//
// Reads one text per line from `reader` and writes rendered comparisons to
// `writer`. Lines opening with `:` and a known command word are commands;
// everything else is analyzed.

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info, warn};

use sentiment_core::{AnalysisError, Analyzer, Comparison, ResultNormalizer};

use crate::render;

/// Sample texts offered by `:examples`.
pub const EXAMPLES: [&str; 5] = [
    "I absolutely love this product! It's amazing and exceeded all my expectations!",
    "This is the worst experience I've ever had. Completely disappointing.",
    "The weather is okay today. Nothing special.",
    "I'm so excited about this new opportunity! Can't wait to get started!",
    "I feel terrible about the situation. Everything went wrong.",
];

pub const PROMPT: &str = "> ";
pub const EMPTY_INPUT_MESSAGE: &str = "⚠️ Please enter some text to analyze.";

const HELP: &str = "Enter text to compare both analyzers.\n\
                    Commands: :examples, :example N, :help, :quit\n";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Input<'a> {
    Analyze(&'a str),
    Example(usize),
    ListExamples,
    Help,
    Quit,
    Unknown(&'a str),
}

/// Words that make a `:`-prefixed line a command.
const COMMANDS: &[&str] = &["quit", "q", "exit", "help", "h", "examples", "example"];

/// Classify one input line.
///
/// A line is a command only when a known command word follows the `:`
/// directly. Everything else, including text that opens with an emoticon
/// like `:)` and blank lines (which the normalizer rejects), is analyzed
/// as-is. A known command with bad arguments is `Unknown`.
pub fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix(':') else {
        return Input::Analyze(line);
    };

    let mut parts = command.split_whitespace();
    let (Some(word), arg) = (parts.next(), parts.next()) else {
        return Input::Analyze(line);
    };
    if !command.starts_with(word) || !COMMANDS.contains(&word) {
        return Input::Analyze(line);
    }

    match (word, arg, parts.next()) {
        ("quit" | "q" | "exit", None, _) => Input::Quit,
        ("help" | "h", None, _) => Input::Help,
        ("examples", None, _) => Input::ListExamples,
        ("example", Some(n), None) => match n.parse::<usize>() {
            Ok(n) if (1..=EXAMPLES.len()).contains(&n) => Input::Example(n),
            _ => Input::Unknown(trimmed),
        },
        _ => Input::Unknown(trimmed),
    }
}

/// Run the loop until EOF or `:quit`.
///
/// Invalid input and per-analyzer failures are reported and the loop
/// continues. Fatal errors end the loop with an error.
pub async fn run<L, M, R, W>(
    normalizer: &ResultNormalizer<L, M>,
    reader: R,
    mut writer: W,
) -> anyhow::Result<()>
where
    L: Analyzer,
    M: Analyzer,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    write_out(&mut writer, HELP).await?;

    loop {
        write_out(&mut writer, PROMPT).await?;
        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            info!("Input closed");
            break;
        };

        let text = match parse_input(&line) {
            Input::Quit => {
                info!("Quit requested");
                break;
            }
            Input::Help => {
                write_out(&mut writer, HELP).await?;
                continue;
            }
            Input::ListExamples => {
                let mut listing = String::new();
                for (i, example) in EXAMPLES.iter().enumerate() {
                    listing.push_str(&format!("  {}. {example}\n", i + 1));
                }
                write_out(&mut writer, &listing).await?;
                continue;
            }
            Input::Unknown(command) => {
                write_out(&mut writer, &format!("Unknown command: {command}\n{HELP}")).await?;
                continue;
            }
            Input::Example(n) => EXAMPLES[n - 1],
            Input::Analyze(text) => text,
        };

        match analyze_once(normalizer, text).await {
            Ok(comparison) => {
                write_out(&mut writer, &render::render_comparison(&comparison)).await?;
            }
            Err(AnalysisError::InvalidInput) => {
                write_out(&mut writer, &format!("{EMPTY_INPUT_MESSAGE}\n")).await?;
            }
            Err(e) => {
                error!("Analysis failed: {e}");
                return Err(e).context("analysis failed");
            }
        }
    }

    writer.flush().await.context("failed to flush output")?;
    Ok(())
}

/// Compare one text, logging rejected input.
pub async fn analyze_once<L: Analyzer, M: Analyzer>(
    normalizer: &ResultNormalizer<L, M>,
    text: &str,
) -> Result<Comparison, AnalysisError> {
    let result = normalizer.compare(text).await;
    if let Err(AnalysisError::InvalidInput) = &result {
        warn!("Rejected empty input");
    }
    result
}

async fn write_out<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> anyhow::Result<()> {
    writer
        .write_all(text.as_bytes())
        .await
        .context("failed to write output")?;
    writer.flush().await.context("failed to flush output")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
