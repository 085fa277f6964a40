// Plain-text rendering of a comparison.
//
// Layout:
//   Lexicon (VADER) panel: label + emoji, pos/neu/neg bars, compound
//   Model (DistilBERT) panel: label + emoji, confidence bar and percentage
//   Comparison summary + agreement message

use std::fmt::Write as _;

use sentiment_core::{AgreementKind, AgreementVerdict, Comparison, Label, SentimentResult, Slot};

/// Width of a full progress bar in characters.
const BAR_WIDTH: usize = 20;

const RULE: &str = "────────────────────────────────────────";

/// Render a full comparison as terminal text, ending with a newline.
pub fn render_comparison(comparison: &Comparison) -> String {
    let mut out = String::new();

    lexicon_panel(&mut out, &comparison.lexicon);
    out.push('\n');
    model_panel(&mut out, &comparison.model);
    out.push('\n');

    let _ = writeln!(out, "Comparison");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "  Lexicon: {}", summary_line(&comparison.lexicon));
    let _ = writeln!(out, "  Model:   {}", summary_line(&comparison.model));
    if let Some(verdict) = &comparison.verdict {
        if let Some(model) = comparison.model.result() {
            let _ = writeln!(out, "  {}", agreement_message(verdict, model.label));
        }
    }

    out
}

fn lexicon_panel(out: &mut String, slot: &Slot) {
    let _ = writeln!(out, "Lexicon analysis (VADER)");
    let _ = writeln!(out, "{RULE}");
    let result = match slot {
        Slot::Available(result) => result,
        Slot::Unavailable { reason, .. } => {
            let _ = writeln!(out, "  {}", unavailable_line(reason));
            return;
        }
    };

    let _ = writeln!(out, "  {}", label_line(result.label));
    for (name, key) in [("Positive", "pos"), ("Neutral", "neu"), ("Negative", "neg")] {
        let value = result.raw_f64(key).unwrap_or(0.0);
        let _ = writeln!(out, "  {name:<9} {} {value:.3}", bar(value));
    }
    let _ = writeln!(out, "  Compound  {:.3}", result.score);
}

fn model_panel(out: &mut String, slot: &Slot) {
    let _ = writeln!(out, "Transformer analysis (DistilBERT)");
    let _ = writeln!(out, "{RULE}");
    let result = match slot {
        Slot::Available(result) => result,
        Slot::Unavailable { reason, .. } => {
            let _ = writeln!(out, "  {}", unavailable_line(reason));
            return;
        }
    };

    let _ = writeln!(out, "  {}", label_line(model_label(result)));
    let confidence = result.raw_f64("confidence").unwrap_or(result.score.abs());
    let _ = writeln!(
        out,
        "  Confidence {} {}",
        bar(confidence),
        format_percent(confidence)
    );
    if result.raw.get("truncated").and_then(|v| v.as_bool()) == Some(true) {
        let _ = writeln!(out, "  (input truncated before inference)");
    }
}

/// "😊 Sentiment: POSITIVE"
pub fn label_line(label: Label) -> String {
    format!("{} Sentiment: {}", label.emoji(), label)
}

/// The model's own label. Falls back to the normalized label when the raw
/// field is missing.
fn model_label(result: &SentimentResult) -> Label {
    match result.raw.get("label").and_then(|v| v.as_str()) {
        Some("POSITIVE") => Label::Positive,
        Some("NEGATIVE") => Label::Negative,
        _ => result.label,
    }
}

fn summary_line(slot: &Slot) -> String {
    match slot {
        Slot::Available(result) if result.raw.contains_key("compound") => {
            format!("{} (compound {:.3})", result.label, result.score)
        }
        Slot::Available(result) => {
            let confidence = result.raw_f64("confidence").unwrap_or(result.score.abs());
            format!("{} (confidence {})", model_label(result), format_percent(confidence))
        }
        Slot::Unavailable { reason, .. } => unavailable_line(reason),
    }
}

pub fn unavailable_line(reason: &str) -> String {
    format!("unavailable: {reason}")
}

/// Agreement wording for a verdict. `model_label` names the weak lean in the
/// tentative case.
pub fn agreement_message(verdict: &AgreementVerdict, model_label: Label) -> String {
    match verdict.kind {
        AgreementKind::Agree => "✅ Both analyzers agree on the sentiment!".to_string(),
        AgreementKind::Tentative => format!(
            "ℹ️ The lexicon detected neutral sentiment while the model shows weak {} sentiment.",
            model_label.as_str().to_lowercase()
        ),
        AgreementKind::Disagree => "⚠️ The analyzers have different interpretations. \
                                    Consider the context and nuances of the text."
            .to_string(),
    }
}

/// Fixed-width bar for a value in [0, 1]; out-of-range values are clamped.
pub fn bar(value: f64) -> String {
    let filled = (value.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Format a [0, 1] fraction as a percentage with one decimal.
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
