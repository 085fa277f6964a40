// Shared result types: the unified record both analyzers are normalized into.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::AnalysisError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Scores at or above this value are labelled `Positive`.
pub const POSITIVE_THRESHOLD: f64 = 0.05;

/// Scores at or below this value are labelled `Negative`.
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

/// When the lexicon reads a text as neutral, a model score weaker than this
/// counts as a tentative lean rather than a real disagreement.
pub const TENTATIVE_CONFIDENCE: f64 = 0.75;

// ---------------------------------------------------------------------------
// Source / Label
// ---------------------------------------------------------------------------

/// Which analyzer produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Lexicon,
    Model,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Lexicon => write!(f, "lexicon"),
            Source::Model => write!(f, "model"),
        }
    }
}

/// Normalized categorical verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Positive,
    Negative,
    Neutral,
}

impl Label {
    /// Derive the label from a signed polarity score.
    ///
    /// The same thresholds apply to every analyzer, so equal scores always
    /// produce equal labels.
    pub fn from_score(score: f64) -> Label {
        if score >= POSITIVE_THRESHOLD {
            Label::Positive
        } else if score <= NEGATIVE_THRESHOLD {
            Label::Negative
        } else {
            Label::Neutral
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Positive => "POSITIVE",
            Label::Negative => "NEGATIVE",
            Label::Neutral => "NEUTRAL",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Label::Positive => "😊",
            Label::Negative => "😞",
            Label::Neutral => "😐",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SentimentResult
// ---------------------------------------------------------------------------

/// The unified output record of one analyzer.
///
/// `score` is a signed polarity in [-1, 1]. For the lexicon it is the
/// compound score; for the model it is the confidence of its label, negated
/// when the label is negative. `raw` keeps the analyzer's native fields for
/// display only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentResult {
    pub source: Source,
    pub label: Label,
    pub score: f64,
    pub raw: BTreeMap<String, serde_json::Value>,
}

impl SentimentResult {
    /// Build a result whose label is derived from `score`.
    pub fn new(source: Source, score: f64, raw: BTreeMap<String, serde_json::Value>) -> Self {
        SentimentResult {
            source,
            label: Label::from_score(score),
            score,
            raw,
        }
    }

    /// Read a numeric raw field, if present.
    pub fn raw_f64(&self, key: &str) -> Option<f64> {
        self.raw.get(key).and_then(serde_json::Value::as_f64)
    }
}

/// One analyzer's slot in a comparison: either its result or the reason it
/// could not produce one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Slot {
    Available(SentimentResult),
    Unavailable { source: Source, reason: String },
}

impl Slot {
    pub fn result(&self) -> Option<&SentimentResult> {
        match self {
            Slot::Available(result) => Some(result),
            Slot::Unavailable { .. } => None,
        }
    }

    pub fn source(&self) -> Source {
        match self {
            Slot::Available(result) => result.source,
            Slot::Unavailable { source, .. } => *source,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Slot::Available(_))
    }
}

// ---------------------------------------------------------------------------
// AgreementVerdict
// ---------------------------------------------------------------------------

/// How the two labels relate, with a softer middle ground for a neutral
/// lexicon reading against a weak model lean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgreementKind {
    Agree,
    Tentative,
    Disagree,
}

/// Derived comparison of a lexicon result and a model result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AgreementVerdict {
    /// Exactly `lexicon.label == model.label`.
    pub agree: bool,
    /// `|lexicon.score - model.score|`.
    pub score_gap: f64,
    pub kind: AgreementKind,
}

impl AgreementVerdict {
    pub fn between(lexicon: &SentimentResult, model: &SentimentResult) -> Self {
        let agree = lexicon.label == model.label;
        let kind = if agree {
            AgreementKind::Agree
        } else if lexicon.label == Label::Neutral && model.score.abs() < TENTATIVE_CONFIDENCE {
            AgreementKind::Tentative
        } else {
            AgreementKind::Disagree
        };
        AgreementVerdict {
            agree,
            score_gap: (lexicon.score - model.score).abs(),
            kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Everything a presentation layer renders for one analysis request.
///
/// `verdict` is present only when both slots hold a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub lexicon: Slot,
    pub model: Slot,
    pub verdict: Option<AgreementVerdict>,
}

impl Comparison {
    pub fn from_slots(lexicon: Slot, model: Slot) -> Self {
        let verdict = match (lexicon.result(), model.result()) {
            (Some(l), Some(m)) => Some(AgreementVerdict::between(l, m)),
            _ => None,
        };
        Comparison {
            lexicon,
            model,
            verdict,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject text that is empty after trimming whitespace.
pub fn validate_text(text: &str) -> Result<&str, AnalysisError> {
    if text.trim().is_empty() {
        Err(AnalysisError::InvalidInput)
    } else {
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn result(source: Source, score: f64) -> SentimentResult {
        SentimentResult::new(source, score, BTreeMap::new())
    }

    #[test]
    fn label_thresholds_are_inclusive() {
        assert_eq!(Label::from_score(0.05), Label::Positive);
        assert_eq!(Label::from_score(0.049999), Label::Neutral);
        assert_eq!(Label::from_score(-0.05), Label::Negative);
        assert_eq!(Label::from_score(-0.049999), Label::Neutral);
        assert_eq!(Label::from_score(0.0), Label::Neutral);
        assert_eq!(Label::from_score(1.0), Label::Positive);
        assert_eq!(Label::from_score(-1.0), Label::Negative);
    }

    #[test]
    fn label_ignores_source() {
        let lexicon = result(Source::Lexicon, 0.3);
        let model = result(Source::Model, 0.3);
        assert_eq!(lexicon.label, model.label);
    }

    #[test]
    fn validate_rejects_blank_text() {
        assert_eq!(validate_text(""), Err(AnalysisError::InvalidInput));
        assert_eq!(validate_text("   "), Err(AnalysisError::InvalidInput));
        assert_eq!(validate_text("\n\t "), Err(AnalysisError::InvalidInput));
        assert_eq!(validate_text(" ok "), Ok(" ok "));
    }

    #[test]
    fn verdict_agrees_on_matching_labels() {
        let verdict = AgreementVerdict::between(
            &result(Source::Lexicon, 0.8),
            &result(Source::Model, 0.95),
        );
        assert!(verdict.agree);
        assert_eq!(verdict.kind, AgreementKind::Agree);
        assert!((verdict.score_gap - 0.15).abs() < 1e-9);
    }

    #[test]
    fn neutral_lexicon_against_weak_model_is_tentative() {
        let verdict = AgreementVerdict::between(
            &result(Source::Lexicon, 0.0),
            &result(Source::Model, -0.6),
        );
        assert!(!verdict.agree);
        assert_eq!(verdict.kind, AgreementKind::Tentative);
    }

    #[test]
    fn neutral_lexicon_against_confident_model_disagrees() {
        let verdict = AgreementVerdict::between(
            &result(Source::Lexicon, 0.0),
            &result(Source::Model, 0.99),
        );
        assert!(!verdict.agree);
        assert_eq!(verdict.kind, AgreementKind::Disagree);
        assert!((verdict.score_gap - 0.99).abs() < 1e-9);
    }

    #[test]
    fn opposite_labels_disagree() {
        let verdict = AgreementVerdict::between(
            &result(Source::Lexicon, -0.4),
            &result(Source::Model, 0.6),
        );
        assert!(!verdict.agree);
        assert_eq!(verdict.kind, AgreementKind::Disagree);
        assert!((verdict.score_gap - 1.0).abs() < 1e-9);
    }

    #[test]
    fn comparison_has_no_verdict_with_missing_slot() {
        let comparison = Comparison::from_slots(
            Slot::Available(result(Source::Lexicon, 0.5)),
            Slot::Unavailable {
                source: Source::Model,
                reason: "timed out".into(),
            },
        );
        assert!(comparison.verdict.is_none());
        assert_eq!(comparison.model.source(), Source::Model);
        assert!(!comparison.model.is_available());
    }

    #[test]
    fn slot_serializes_with_status_tag() {
        let slot = Slot::Unavailable {
            source: Source::Model,
            reason: "timed out".into(),
        };
        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["source"], "model");
    }
}
