// Pretrained binary classifier analyzer.
//
// The loaded model lives on a dedicated worker thread (see `worker`), owned
// through an explicitly constructed `ModelHandle`. `ModelAnalyzer` adds input
// truncation, a bounded inference timeout, and a single retry on timeout.

mod transformer;
mod worker;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ModelConfig;
use crate::error::AnalysisError;
use crate::normalizer::{Analyzer, Normalize};
use crate::sentiment::{validate_text, SentimentResult, Source};

pub use transformer::{load_transformer, DEFAULT_MODEL};
pub use worker::{ModelHandle, TextClassifier};

// ---------------------------------------------------------------------------
// ModelOutput
// ---------------------------------------------------------------------------

/// The only labels a binary sentiment classifier emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModelLabel {
    Positive,
    Negative,
}

impl ModelLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelLabel::Positive => "POSITIVE",
            ModelLabel::Negative => "NEGATIVE",
        }
    }
}

/// Native classifier output: a label and its confidence in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelOutput {
    pub label: ModelLabel,
    pub confidence: f64,
    /// True when the input was cut to the configured character limit.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl ModelOutput {
    pub fn new(label: ModelLabel, confidence: f64) -> Self {
        ModelOutput {
            label,
            confidence,
            truncated: false,
        }
    }

    /// Confidence as a signed polarity: negative labels are negated.
    pub fn signed_score(&self) -> f64 {
        match self.label {
            ModelLabel::Positive => self.confidence,
            ModelLabel::Negative => -self.confidence,
        }
    }
}

impl Normalize for ModelOutput {
    fn normalize(self) -> SentimentResult {
        let mut raw = std::collections::BTreeMap::new();
        raw.insert("label".to_string(), self.label.as_str().into());
        raw.insert("confidence".to_string(), self.confidence.into());
        if self.truncated {
            raw.insert("truncated".to_string(), true.into());
        }
        SentimentResult::new(Source::Model, self.signed_score(), raw)
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Asynchronous access to a loaded classifier.
///
/// `ModelHandle` is the production implementation; tests substitute fakes.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ModelOutput, AnalysisError>;
}

// ---------------------------------------------------------------------------
// ModelAnalyzer
// ---------------------------------------------------------------------------

/// Per-call limits applied around the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    /// Inputs longer than this many characters are truncated before
    /// inference, so the tail of a long text does not affect the result.
    pub max_input_chars: usize,
    pub inference_timeout: Duration,
    pub retry_on_timeout: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        ModelSettings {
            max_input_chars: 512,
            inference_timeout: Duration::from_secs(10),
            retry_on_timeout: true,
        }
    }
}

impl From<&ModelConfig> for ModelSettings {
    fn from(config: &ModelConfig) -> Self {
        ModelSettings {
            max_input_chars: config.max_input_chars,
            inference_timeout: Duration::from_millis(config.inference_timeout_ms),
            retry_on_timeout: config.retry_on_timeout,
        }
    }
}

/// Wraps a classifier handle with validation, truncation and timeouts.
///
/// Long inputs are silently shortened to `max_input_chars` characters, and
/// the underlying model may truncate further at its own token limit. Callers
/// should treat long inputs as partially ignored; `ModelOutput::truncated`
/// reports the character-level cut.
pub struct ModelAnalyzer<C> {
    classifier: C,
    settings: ModelSettings,
}

impl<C: Classifier> ModelAnalyzer<C> {
    pub fn new(classifier: C, settings: ModelSettings) -> Self {
        ModelAnalyzer {
            classifier,
            settings,
        }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Run one inference under `inference_timeout`, retrying once if
    /// `retry_on_timeout` is set.
    ///
    /// The worker serves requests one at a time and a timed-out inference is
    /// not cancelled there, so the retry queues behind it. A backend that is
    /// stuck for good therefore times out again.
    async fn classify_with_timeout(&self, text: &str) -> Result<ModelOutput, AnalysisError> {
        let timeout = self.settings.inference_timeout;
        let attempts = if self.settings.retry_on_timeout { 2 } else { 1 };

        for attempt in 1..=attempts {
            match tokio::time::timeout(timeout, self.classifier.classify(text)).await {
                Ok(result) => return result,
                Err(_) => warn!(attempt, ?timeout, "model inference timed out"),
            }
        }

        Err(AnalysisError::inference(
            Source::Model,
            format!("inference timed out after {} ms", timeout.as_millis()),
        ))
    }
}

#[async_trait]
impl<C: Classifier> Analyzer for ModelAnalyzer<C> {
    type Output = ModelOutput;

    fn source(&self) -> Source {
        Source::Model
    }

    async fn analyze(&self, text: &str) -> Result<ModelOutput, AnalysisError> {
        let text = validate_text(text)?;
        let (input, truncated) = truncate_chars(text, self.settings.max_input_chars);
        if truncated {
            info!(
                chars = text.chars().count(),
                limit = self.settings.max_input_chars,
                "input truncated before model inference"
            );
        }

        let mut output = self.classify_with_timeout(input).await?;
        if !output.confidence.is_finite() || !(0.0..=1.0).contains(&output.confidence) {
            return Err(AnalysisError::inference(
                Source::Model,
                format!("confidence {} outside [0, 1]", output.confidence),
            ));
        }
        output.truncated = truncated;
        debug!(
            label = output.label.as_str(),
            confidence = output.confidence,
            "model prediction"
        );
        Ok(output)
    }
}

/// Cut `text` to at most `limit` characters on a char boundary.
pub(crate) fn truncate_chars(text: &str, limit: usize) -> (&str, bool) {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::Label;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Records the text it receives and answers with a fixed output.
    struct Recording {
        output: ModelOutput,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Classifier for Recording {
        async fn classify(&self, text: &str) -> Result<ModelOutput, AnalysisError> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok(self.output)
        }
    }

    /// Hangs for the first `stalls` calls, then answers.
    struct Stalling {
        stalls: usize,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Classifier for Stalling {
        async fn classify(&self, _text: &str) -> Result<ModelOutput, AnalysisError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.stalls {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            Ok(ModelOutput::new(ModelLabel::Positive, 0.9))
        }
    }

    fn recording(label: ModelLabel, confidence: f64) -> Recording {
        Recording {
            output: ModelOutput::new(label, confidence),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn settings(max_input_chars: usize, retry_on_timeout: bool) -> ModelSettings {
        ModelSettings {
            max_input_chars,
            inference_timeout: Duration::from_millis(100),
            retry_on_timeout,
        }
    }

    #[test]
    fn negative_label_negates_confidence() {
        let result = ModelOutput::new(ModelLabel::Negative, 0.98).normalize();
        assert_eq!(result.source, Source::Model);
        assert_eq!(result.score, -0.98);
        assert_eq!(result.label, Label::Negative);
        assert_eq!(result.raw["label"], "NEGATIVE");
        assert_eq!(result.raw_f64("confidence"), Some(0.98));
        assert!(!result.raw.contains_key("truncated"));
    }

    #[test]
    fn low_confidence_maps_to_neutral() {
        let result = ModelOutput::new(ModelLabel::Positive, 0.04).normalize();
        assert_eq!(result.label, Label::Neutral);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), ("hé", true));
        assert_eq!(truncate_chars("héllo", 5), ("héllo", false));
        assert_eq!(truncate_chars("héllo", 10), ("héllo", false));
    }

    #[tokio::test]
    async fn long_input_is_truncated_and_flagged() {
        let analyzer = ModelAnalyzer::new(recording(ModelLabel::Positive, 0.9), settings(5, false));
        let output = analyzer.analyze("abcdefghij").await.unwrap();
        assert!(output.truncated);
        assert_eq!(analyzer.classifier().seen.lock().unwrap()[0], "abcde");
        assert_eq!(output.normalize().raw["truncated"], true);
    }

    #[tokio::test]
    async fn blank_input_never_reaches_classifier() {
        let analyzer = ModelAnalyzer::new(recording(ModelLabel::Positive, 0.9), settings(512, false));
        assert_eq!(analyzer.analyze("   ").await, Err(AnalysisError::InvalidInput));
        assert!(analyzer.classifier().seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn out_of_range_confidence_is_an_inference_error() {
        let analyzer = ModelAnalyzer::new(recording(ModelLabel::Positive, 1.5), settings(512, false));
        let err = analyzer.analyze("fine").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Inference { analyzer: Source::Model, .. }));

        let analyzer =
            ModelAnalyzer::new(recording(ModelLabel::Positive, f64::NAN), settings(512, false));
        assert!(analyzer.analyze("fine").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_without_retry_is_inference_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let analyzer = ModelAnalyzer::new(
            Stalling {
                stalls: 1,
                calls: Arc::clone(&calls),
            },
            settings(512, false),
        );
        let err = analyzer.analyze("hello there").await.unwrap_err();
        match err {
            AnalysisError::Inference { analyzer, message } => {
                assert_eq!(analyzer, Source::Model);
                assert!(message.contains("timed out"));
            }
            other => panic!("expected Inference, got: {other}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_retried_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let analyzer = ModelAnalyzer::new(
            Stalling {
                stalls: 1,
                calls: Arc::clone(&calls),
            },
            settings(512, true),
        );
        let output = analyzer.analyze("hello there").await.unwrap();
        assert_eq!(output.label, ModelLabel::Positive);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn second_timeout_gives_up() {
        let calls = Arc::new(AtomicUsize::new(0));
        let analyzer = ModelAnalyzer::new(
            Stalling {
                stalls: 5,
                calls: Arc::clone(&calls),
            },
            settings(512, true),
        );
        assert!(analyzer.analyze("hello there").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn settings_from_config() {
        let config = ModelConfig {
            identifier: DEFAULT_MODEL.into(),
            inference_timeout_ms: 2500,
            retry_on_timeout: false,
            max_input_chars: 256,
        };
        let settings = ModelSettings::from(&config);
        assert_eq!(settings.inference_timeout, Duration::from_millis(2500));
        assert_eq!(settings.max_input_chars, 256);
        assert!(!settings.retry_on_timeout);
    }
}
