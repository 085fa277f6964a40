// Runs both analyzers on the same text and maps their native outputs into
// comparable `SentimentResult`s.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::AnalysisError;
use crate::sentiment::{validate_text, Comparison, SentimentResult, Slot, Source};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Maps an analyzer's native output into the unified result shape.
pub trait Normalize {
    fn normalize(self) -> SentimentResult;
}

/// A sentiment analyzer: `analyze(text) -> native output`.
#[async_trait]
pub trait Analyzer: Send + Sync {
    type Output: Normalize + Send;

    fn source(&self) -> Source;

    async fn analyze(&self, text: &str) -> Result<Self::Output, AnalysisError>;
}

// ---------------------------------------------------------------------------
// ResultNormalizer
// ---------------------------------------------------------------------------

/// Compares a lexicon analyzer `L` against a model analyzer `M`.
pub struct ResultNormalizer<L, M> {
    lexicon: L,
    model: M,
}

impl<L: Analyzer, M: Analyzer> ResultNormalizer<L, M> {
    pub fn new(lexicon: L, model: M) -> Self {
        ResultNormalizer { lexicon, model }
    }

    /// Analyze `text` with both analyzers.
    ///
    /// Blank text fails with `InvalidInput` before either analyzer runs. A
    /// per-analyzer failure does not fail the comparison; that analyzer's slot
    /// is marked `Unavailable` instead and no verdict is computed.
    pub async fn compare(&self, text: &str) -> Result<Comparison, AnalysisError> {
        let text = validate_text(text)?;
        debug!(chars = text.chars().count(), "comparing analyzers");

        let (lexicon, model) = tokio::join!(self.lexicon.analyze(text), self.model.analyze(text));
        let comparison = Comparison::from_slots(
            into_slot(self.lexicon.source(), lexicon),
            into_slot(self.model.source(), model),
        );

        match &comparison.verdict {
            Some(verdict) => info!(
                agree = verdict.agree,
                kind = ?verdict.kind,
                score_gap = verdict.score_gap,
                "comparison complete"
            ),
            None => info!("comparison complete with unavailable analyzer"),
        }
        Ok(comparison)
    }
}

fn into_slot<O: Normalize>(source: Source, outcome: Result<O, AnalysisError>) -> Slot {
    match outcome {
        Ok(output) => {
            let result = output.normalize();
            info!(
                %source,
                label = result.label.as_str(),
                score = result.score,
                "analysis complete"
            );
            Slot::Available(result)
        }
        Err(e) => {
            warn!(%source, "analyzer unavailable: {e}");
            Slot::Unavailable {
                source,
                reason: e.to_string(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::LexiconAnalyzer;
    use crate::model::{Classifier, ModelAnalyzer, ModelLabel, ModelOutput, ModelSettings};
    use crate::sentiment::{AgreementKind, Label};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fixed answer, counting calls.
    struct FixedClassifier {
        output: Result<ModelOutput, AnalysisError>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Classifier for FixedClassifier {
        async fn classify(&self, _text: &str) -> Result<ModelOutput, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.output.clone()
        }
    }

    /// Lexicon stand-in that always fails.
    struct BrokenLexicon;

    #[async_trait]
    impl Analyzer for BrokenLexicon {
        type Output = crate::lexicon::LexiconOutput;

        fn source(&self) -> Source {
            Source::Lexicon
        }

        async fn analyze(&self, _text: &str) -> Result<Self::Output, AnalysisError> {
            Err(AnalysisError::inference(Source::Lexicon, "lexicon offline"))
        }
    }

    fn normalizer(
        output: Result<ModelOutput, AnalysisError>,
    ) -> (
        ResultNormalizer<LexiconAnalyzer, ModelAnalyzer<FixedClassifier>>,
        Arc<AtomicUsize>,
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let classifier = FixedClassifier {
            output,
            calls: Arc::clone(&calls),
        };
        let normalizer = ResultNormalizer::new(
            LexiconAnalyzer::bundled().unwrap(),
            ModelAnalyzer::new(classifier, ModelSettings::default()),
        );
        (normalizer, calls)
    }

    #[tokio::test]
    async fn blank_text_runs_no_analyzer() {
        let (normalizer, calls) = normalizer(Ok(ModelOutput::new(ModelLabel::Positive, 0.99)));
        assert_eq!(normalizer.compare("").await, Err(AnalysisError::InvalidInput));
        assert_eq!(normalizer.compare("   ").await, Err(AnalysisError::InvalidInput));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn both_analyzers_agree_on_praise() {
        let (normalizer, _) = normalizer(Ok(ModelOutput::new(ModelLabel::Positive, 0.9998)));
        let comparison = normalizer
            .compare("I absolutely love this, it's wonderful!")
            .await
            .unwrap();

        let lexicon = comparison.lexicon.result().unwrap();
        assert_eq!(lexicon.source, Source::Lexicon);
        assert!(lexicon.score > 0.5);
        assert_eq!(lexicon.label, Label::Positive);

        let model = comparison.model.result().unwrap();
        assert!(model.score > 0.9);
        assert_eq!(model.label, Label::Positive);

        let verdict = comparison.verdict.unwrap();
        assert!(verdict.agree);
        assert_eq!(verdict.kind, AgreementKind::Agree);
    }

    #[tokio::test]
    async fn both_analyzers_agree_on_complaint() {
        let (normalizer, _) = normalizer(Ok(ModelOutput::new(ModelLabel::Negative, 0.9997)));
        let comparison = normalizer
            .compare("This is the worst experience I've ever had.")
            .await
            .unwrap();
        assert_eq!(comparison.lexicon.result().unwrap().label, Label::Negative);
        let model = comparison.model.result().unwrap();
        assert_eq!(model.label, Label::Negative);
        assert!(model.score < -0.9);
        assert!(comparison.verdict.unwrap().agree);
    }

    #[tokio::test]
    async fn neutral_fact_can_disagree() {
        let (normalizer, _) = normalizer(Ok(ModelOutput::new(ModelLabel::Positive, 0.98)));
        let comparison = normalizer.compare("The meeting is at 3pm.").await.unwrap();
        assert_eq!(comparison.lexicon.result().unwrap().label, Label::Neutral);
        assert_eq!(comparison.model.result().unwrap().label, Label::Positive);

        let verdict = comparison.verdict.unwrap();
        assert!(!verdict.agree);
        assert_eq!(verdict.kind, AgreementKind::Disagree);
        assert!((verdict.score_gap - 0.98).abs() < 1e-9);
    }

    #[tokio::test]
    async fn model_failure_keeps_lexicon_result() {
        let (normalizer, calls) = normalizer(Err(AnalysisError::inference(
            Source::Model,
            "tensor shape mismatch",
        )));
        let comparison = normalizer.compare("What a lovely day").await.unwrap();

        assert_eq!(comparison.lexicon.result().unwrap().label, Label::Positive);
        match &comparison.model {
            Slot::Unavailable { source, reason } => {
                assert_eq!(*source, Source::Model);
                assert!(reason.contains("tensor shape mismatch"));
            }
            other => panic!("expected Unavailable, got: {other:?}"),
        }
        assert!(comparison.verdict.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn both_failures_are_still_a_comparison() {
        let calls = Arc::new(AtomicUsize::new(0));
        let normalizer = ResultNormalizer::new(
            BrokenLexicon,
            ModelAnalyzer::new(
                FixedClassifier {
                    output: Err(AnalysisError::inference(Source::Model, "offline")),
                    calls,
                },
                ModelSettings::default(),
            ),
        );
        let comparison = normalizer.compare("anything").await.unwrap();
        assert!(!comparison.lexicon.is_available());
        assert!(!comparison.model.is_available());
        assert!(comparison.verdict.is_none());
    }

    #[tokio::test]
    async fn repeated_comparisons_are_identical() {
        let (normalizer, _) = normalizer(Ok(ModelOutput::new(ModelLabel::Negative, 0.87)));
        let text = "The food was good but the service was terrible!";
        let first = normalizer.compare(text).await.unwrap();
        let second = normalizer.compare(text).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn scores_stay_in_range() {
        let (normalizer, _) = normalizer(Ok(ModelOutput::new(ModelLabel::Negative, 1.0)));
        for text in [
            "love love love love love love love!!!!",
            "worst worst worst worst worst!!!!",
            "a",
            "The meeting is at 3pm.",
        ] {
            let comparison = normalizer.compare(text).await.unwrap();
            for slot in [&comparison.lexicon, &comparison.model] {
                let score = slot.result().unwrap().score;
                assert!((-1.0..=1.0).contains(&score), "{text}: {score}");
            }
        }
    }
}
