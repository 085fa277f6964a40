// Pretrained transformer backend (DistilBERT fine-tuned on SST-2).
//
// Compiled in with the `transformer` cargo feature, which links libtorch
// through rust-bert. Without it, loading fails at startup with `ModelLoad`.

use super::ModelHandle;
use crate::error::AnalysisError;

/// The binary sentiment model rust-bert ships as its default pipeline.
pub const DEFAULT_MODEL: &str = "distilbert-base-uncased-finetuned-sst-2-english";

/// Load the transformer named by `model_id` on a dedicated worker thread.
///
/// Resources are fetched into the rust-bert cache on first use, so the first
/// start may take a while.
pub async fn load_transformer(model_id: &str) -> Result<ModelHandle, AnalysisError> {
    if model_id != DEFAULT_MODEL {
        return Err(AnalysisError::ModelLoad {
            model: model_id.to_string(),
            message: format!("unknown model identifier; supported: {DEFAULT_MODEL}"),
        });
    }
    backend::load(model_id).await
}

#[cfg(feature = "transformer")]
mod backend {
    use rust_bert::pipelines::sentiment::{SentimentModel, SentimentPolarity};
    use tracing::info;

    use crate::error::AnalysisError;
    use crate::model::{ModelHandle, ModelLabel, ModelOutput, TextClassifier};
    use crate::sentiment::Source;

    struct RustBertClassifier {
        model: SentimentModel,
    }

    impl TextClassifier for RustBertClassifier {
        fn classify(&mut self, text: &str) -> Result<ModelOutput, AnalysisError> {
            let sentiment = self.model.predict(&[text]).pop().ok_or_else(|| {
                AnalysisError::inference(Source::Model, "model returned no prediction")
            })?;
            let label = match sentiment.polarity {
                SentimentPolarity::Positive => ModelLabel::Positive,
                SentimentPolarity::Negative => ModelLabel::Negative,
            };
            Ok(ModelOutput::new(label, sentiment.score))
        }
    }

    pub(super) async fn load(model_id: &str) -> Result<ModelHandle, AnalysisError> {
        info!("Loading transformer model {model_id}");
        let model = model_id.to_string();
        ModelHandle::spawn(model_id, move || {
            SentimentModel::new(Default::default())
                .map(|model| RustBertClassifier { model })
                .map_err(|e| AnalysisError::ModelLoad {
                    model,
                    message: e.to_string(),
                })
        })
        .await
    }
}

#[cfg(not(feature = "transformer"))]
mod backend {
    use crate::error::AnalysisError;
    use crate::model::ModelHandle;

    pub(super) async fn load(model_id: &str) -> Result<ModelHandle, AnalysisError> {
        Err(AnalysisError::ModelLoad {
            model: model_id.to_string(),
            message: "built without the `transformer` feature; rebuild with \
                      `--features transformer`"
                .into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_identifier_fails_fast() {
        let err = load_transformer("bert-made-up").await.unwrap_err();
        match err {
            AnalysisError::ModelLoad { model, message } => {
                assert_eq!(model, "bert-made-up");
                assert!(message.contains(DEFAULT_MODEL));
            }
            other => panic!("expected ModelLoad, got: {other}"),
        }
    }

    #[cfg(not(feature = "transformer"))]
    #[tokio::test]
    async fn default_model_needs_feature() {
        let err = load_transformer(DEFAULT_MODEL).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("--features transformer"));
    }
}
