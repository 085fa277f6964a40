// Dedicated inference thread that owns a loaded model for the process lifetime.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::{Classifier, ModelOutput};
use crate::error::AnalysisError;
use crate::sentiment::Source;

/// Requests waiting for the worker beyond this are back-pressured.
const REQUEST_QUEUE: usize = 16;

/// A blocking inference backend.
///
/// Implementations are constructed on the worker thread by the loader passed
/// to [`ModelHandle::spawn`], so they need not be `Send`.
pub trait TextClassifier {
    fn classify(&mut self, text: &str) -> Result<ModelOutput, AnalysisError>;
}

struct Request {
    text: String,
    reply: oneshot::Sender<Result<ModelOutput, AnalysisError>>,
}

/// Owned handle to a model loaded once on its own thread.
///
/// Cloning the handle shares the same worker. The worker stops when the last
/// handle is dropped.
#[derive(Debug, Clone)]
pub struct ModelHandle {
    model_id: Arc<str>,
    tx: mpsc::Sender<Request>,
}

impl ModelHandle {
    /// Start the worker thread and run `loader` on it exactly once.
    ///
    /// Returns `ModelLoad` if the loader fails or panics; load failures are
    /// not retried.
    pub async fn spawn<T, F>(model_id: &str, loader: F) -> Result<ModelHandle, AnalysisError>
    where
        T: TextClassifier + 'static,
        F: FnOnce() -> Result<T, AnalysisError> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<Request>(REQUEST_QUEUE);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), AnalysisError>>();
        let worker_model = model_id.to_string();

        std::thread::Builder::new()
            .name("model-worker".into())
            .spawn(move || {
                let mut classifier = match loader() {
                    Ok(classifier) => {
                        let _ = ready_tx.send(Ok(()));
                        classifier
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                while let Some(request) = rx.blocking_recv() {
                    let result = classifier.classify(&request.text);
                    // The caller may have timed out and gone away.
                    let _ = request.reply.send(result);
                }
                debug!(model = %worker_model, "model worker stopped");
            })
            .map_err(|e| AnalysisError::ModelLoad {
                model: model_id.to_string(),
                message: format!("failed to start model worker: {e}"),
            })?;

        match ready_rx.await {
            Ok(Ok(())) => {
                info!("Model {model_id} loaded");
                Ok(ModelHandle {
                    model_id: Arc::from(model_id),
                    tx,
                })
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AnalysisError::ModelLoad {
                model: model_id.to_string(),
                message: "model worker exited while loading".into(),
            }),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn worker_stopped() -> AnalysisError {
    AnalysisError::inference(Source::Model, "model worker stopped")
}

#[async_trait]
impl Classifier for ModelHandle {
    async fn classify(&self, text: &str) -> Result<ModelOutput, AnalysisError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Request {
                text: text.to_string(),
                reply,
            })
            .await
            .map_err(|_| worker_stopped())?;
        response.await.map_err(|_| worker_stopped())?
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
