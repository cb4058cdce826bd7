//! Bounded-concurrency fan-out of one prompt to many models

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::llm::provider::ModelClient;
use crate::llm::result::{CallFailure, ModelId, ModelResult};

/// Fans a prompt out to every model, `limit` calls at a time
pub struct Dispatcher {
    client: ModelClient,
    limit: NonZeroUsize,
}

impl Dispatcher {
    pub fn new(client: ModelClient, limit: NonZeroUsize) -> Self {
        Self { client, limit }
    }

    /// Ask every model. The result has one entry per model, in input order.
    pub async fn dispatch_all(&self, prompt: &str, models: &[ModelId]) -> Vec<ModelResult> {
        let started = Instant::now();
        let gate = Arc::new(Semaphore::new(self.limit.get()));
        let prompt: Arc<str> = Arc::from(prompt);

        // Dropping the set aborts every call still queued or in flight
        let mut tasks = JoinSet::new();
        for (index, model) in models.iter().cloned().enumerate() {
            let gate = Arc::clone(&gate);
            let client = self.client.clone();
            let prompt = Arc::clone(&prompt);

            tasks.spawn(async move {
                // Held until the call and any retry are done
                let _permit = match gate.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let failure = CallFailure::Transport("dispatch gate closed".to_string());
                        return (index, ModelResult::failure(model, failure));
                    }
                };
                (index, client.fetch(&model, &prompt).await)
            });
        }

        // Each result lands in its model's slot regardless of completion order
        let mut slots: Vec<Option<ModelResult>> = models.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(err) => warn!(error = %err, "dispatch task did not complete"),
            }
        }

        let results: Vec<ModelResult> = slots
            .into_iter()
            .zip(models)
            .map(|(slot, model)| {
                slot.unwrap_or_else(|| {
                    ModelResult::failure(
                        model.clone(),
                        CallFailure::Transport("dispatch task failed".to_string()),
                    )
                })
            })
            .collect();

        info!(
            models = models.len(),
            failed = results.iter().filter(|r| r.is_failure()).count(),
            limit = self.limit.get(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dispatch phase complete"
        );

        results
    }
}
