// Background execution of a pipeline run.
//
// The pipeline is synchronous and CPU/model-bound, so it runs on a tokio
// blocking thread. The caller gets a handle with two channels: progress
// messages (unbounded, drained on a timer) and a one-shot completion carrying
// the outcome. There is no cancellation; a started run goes to the end.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, error};

use super::orchestrator::{Pipeline, PipelineOutcome};
use super::progress::ProgressLog;

/// Handle to a running pipeline.
pub struct PipelineHandle {
    logs: UnboundedReceiver<String>,
    done: oneshot::Receiver<PipelineOutcome>,
}

/// Start `pipeline` on a blocking worker. Any log already attached to the
/// pipeline is replaced by the handle's channel.
pub fn spawn_pipeline(pipeline: Pipeline) -> PipelineHandle {
    let (log, logs) = ProgressLog::channel();
    let (tx, done) = oneshot::channel();
    let pipeline = pipeline.with_log(log);

    tokio::task::spawn_blocking(move || {
        let outcome = pipeline.run();
        if tx.send(outcome).is_err() {
            debug!("Pipeline finished but the handle was dropped");
        }
    });

    PipelineHandle { logs, done }
}

impl PipelineHandle {
    /// Non-blocking: every message queued so far, in order.
    pub fn drain(&mut self) -> Vec<String> {
        let mut messages = Vec::new();
        while let Ok(message) = self.logs.try_recv() {
            messages.push(message);
        }
        messages
    }

    /// Poll every `poll` until the run completes, passing each progress
    /// message to `on_message` as it is drained. Messages sent right before
    /// completion are still delivered.
    pub async fn wait<F>(mut self, poll: Duration, mut on_message: F) -> Result<PipelineOutcome>
    where
        F: FnMut(String),
    {
        let mut ticker = tokio::time::interval(poll);
        loop {
            ticker.tick().await;
            for message in self.drain() {
                on_message(message);
            }

            match self.done.try_recv() {
                Ok(outcome) => {
                    for message in self.drain() {
                        on_message(message);
                    }
                    return Ok(outcome);
                }
                Err(TryRecvError::Empty) => continue,
                Err(TryRecvError::Closed) => {
                    for message in self.drain() {
                        on_message(message);
                    }
                    error!("Pipeline worker exited without a result");
                    anyhow::bail!("Pipeline worker exited without a result");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::PipelineConfig;
    use crate::embeddings::hashing::HashingEmbedder;

    #[tokio::test]
    async fn test_wait_delivers_all_messages_then_outcome() {
        let lines = vec!["apple pie".to_string(), "banana".to_string()];
        let mut config = PipelineConfig::from_lines(lines);
        config.user_keys = vec!["apple".to_string(), "banana".to_string()];

        let handle = spawn_pipeline(Pipeline::new(config, Arc::new(HashingEmbedder::default())));

        let mut messages = Vec::new();
        let outcome = handle
            .wait(Duration::from_millis(5), |m| messages.push(m))
            .await
            .unwrap();

        assert_eq!(messages.first().map(String::as_str), Some("Loaded 2 phrases."));
        assert_eq!(
            messages.last().map(String::as_str),
            Some("No phrases left for K-means clustering.")
        );
        assert_eq!(outcome.clusters.len(), 2);
    }
}
