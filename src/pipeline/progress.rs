// User-facing progress messages.
//
// The pipeline reports each step as a plain sentence ("Loaded 120 phrases.").
// Messages go to the caller through an unbounded channel and are mirrored to
// tracing so they also land in the structured log.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::info;

/// Cloneable sender for progress messages. A silent log only traces.
#[derive(Debug, Clone, Default)]
pub struct ProgressLog {
    tx: Option<UnboundedSender<String>>,
}

impl ProgressLog {
    /// A connected log and the receiving end the caller drains.
    pub fn channel() -> (Self, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A log nobody listens to.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn send(&self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "kwcluster::progress", "{}", message);
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody is watching anymore; keep working.
            let _ = tx.send(message);
        }
    }
}
