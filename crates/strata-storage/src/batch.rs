//! Batch handle
//!
//! An `ObjectBatch` aggregates copy and delete operations and applies them on
//! `submit`. There is no atomicity across entries. Entries run in the order they
//! were queued, and the batch halts at the first entry whose client call
//! errors: that entry and every later one never resolve.

use crate::client::ObjectClient;
use crate::traits::StorageResult;
use tokio::sync::oneshot;

/// A queued batch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    Copy { from: String, to: String },
    Delete { key: String },
}

impl BatchOperation {
    /// Key reported when the operation does not confirm.
    pub fn key(&self) -> &str {
        match self {
            BatchOperation::Copy { from, .. } => from,
            BatchOperation::Delete { key } => key,
        }
    }
}

/// Outcome of one batch entry, readable once the batch was submitted.
#[derive(Debug)]
pub struct PendingResult {
    receiver: oneshot::Receiver<bool>,
    resolved: Option<bool>,
}

impl PendingResult {
    /// `Some(true)` when the entry was confirmed, `Some(false)` when the store
    /// rejected it, `None` when it never ran.
    pub fn outcome(&mut self) -> Option<bool> {
        if self.resolved.is_none() {
            self.resolved = self.receiver.try_recv().ok();
        }
        self.resolved
    }

    pub fn is_confirmed(&mut self) -> bool {
        self.outcome() == Some(true)
    }
}

struct BatchEntry {
    operation: BatchOperation,
    result: oneshot::Sender<bool>,
}

pub struct ObjectBatch<'a> {
    client: &'a dyn ObjectClient,
    entries: Vec<BatchEntry>,
}

impl<'a> ObjectBatch<'a> {
    pub fn new(client: &'a dyn ObjectClient) -> Self {
        Self {
            client,
            entries: Vec::new(),
        }
    }

    pub fn copy(&mut self, from: impl Into<String>, to: impl Into<String>) -> PendingResult {
        self.push(BatchOperation::Copy {
            from: from.into(),
            to: to.into(),
        })
    }

    pub fn delete(&mut self, key: impl Into<String>) -> PendingResult {
        self.push(BatchOperation::Delete { key: key.into() })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, operation: BatchOperation) -> PendingResult {
        let (result, receiver) = oneshot::channel();
        self.entries.push(BatchEntry { operation, result });
        PendingResult {
            receiver,
            resolved: None,
        }
    }

    /// Apply every queued entry in order.
    ///
    /// Returns the first client error; entries from that point on stay unresolved.
    pub async fn submit(self) -> StorageResult<()> {
        let total = self.entries.len();
        let start = std::time::Instant::now();

        for (index, entry) in self.entries.into_iter().enumerate() {
            let applied = match &entry.operation {
                BatchOperation::Copy { from, to } => self.client.copy(from, to).await.map(|_| true),
                BatchOperation::Delete { key } => self.client.delete(key).await,
            };

            match applied {
                Ok(confirmed) => {
                    if !confirmed {
                        tracing::warn!(
                            key = %entry.operation.key(),
                            "Batch entry was not confirmed by the store"
                        );
                    }
                    // The caller may have dropped its PendingResult.
                    let _ = entry.result.send(confirmed);
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        key = %entry.operation.key(),
                        applied = index,
                        skipped = total - index - 1,
                        "Batch halted on failed entry"
                    );
                    return Err(e);
                }
            }
        }

        tracing::debug!(
            entries = total,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Batch submitted"
        );

        Ok(())
    }
}
