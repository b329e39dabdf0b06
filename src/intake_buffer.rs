//! # Intake Buffer Module
//!
//! Groups attachments that were sent together (same platform group id) into
//! one batch so they are saved and reported once. Each open batch has a
//! debounce timer; every new attachment in the group restarts it, and when it
//! fires the batch is handed to the sink and forgotten.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::dialogue::UserKey;
use crate::persister::Attachment;

/// Default quiet period after the last attachment of a group
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

/// Attachments persisted together as one unit
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    pub user: UserKey,
    /// Platform group id; `None` for an attachment sent on its own
    pub group: Option<String>,
    /// In arrival order
    pub attachments: Vec<Attachment>,
}

/// Consumer of closed batches
#[async_trait]
pub trait BatchSink: Send + Sync + 'static {
    async fn flush(&self, batch: Batch);
}

type BatchKey = (UserKey, String);

struct PendingBatch {
    attachments: Vec<Attachment>,
    generation: u64,
    timer: AbortHandle,
}

struct BufferState {
    pending: HashMap<BatchKey, PendingBatch>,
    next_generation: u64,
    /// Timer tasks, including those already flushing their batch
    tasks: JoinSet<()>,
}

/// Process-wide buffer of open batches.
///
/// Cloning yields another handle to the same buffer.
pub struct IntakeBuffer<S: BatchSink> {
    state: Arc<Mutex<BufferState>>,
    sink: Arc<S>,
    window: Duration,
}

impl<S: BatchSink> Clone for IntakeBuffer<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            sink: Arc::clone(&self.sink),
            window: self.window,
        }
    }
}

impl<S: BatchSink> IntakeBuffer<S> {
    pub fn new(sink: Arc<S>, window: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(BufferState {
                pending: HashMap::new(),
                next_generation: 0,
                tasks: JoinSet::new(),
            })),
            sink,
            window,
        }
    }

    /// Accept one attachment.
    ///
    /// Without a group the attachment is flushed as a batch of one before
    /// returning. With a group it joins the open batch for `(user, group)`,
    /// or opens a new one, and the debounce timer is restarted.
    pub async fn ingest(&self, user: UserKey, group: Option<String>, attachment: Attachment) {
        let Some(group) = group else {
            debug!(user_id = user, "Single attachment, flushing immediately");
            self.sink
                .flush(Batch {
                    user,
                    group: None,
                    attachments: vec![attachment],
                })
                .await;
            return;
        };

        let mut state = self.state.lock().await;
        while state.tasks.try_join_next().is_some() {}

        state.next_generation += 1;
        let generation = state.next_generation;
        let key = (user, group);
        let timer = self.schedule_flush(&mut state.tasks, key.clone(), generation);

        match state.pending.get_mut(&key) {
            Some(pending) => {
                pending.timer.abort();
                pending.timer = timer;
                pending.generation = generation;
                pending.attachments.push(attachment);
                debug!(
                    user_id = user,
                    group = %key.1,
                    size = pending.attachments.len(),
                    "Attachment added to open batch"
                );
            }
            None => {
                debug!(user_id = user, group = %key.1, "Opening new batch");
                state.pending.insert(
                    key,
                    PendingBatch {
                        attachments: vec![attachment],
                        generation,
                        timer,
                    },
                );
            }
        }
    }

    fn schedule_flush(
        &self,
        tasks: &mut JoinSet<()>,
        key: BatchKey,
        generation: u64,
    ) -> AbortHandle {
        let buffer = self.clone();
        tasks.spawn(async move {
            tokio::time::sleep(buffer.window).await;
            buffer.close(key, generation).await;
        })
    }

    /// Remove the batch if its timer is still the current one, then flush it
    async fn close(&self, key: BatchKey, generation: u64) {
        let batch = {
            let mut state = self.state.lock().await;
            match state.pending.get(&key) {
                Some(pending) if pending.generation == generation => {
                    state.pending.remove(&key).map(|pending| pending.attachments)
                }
                _ => None,
            }
        };

        if let Some(attachments) = batch {
            let (user, group) = key;
            info!(user_id = user, group = %group, size = attachments.len(), "Batch closed");
            self.sink
                .flush(Batch {
                    user,
                    group: Some(group),
                    attachments,
                })
                .await;
        }
    }

    /// Number of batches still waiting for their timer
    pub async fn pending_batches(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Flush every open batch now without waiting for the timers, then wait
    /// for batches whose timer already fired to finish flushing.
    ///
    /// Called on shutdown.
    pub async fn flush_all(&self) {
        let (drained, mut in_flight): (Vec<(BatchKey, PendingBatch)>, JoinSet<()>) = {
            let mut state = self.state.lock().await;
            let drained = state.pending.drain().collect();
            (drained, std::mem::replace(&mut state.tasks, JoinSet::new()))
        };

        if !drained.is_empty() {
            info!(batches = drained.len(), "Flushing open batches");
        }

        for ((user, group), pending) in drained {
            pending.timer.abort();
            self.sink
                .flush(Batch {
                    user,
                    group: Some(group),
                    attachments: pending.attachments,
                })
                .await;
        }

        while let Some(result) = in_flight.join_next().await {
            if let Err(e) = result {
                if !e.is_cancelled() {
                    warn!(error = %e, "Batch flush task failed");
                }
            }
        }
    }
}
