//! # Accumulator Task
//!
//! Single-owner alternative to `SharedAccumulator`: one tokio task owns the
//! accumulator outright and applies commands from a bounded queue in
//! submission order. No lock exists, so there is nothing to poison.
//!
//! ```text
//! AccumulatorHandle ──mpsc (bounded)──→ AccumulatorTask
//!        ↑                                   │
//!        └──────────── oneshot reply ────────┘
//! ```
//!
//! Batches are mapped on the blocking pool by the handle, so the task
//! itself only performs group additions.
//!
//! `discard` stops the task. Commands sent afterwards fail with
//! `AccumulatorError::Discarded`.

use crate::domain::{
    map_mutations_parallel, sum, AccumulatorConfig, AccumulatorError, Checksum, ChecksumEnvelope,
    MultisetHash, MutationBatch,
};
use shared_crypto::{PrimeOrderGroup, Ristretto255};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type Point = <Ristretto255 as PrimeOrderGroup>::Element;

/// Commands processed by `AccumulatorTask`.
#[derive(Debug)]
pub enum AccumulatorCommand {
    Add {
        record: Vec<u8>,
        reply: oneshot::Sender<Checksum>,
    },
    Remove {
        record: Vec<u8>,
        reply: oneshot::Sender<Checksum>,
    },
    /// Pre-mapped batch delta with its record counts.
    ApplyDelta {
        delta: Point,
        added: u64,
        removed: u64,
        reply: oneshot::Sender<Checksum>,
    },
    Envelope {
        reply: oneshot::Sender<ChecksumEnvelope>,
    },
    Discard {
        reply: oneshot::Sender<ChecksumEnvelope>,
    },
}

/// Owns the accumulator; runs until discarded or every handle is dropped.
pub struct AccumulatorTask {
    hash: MultisetHash<Ristretto255>,
    record_count: u64,
    config: AccumulatorConfig,
    receiver: mpsc::Receiver<AccumulatorCommand>,
}

impl AccumulatorTask {
    /// Create a task at the identity plus the handle that drives it.
    pub fn new(config: AccumulatorConfig) -> Result<(Self, AccumulatorHandle), AccumulatorError> {
        config.validate()?;

        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let handle = AccumulatorHandle {
            sender,
            domain_tag: config.domain_tag.clone(),
            parallel_threshold: config.parallel_threshold,
        };
        let task = Self {
            hash: MultisetHash::new(config.domain_tag.clone()),
            record_count: 0,
            config,
            receiver,
        };
        Ok((task, handle))
    }

    /// Process commands until discarded. Returns the final envelope.
    pub async fn run(mut self) -> ChecksumEnvelope {
        info!(
            "[qc-04] Accumulator task started (queue capacity {})",
            self.config.queue_capacity
        );

        while let Some(command) = self.receiver.recv().await {
            match command {
                AccumulatorCommand::Add { record, reply } => {
                    self.hash.add_bytes(&record);
                    self.record_count = self.record_count.saturating_add(1);
                    let _ = reply.send(self.hash.checksum());
                }
                AccumulatorCommand::Remove { record, reply } => {
                    self.hash.remove_bytes(&record);
                    self.count_removed(1);
                    let _ = reply.send(self.hash.checksum());
                }
                AccumulatorCommand::ApplyDelta {
                    delta,
                    added,
                    removed,
                    reply,
                } => {
                    self.hash.add_element(&delta);
                    self.record_count = self.record_count.saturating_add(added);
                    self.count_removed(removed);
                    debug!("[qc-04] Task applied batch: +{} -{}", added, removed);
                    let _ = reply.send(self.hash.checksum());
                }
                AccumulatorCommand::Envelope { reply } => {
                    let _ = reply.send(self.envelope());
                }
                AccumulatorCommand::Discard { reply } => {
                    let _ = reply.send(self.envelope());
                    break;
                }
            }
        }

        // Anything still queued is dropped; senders see closed replies.
        self.receiver.close();
        let envelope = self.envelope();
        info!(
            "[qc-04] Accumulator task stopped at {} ({} records)",
            envelope.checksum, envelope.record_count
        );
        envelope
    }

    fn count_removed(&mut self, n: u64) {
        if n > self.record_count {
            warn!(
                "[qc-04] Removing {} records from a state of {}; unbalanced remove",
                n, self.record_count
            );
        }
        self.record_count = self.record_count.saturating_sub(n);
    }

    fn envelope(&self) -> ChecksumEnvelope {
        let mut envelope = ChecksumEnvelope::new(self.hash.checksum(), self.record_count);
        envelope.format_version = self.config.format_version;
        envelope
    }
}

/// Spawn an accumulator task on the current runtime.
pub fn spawn(
    config: AccumulatorConfig,
) -> Result<(AccumulatorHandle, JoinHandle<ChecksumEnvelope>), AccumulatorError> {
    let (task, handle) = AccumulatorTask::new(config)?;
    Ok((handle, tokio::spawn(task.run())))
}

/// Cloneable sender side of an `AccumulatorTask`.
#[derive(Clone, Debug)]
pub struct AccumulatorHandle {
    sender: mpsc::Sender<AccumulatorCommand>,
    domain_tag: Vec<u8>,
    parallel_threshold: usize,
}

impl AccumulatorHandle {
    pub async fn add(&self, record: impl Into<Vec<u8>>) -> Result<Checksum, AccumulatorError> {
        let record = record.into();
        self.request(|reply| AccumulatorCommand::Add { record, reply })
            .await
    }

    pub async fn remove(&self, record: impl Into<Vec<u8>>) -> Result<Checksum, AccumulatorError> {
        let record = record.into();
        self.request(|reply| AccumulatorCommand::Remove { record, reply })
            .await
    }

    /// Map the batch on the blocking pool, then apply it as one command.
    pub async fn apply_batch(&self, batch: MutationBatch) -> Result<Checksum, AccumulatorError> {
        let added = batch.additions() as u64;
        let removed = batch.removals() as u64;

        let domain_tag = self.domain_tag.clone();
        let threshold = self.parallel_threshold;
        let delta = tokio::task::spawn_blocking(move || {
            sum::<Ristretto255>(map_mutations_parallel::<Ristretto255>(
                batch.mutations(),
                &domain_tag,
                threshold,
            ))
        })
        .await
        .map_err(|_| AccumulatorError::ChannelClosed)?;

        self.request(|reply| AccumulatorCommand::ApplyDelta {
            delta,
            added,
            removed,
            reply,
        })
        .await
    }

    pub async fn revert_batch(&self, batch: &MutationBatch) -> Result<Checksum, AccumulatorError> {
        self.apply_batch(batch.inverse()).await
    }

    pub async fn envelope(&self) -> Result<ChecksumEnvelope, AccumulatorError> {
        self.request(|reply| AccumulatorCommand::Envelope { reply })
            .await
    }

    pub async fn checksum(&self) -> Result<Checksum, AccumulatorError> {
        Ok(self.envelope().await?.checksum)
    }

    /// Stop the task and return its final envelope.
    pub async fn discard(&self) -> Result<ChecksumEnvelope, AccumulatorError> {
        self.request(|reply| AccumulatorCommand::Discard { reply })
            .await
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> AccumulatorCommand,
    ) -> Result<T, AccumulatorError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(command(reply))
            .await
            .map_err(|_| AccumulatorError::Discarded)?;
        response.await.map_err(|_| AccumulatorError::ChannelClosed)
    }
}
