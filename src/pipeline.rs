//! The media transfer pipeline: three sequential passes over a group.
//!
//! Photos are swept first, then videos, then documents. Every matched message
//! is downloaded and uploaded before the next one is fetched, and a pass does
//! not start until the previous one has finished.

use std::path::{Path, PathBuf};

use crate::checkpoint::Checkpoint;
use crate::config::{FailurePolicy, TransferConfig};
use crate::error::{Error, Result, TransferStage};
use crate::fs::{FileSystem, TokioFileSystem};
use crate::media::{GroupInfo, MediaKind, MediaMessage};
use crate::messaging::{MessageCursor, MessagingClient};
use crate::stats::{PassStats, TransferStats, TransferStatsBuilder};
use crate::storage::{RemoteObject, RemoteStore};
use crate::upload::Uploader;

/// Trait for receiving transfer progress updates.
///
/// All methods have default no-op implementations.
pub trait TransferProgress: Send + Sync {
    /// Called before a pass starts enumerating.
    fn on_pass_start(&self, _kind: MediaKind) {}

    /// Called after an attachment lands on local disk.
    fn on_downloaded(&self, _kind: MediaKind, _path: &Path, _size: u64) {}

    /// Called after the remote object is committed.
    fn on_uploaded(&self, _kind: MediaKind, _path: &Path, _object: &RemoteObject) {}

    /// Called when a message is skipped because the checkpoint has it.
    fn on_skipped(&self, _kind: MediaKind, _message_id: i32) {}

    /// Called when a download or upload fails.
    fn on_failed(&self, _kind: MediaKind, _message_id: i32, _error: &Error) {}

    /// Called when a pass has processed every message.
    fn on_pass_complete(&self, _kind: MediaKind, _stats: &PassStats) {}
}

/// A null progress implementation that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl TransferProgress for NoProgress {}

/// Result of moving one message.
#[derive(Debug)]
pub enum TransferOutcome {
    Transferred {
        local_path: PathBuf,
        remote: RemoteObject,
        size: u64,
    },
    Failed(Error),
}

/// A failed item recorded under [`FailurePolicy::Continue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFailure {
    pub kind: MediaKind,
    pub message_id: i32,
    pub error: String,
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct TransferReport {
    pub stats: TransferStats,
    /// Always empty under [`FailurePolicy::Abort`].
    pub failures: Vec<TransferFailure>,
}

impl TransferReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turns recorded failures into an aggregate error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incomplete`] if any item failed.
    pub fn into_result(self) -> Result<TransferStats> {
        if self.is_complete() {
            Ok(self.stats)
        } else {
            Err(Error::Incomplete {
                failed: self.failures.len(),
                attempted: self.stats.attempted(),
            })
        }
    }
}

/// Drives the three media passes for one group.
pub struct Pipeline<'c, C: MessagingClient, F: FileSystem = TokioFileSystem> {
    client: &'c C,
    uploader: Uploader,
    config: TransferConfig,
    fs: F,
    checkpoint: Option<Checkpoint>,
}

impl<'c, C: MessagingClient> Pipeline<'c, C, TokioFileSystem> {
    /// Creates a pipeline with the default file system.
    #[must_use]
    pub const fn new(client: &'c C, uploader: Uploader, config: TransferConfig) -> Self {
        Self::with_fs(client, uploader, config, TokioFileSystem)
    }
}

impl<'c, C: MessagingClient, F: FileSystem> Pipeline<'c, C, F> {
    /// Creates a pipeline with a custom file system implementation.
    #[must_use]
    pub const fn with_fs(client: &'c C, uploader: Uploader, config: TransferConfig, fs: F) -> Self {
        Self {
            client,
            uploader,
            config,
            fs,
            checkpoint: None,
        }
    }

    /// Skips messages already in `checkpoint` and records new transfers in it.
    #[must_use]
    pub fn with_checkpoint(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &TransferConfig {
        &self.config
    }

    #[must_use]
    pub const fn checkpoint(&self) -> Option<&Checkpoint> {
        self.checkpoint.as_ref()
    }

    /// Runs the photo, video and document passes over `group`.
    ///
    /// # Errors
    ///
    /// Enumeration errors and checkpoint write errors always abort the run.
    /// Per-item download/upload failures abort under
    /// [`FailurePolicy::Abort`] as [`Error::Transfer`]. Under
    /// [`FailurePolicy::Continue`] they are recorded in the report instead.
    pub async fn run<S: RemoteStore + ?Sized>(
        &mut self,
        group: &GroupInfo,
        store: &S,
        progress: &dyn TransferProgress,
    ) -> Result<TransferReport> {
        self.fs.create_dir_all(&self.config.download_dir).await?;

        let mut stats = TransferStatsBuilder::new();
        let mut failures = Vec::new();

        for kind in MediaKind::ALL {
            log::info!("Starting {kind} pass over group {}", group.group_id);
            progress.on_pass_start(kind);
            stats.start_pass(kind);

            let mut cursor = self.client.messages(group, kind);
            while let Some(message) = cursor.next().await? {
                let message_id = message.id();
                if message.payload_kind() != Some(kind) {
                    log::debug!("Message {message_id} has no {kind} payload, skipping");
                    continue;
                }
                stats.add_matched(kind);

                if self
                    .checkpoint
                    .as_ref()
                    .is_some_and(|c| c.contains(group.group_id, kind, message_id))
                {
                    log::debug!("Message {message_id} already transferred, skipping");
                    stats.add_skipped(kind);
                    progress.on_skipped(kind, message_id);
                    continue;
                }

                match self.transfer(&message, kind, store, progress).await {
                    TransferOutcome::Transferred { size, .. } => {
                        stats.add_transfer(kind, size);
                        if let Some(checkpoint) = self.checkpoint.as_mut() {
                            checkpoint.record(group.group_id, kind, message_id)?;
                        }
                    }
                    TransferOutcome::Failed(error) => {
                        stats.add_failure(kind);
                        progress.on_failed(kind, message_id, &error);
                        match self.config.failure_policy {
                            FailurePolicy::Abort => return Err(error),
                            FailurePolicy::Continue => {
                                log::error!("{error}");
                                failures.push(TransferFailure {
                                    kind,
                                    message_id,
                                    error: error.to_string(),
                                });
                            }
                        }
                    }
                }
            }

            let pass = stats.pass(kind);
            log::info!(
                "Finished {kind} pass: {} transferred, {} skipped, {} failed",
                pass.transferred,
                pass.skipped,
                pass.failed
            );
            progress.on_pass_complete(kind, &pass);
        }

        Ok(TransferReport {
            stats: stats.build(),
            failures,
        })
    }

    /// Downloads one message's attachment and uploads the resulting file.
    pub async fn transfer<S: RemoteStore + ?Sized>(
        &self,
        message: &C::Message,
        kind: MediaKind,
        store: &S,
        progress: &dyn TransferProgress,
    ) -> TransferOutcome {
        let message_id = message.id();
        let failed = |stage, error: Error| {
            TransferOutcome::Failed(Error::Transfer {
                stage,
                kind,
                message_id,
                reason: error.to_string(),
            })
        };

        let local_path = match self
            .client
            .download(message, kind, &self.config.download_dir)
            .await
        {
            Ok(path) => path,
            Err(e) => return failed(TransferStage::Download, e),
        };
        let size = self.fs.file_size(&local_path).await.unwrap_or(0);
        progress.on_downloaded(kind, &local_path, size);

        match self.uploader.upload(store, &local_path).await {
            Ok(remote) => {
                progress.on_uploaded(kind, &local_path, &remote);
                TransferOutcome::Transferred {
                    local_path,
                    remote,
                    size,
                }
            }
            Err(e) => failed(TransferStage::Upload, e),
        }
    }
}
