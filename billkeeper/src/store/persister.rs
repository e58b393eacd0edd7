//! Background snapshot writer
//!
//! Mutations update memory first and then hand a snapshot to the writer
//! task, which saves it without blocking the caller. Bursts collapse to the
//! newest snapshot. A failed write is logged and the in-memory state is
//! kept; the next mutation's save tries again.

use super::models::Snapshot;
use crate::error::{AppError, Result};
use crate::storage::SnapshotStorage;
use tokio::sync::{mpsc, oneshot};

enum PersistCommand {
    Save(Snapshot),
    Flush(oneshot::Sender<std::result::Result<(), String>>),
}

/// Handle used by the store to request snapshot saves
#[derive(Clone)]
pub struct Persister {
    tx: Option<mpsc::UnboundedSender<PersistCommand>>,
}

impl Persister {
    /// Spawn the writer task on the current tokio runtime
    pub fn spawn<S: SnapshotStorage>(storage: S) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(storage, rx));
        Self { tx: Some(tx) }
    }

    /// A persister that drops every request; the store stays in memory only
    pub fn detached() -> Self {
        Self { tx: None }
    }

    pub fn is_attached(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue `snapshot` for writing. Never blocks and never fails the
    /// caller's mutation.
    pub fn request_save(&self, snapshot: Snapshot) {
        if let Some(tx) = &self.tx {
            if tx.send(PersistCommand::Save(snapshot)).is_err() {
                tracing::error!("Snapshot writer has stopped; change kept in memory only");
            }
        }
    }

    /// Wait until every snapshot requested so far has been handled and
    /// report the outcome of the latest write.
    pub async fn flush(&self) -> Result<()> {
        let Some(tx) = &self.tx else {
            return Ok(());
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(PersistCommand::Flush(reply_tx))
            .map_err(|_| AppError::Persistence("Snapshot writer has stopped".to_string()))?;

        reply_rx
            .await
            .map_err(|_| AppError::Persistence("Snapshot writer has stopped".to_string()))?
            .map_err(AppError::Persistence)
    }
}

async fn run_writer<S: SnapshotStorage>(
    storage: S,
    mut rx: mpsc::UnboundedReceiver<PersistCommand>,
) {
    tracing::debug!("Snapshot writer started");

    let mut last_outcome: std::result::Result<(), String> = Ok(());

    while let Some(command) = rx.recv().await {
        let mut latest = None;
        let mut waiters = Vec::new();

        match command {
            PersistCommand::Save(snapshot) => latest = Some(snapshot),
            PersistCommand::Flush(reply) => waiters.push(reply),
        }

        // Collapse whatever else is already queued
        while let Ok(next) = rx.try_recv() {
            match next {
                PersistCommand::Save(snapshot) => latest = Some(snapshot),
                PersistCommand::Flush(reply) => waiters.push(reply),
            }
        }

        if let Some(snapshot) = latest {
            last_outcome = match storage.save(&snapshot).await {
                Ok(()) => {
                    tracing::debug!(
                        "Persisted snapshot ({} bills, {} categories)",
                        snapshot.bills.len(),
                        snapshot.categories.len()
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("Failed to persist snapshot: {}", e);
                    Err(e.to_string())
                }
            };
        }

        for waiter in waiters {
            let _ = waiter.send(last_outcome.clone());
        }
    }

    tracing::debug!("Snapshot writer stopped");
}
