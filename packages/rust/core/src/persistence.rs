//! Best-effort background persistence.
//!
//! The pipeline hands writes to a [`PersistenceQueue`] and returns without
//! waiting. A single worker applies them in order; failures and timeouts
//! are logged and dropped so they never reach the caller.

use std::sync::Arc;
use std::time::Duration;

use interviewprep_shared::{InterviewPrepError, ResearchReport, SourceRecord};
use interviewprep_storage::ResearchStore;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

enum Task {
    SaveSources(Box<SourceRecord>),
    AppendReport(Box<ResearchReport>),
    Flush(oneshot::Sender<()>),
}

/// Handle to the persistence worker. Cloning shares the same worker.
#[derive(Clone)]
pub struct PersistenceQueue {
    tx: mpsc::UnboundedSender<Task>,
    worker: Arc<std::sync::Mutex<Option<JoinHandle<()>>>>,
}

impl PersistenceQueue {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(store: Arc<dyn ResearchStore>, store_timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(store, store_timeout, rx));
        Self {
            tx,
            worker: Arc::new(std::sync::Mutex::new(Some(worker))),
        }
    }

    /// Queue an upsert of `record`.
    pub fn save_sources(&self, record: SourceRecord) {
        self.send(Task::SaveSources(Box::new(record)));
    }

    /// Queue an append of `report` to the report log.
    pub fn append_report(&self, report: ResearchReport) {
        self.send(Task::AppendReport(Box::new(report)));
    }

    /// Wait until every task queued before this call has been attempted.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(Task::Flush(done_tx));
        // A closed worker has nothing left to flush.
        let _ = done_rx.await;
    }

    /// Drain queued tasks and stop the worker.
    pub async fn shutdown(self) {
        self.flush().await;
        let handle = self
            .worker
            .lock()
            .map(|mut guard| guard.take())
            .unwrap_or(None);
        drop(self.tx);
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }
    }

    fn send(&self, task: Task) {
        if self.tx.send(task).is_err() {
            warn!("persistence worker stopped, dropping task");
        }
    }
}

async fn run_worker(
    store: Arc<dyn ResearchStore>,
    store_timeout: Duration,
    mut rx: mpsc::UnboundedReceiver<Task>,
) {
    while let Some(task) = rx.recv().await {
        match task {
            Task::SaveSources(record) => {
                let key = record.key();
                match tokio::time::timeout(store_timeout, store.upsert(&record)).await {
                    Ok(Ok(())) => debug!(%key, "source record saved"),
                    Ok(Err(e)) => warn!(%key, error = %e, "failed to save source record"),
                    Err(_) => {
                        let e = InterviewPrepError::timeout("source record save", store_timeout.as_secs());
                        warn!(%key, error = %e, "failed to save source record");
                    }
                }
            }
            Task::AppendReport(report) => {
                let id = report.id.to_string();
                match tokio::time::timeout(store_timeout, store.append_report(&report)).await {
                    Ok(Ok(())) => debug!(report_id = %id, "report appended"),
                    Ok(Err(e)) => warn!(report_id = %id, error = %e, "failed to append report"),
                    Err(_) => {
                        let e = InterviewPrepError::timeout("report append", store_timeout.as_secs());
                        warn!(report_id = %id, error = %e, "failed to append report");
                    }
                }
            }
            Task::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("persistence worker exiting");
}
