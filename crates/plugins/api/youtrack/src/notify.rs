//! Background delivery of failure reports.
//!
//! Callers enqueue a [`FailureReport`] and move on. A single worker task
//! hands each report to a [`NotificationSink`]; delivery errors are logged
//! and dropped so they never reach the caller that enqueued the report.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use trackbridge_core::{IssueTracker, Result};

/// Something went wrong while working on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
    pub issue_id: String,
    pub message: String,
}

impl FailureReport {
    pub fn new(issue_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issue_id: issue_id.into(),
            message: message.into(),
        }
    }
}

/// Destination for failure reports.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, report: &FailureReport) -> Result<()>;
}

/// Posts each report as a comment on the affected issue.
pub struct CommentSink<T: IssueTracker> {
    tracker: Arc<T>,
}

impl<T: IssueTracker> CommentSink<T> {
    pub fn new(tracker: Arc<T>) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl<T: IssueTracker + 'static> NotificationSink for CommentSink<T> {
    async fn deliver(&self, report: &FailureReport) -> Result<()> {
        self.tracker
            .add_comment(&report.issue_id, &report.message)
            .await?;
        Ok(())
    }
}

/// Sending half of the notification queue. Cheap to clone.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<FailureReport>,
}

impl NotificationQueue {
    /// Start the worker. The worker exits once every queue handle is
    /// dropped and the remaining reports are delivered.
    pub fn spawn<S>(sink: S, capacity: usize) -> (Self, JoinHandle<()>)
    where
        S: NotificationSink + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<FailureReport>(capacity.max(1));

        let handle = tokio::spawn(async move {
            while let Some(report) = rx.recv().await {
                match sink.deliver(&report).await {
                    Ok(()) => debug!(issue_id = %report.issue_id, "Failure report delivered"),
                    Err(e) => warn!(
                        issue_id = %report.issue_id,
                        error = %e,
                        "Failed to deliver failure report"
                    ),
                }
            }
            debug!("Notification queue drained");
        });

        (Self { tx }, handle)
    }

    /// Enqueue a report, waiting while the queue is full.
    ///
    /// Hands the report back if the worker is no longer running.
    pub async fn notify(&self, report: FailureReport) -> std::result::Result<(), FailureReport> {
        self.tx.send(report).await.map_err(|e| {
            warn!(issue_id = %e.0.issue_id, "Notification worker stopped, report dropped");
            e.0
        })
    }
}
