//! Job runner service for processing background jobs.
//!
//! The `JobRunner` is a background service that:
//! - Receives jobs from a [`JobReceiver`]
//! - Spawns one task per job, bounded by `max_concurrency`
//! - Drains queued and in-flight jobs on shutdown
//!
//! # Architecture
//!
//! ```text
//! on_commit callback
//!     │
//!     └─► JobQueue.enqueue(job)
//!
//! JobRunner
//!     │
//!     ├─► Receive job (mpsc)
//!     ├─► Acquire concurrency permit
//!     └─► Spawn JobHandler.handle(job)
//! ```
//!
//! Handlers own their failure handling. The runner never retries.
//!
//! # Example
//!
//! ```ignore
//! let (queue, receiver) = job_channel();
//! let handle = JobRunner::new(receiver, Arc::new(pipeline)).spawn();
//!
//! queue.enqueue(EmbedPostJob { post_id })?;
//!
//! // Later: stop accepting jobs and wait for the rest to finish
//! handle.shutdown().await;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use super::queue::JobReceiver;

/// Executes one job. Failures are the handler's to log; nothing is retried.
#[async_trait]
pub trait JobHandler<J>: Send + Sync {
    async fn handle(&self, job: J);
}

/// Configuration for the job runner.
#[derive(Debug, Clone, TypedBuilder)]
pub struct JobRunnerConfig {
    /// Maximum number of jobs executing at once
    #[builder(default = 4)]
    pub max_concurrency: usize,
    /// Worker ID for this instance
    #[builder(default = format!("runner-{}", Uuid::new_v4()), setter(into))]
    pub worker_id: String,
}

impl Default for JobRunnerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Background service that drains a job channel.
pub struct JobRunner<J> {
    receiver: JobReceiver<J>,
    handler: Arc<dyn JobHandler<J>>,
    config: JobRunnerConfig,
    shutdown: CancellationToken,
}

/// Handle to a spawned runner.
pub struct JobRunnerHandle {
    shutdown: CancellationToken,
    join: JoinHandle<()>,
}

impl JobRunnerHandle {
    /// Stop accepting jobs, then wait for queued and in-flight jobs to finish.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.join.await {
            warn!(error = %e, "job runner task ended abnormally");
        }
    }
}

impl<J: Send + 'static> JobRunner<J> {
    pub fn new(receiver: JobReceiver<J>, handler: Arc<dyn JobHandler<J>>) -> Self {
        Self::with_config(receiver, handler, JobRunnerConfig::default())
    }

    pub fn with_config(
        receiver: JobReceiver<J>,
        handler: Arc<dyn JobHandler<J>>,
        config: JobRunnerConfig,
    ) -> Self {
        Self {
            receiver,
            handler,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Spawn [`run`](Self::run) onto the current runtime.
    pub fn spawn(self) -> JobRunnerHandle {
        let shutdown = self.shutdown.clone();
        let join = tokio::spawn(self.run());
        JobRunnerHandle { shutdown, join }
    }

    /// Run until shutdown is requested or every queue handle is dropped.
    pub async fn run(self) {
        let JobRunner {
            mut receiver,
            handler,
            config,
            shutdown,
        } = self;

        info!(
            worker_id = %config.worker_id,
            max_concurrency = config.max_concurrency,
            "job runner started"
        );

        let permits = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
        let tracker = TaskTracker::new();
        let mut draining = false;

        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled(), if !draining => {
                    draining = true;
                    receiver.receiver.close();
                    debug!(worker_id = %config.worker_id, "shutdown requested, draining queued jobs");
                    continue;
                }
                job = receiver.receiver.recv() => job,
            };

            let Some(job) = next else { break };

            let permit = match permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            let handler = handler.clone();
            tracker.spawn(async move {
                handler.handle(job).await;
                drop(permit);
            });
        }

        tracker.close();
        tracker.wait().await;

        info!(worker_id = %config.worker_id, "job runner stopped");
    }
}
