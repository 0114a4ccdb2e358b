//! In-process job queue.
//!
//! Jobs are small values (usually just an entity id) pushed from request code
//! and drained by a [`JobRunner`](super::JobRunner). Enqueueing never blocks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

/// The runner side has shut down and no longer accepts jobs.
#[derive(Debug, thiserror::Error)]
#[error("job queue is closed")]
pub struct QueueClosed;

/// Producer side of a job queue.
pub trait JobQueue<J>: Send + Sync {
    fn enqueue(&self, job: J) -> Result<(), QueueClosed>;
}

/// Unbounded tokio channel queue.
pub struct ChannelJobQueue<J> {
    sender: mpsc::UnboundedSender<J>,
    enqueued: Arc<AtomicU64>,
}

impl<J> Clone for ChannelJobQueue<J> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            enqueued: self.enqueued.clone(),
        }
    }
}

impl<J> ChannelJobQueue<J> {
    /// Total jobs accepted so far
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }
}

impl<J: Send + 'static> JobQueue<J> for ChannelJobQueue<J> {
    fn enqueue(&self, job: J) -> Result<(), QueueClosed> {
        self.sender.send(job).map_err(|_| QueueClosed)?;
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Consumer side, handed to a runner.
pub struct JobReceiver<J> {
    pub(super) receiver: mpsc::UnboundedReceiver<J>,
}

impl<J> JobReceiver<J> {
    /// Next job, or `None` once every queue handle is gone
    pub async fn recv(&mut self) -> Option<J> {
        self.receiver.recv().await
    }
}

/// Create a connected queue/receiver pair.
pub fn job_channel<J>() -> (ChannelJobQueue<J>, JobReceiver<J>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        ChannelJobQueue {
            sender,
            enqueued: Arc::new(AtomicU64::new(0)),
        },
        JobReceiver { receiver },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_enqueued_jobs_arrive_in_order() {
        let (queue, mut rx) = job_channel::<u32>();

        tokio_test::assert_ok!(queue.enqueue(1));
        tokio_test::assert_ok!(queue.enqueue(2));

        assert_eq!(rx.receiver.recv().await, Some(1));
        assert_eq!(rx.receiver.recv().await, Some(2));
        assert_eq!(queue.enqueued(), 2);
    }

    #[test]
    fn test_enqueue_after_receiver_dropped_fails() {
        let (queue, rx) = job_channel::<u32>();
        drop(rx);

        tokio_test::assert_err!(queue.enqueue(1));
        assert_eq!(queue.enqueued(), 0);
    }
}
