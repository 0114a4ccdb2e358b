//! Job infrastructure for background work.
//!
//! This module provides the kernel-level infrastructure for job execution:
//! - [`JobQueue`] - Producer side, cheap to clone into commit callbacks
//! - [`JobRunner`] - Long-running service that executes queued jobs
//! - [`JobHandler`] - Implemented by domains for each job type
//!
//! # Domain-Specific Jobs
//!
//! Job types and their handlers live in their respective domains.
//! This module only provides the infrastructure - business logic stays in domains.

mod queue;
mod runner;

pub use queue::{job_channel, ChannelJobQueue, JobQueue, JobReceiver, QueueClosed};
pub use runner::{JobHandler, JobRunner, JobRunnerConfig, JobRunnerHandle};
