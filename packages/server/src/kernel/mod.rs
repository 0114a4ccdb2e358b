//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod jobs;
pub mod server_kernel;
pub mod test_dependencies;
pub mod traits;
pub mod unit_of_work;

pub use deps::ServerDeps;
pub use jobs::{job_channel, ChannelJobQueue, JobHandler, JobQueue, JobRunner, JobRunnerHandle};
pub use server_kernel::ServerKernel;
pub use test_dependencies::{InMemoryVectorStore, MockEmbeddingService};
pub use traits::*;
pub use unit_of_work::UnitOfWork;
