//! Shared domain types for MeetScribe: the persisted entities
//! (`Meeting`, `Transcript`, `Segment`, `FrontendJob`), the worker's
//! in-memory `WorkerJob`, the wire-level `TranscriptionResult`, and the
//! error taxonomy shared by the frontend and worker binaries.

mod error;
mod job;
mod meeting;
mod metadata;
mod result;
mod segment;
mod transcript;
mod worker_job;

pub use error::TranscriptionError;
pub use job::{FrontendJob, FrontendJobStatus};
pub use meeting::{Meeting, MeetingStatus};
pub use metadata::TranscriptionMetadata;
pub use result::{ResultSegment, Stats, TranscriptionResult};
pub use segment::Segment;
pub use transcript::Transcript;
pub use worker_job::{WorkerJob, WorkerJobStatus};
