//! The worker side of the dispatch pipeline: a single-GPU-holder job
//! serializer (`WorkerJobEngine`) running a deterministic stage
//! sequence (`WorkerPipeline`) with pluggable STT/diarization.

pub mod diarize;
pub mod engine;
pub mod pipeline;
pub mod stt;
pub mod store;

pub use diarize::{Diarizer, NullDiarizer, Turn};
pub use engine::{sanitize_filename, WorkerJobEngine};
pub use pipeline::{PipelineConfig, WorkerPipeline};
pub use stt::{PlaceholderRecognizer, RawSegment, SpeechRecognizer};
pub use store::WorkerJobStore;
