//! Frontend-side dispatch: decide whether the GPU worker is usable,
//! wake it if configured, submit and poll, and fall back to a local
//! pipeline on failure.

mod fallback;
mod orchestrator;

pub use fallback::{DisabledFallback, FallbackTranscriber};
pub use orchestrator::TranscriptionOrchestrator;
