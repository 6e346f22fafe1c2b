//! HTTP client side of the dispatch pipeline: is the worker reachable
//! (`GpuHealthProbe`), can it be woken (`GpuWaker`), and the two-phase
//! submit/poll protocol against it (`GpuSubmitPoller`).

mod poller;
mod probe;
mod waker;

pub use poller::{GpuSubmitPoller, SubmitOutcome, SubmitPollerConfig};
pub use probe::GpuHealthProbe;
pub use waker::GpuWaker;
