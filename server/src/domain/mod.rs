//! Domain logic
//!
//! - `traces` - Trace reconstruction, timeline layout and view sessions

pub mod traces;

pub use traces::{Trace, TraceView, ViewError, ViewRegistry, reconstruct};
