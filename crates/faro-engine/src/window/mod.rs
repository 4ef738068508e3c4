//! Window + event-loop runtime.
//!
//! Hosts exactly one window and the renderer bound to it, and drives the
//! per-frame `prepare` / app draws / `present` sequence.

mod runtime;

pub use runtime::{App, AppControl, FrameCtx, Runtime, RuntimeConfig};
