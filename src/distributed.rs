//! Parallel coordinator (`spec.md` §4.5, component C6) and the machinery it
//! is built from: the `ProcessGroup` transport abstraction (`group.rs`), the
//! inter-process wire format (`wire.rs`, `spec.md` §6), and the tree
//! reduction itself (`coordinator.rs`).

mod coordinator;
mod group;
pub mod wire;

pub use coordinator::triangulate_distributed;
pub use group::{run_on_threads, LoopbackGroup, ProcessGroup, ThreadGroup};
