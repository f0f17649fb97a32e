//! # Memory Accounting
//!
//! The ECS allocates its buffers once, when a world is initialized or a type
//! is registered, and frees them on unregistration or shutdown. Every such
//! allocation is tagged by subsystem so leaks show up as nonzero tags after
//! shutdown.

mod stats;

pub use stats::{MemoryStats, MemoryTag};
