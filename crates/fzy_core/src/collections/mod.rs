//! # Collections
//!
//! Fixed-capacity containers the ECS allocates its ids from.
//!
//! - [`RecyclingQueue`]: FIFO ring buffer of free ids, never resizes
//! - [`NameTable`]: string-keyed chaining hashtable with reference counts

mod hashtable;
mod queue;

pub use hashtable::{NameTable, MAX_KEY_LEN};
pub use queue::RecyclingQueue;
