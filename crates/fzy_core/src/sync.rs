//! # Shared World
//!
//! The ECS itself is single-threaded. [`SharedWorld`] puts one world behind
//! a single coarse [`parking_lot::Mutex`] so tooling threads can reach it;
//! every operation still runs to completion under the lock.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::ecs::World;

/// Cloneable handle to a world guarded by one lock.
///
/// # Example
///
/// ```rust
/// use fzy_core::{EcsConfig, SharedWorld, World};
///
/// let shared = SharedWorld::new(World::new(EcsConfig::with_max_entities(8))?);
/// let worker = shared.clone();
/// std::thread::spawn(move || worker.with(|world| world.entity_create().map(|_| ())))
///     .join()
///     .expect("worker panicked")?;
/// assert_eq!(shared.lock().living_count(), 1);
/// # Ok::<(), fzy_core::EcsError>(())
/// ```
#[derive(Clone, Debug)]
pub struct SharedWorld {
    inner: Arc<Mutex<World>>,
}

impl SharedWorld {
    /// Wraps `world`.
    #[must_use]
    pub fn new(world: World) -> Self {
        Self { inner: Arc::new(Mutex::new(world)) }
    }

    /// Locks the world until the guard drops.
    pub fn lock(&self) -> MutexGuard<'_, World> {
        self.inner.lock()
    }

    /// Runs `f` with the world locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
        f(&mut *self.inner.lock())
    }

    /// Unwraps the world if this is the last handle.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged while other handles exist.
    pub fn try_into_inner(self) -> Result<World, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}
