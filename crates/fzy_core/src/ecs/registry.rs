//! # Type Registry
//!
//! Name-to-id registry shared by component types and processes: a
//! [`NameTable`] for the names plus a [`RecyclingQueue`] of free ids.

use crate::collections::{NameTable, RecyclingQueue};
use crate::error::{EcsError, EcsResult, Resource};

#[derive(Debug)]
pub(crate) struct TypeRegistry {
    resource: Resource,
    free: RecyclingQueue<u8>,
    names: NameTable<u8>,
}

impl TypeRegistry {
    /// Creates a registry handing out ids `0..capacity`.
    ///
    /// `capacity` is at most 64 after config validation.
    pub fn new(resource: Resource, capacity: usize, buckets: usize) -> EcsResult<Self> {
        #[allow(clippy::cast_possible_truncation)]
        let free = RecyclingQueue::preloaded((0..capacity).map(|id| id as u8));
        Ok(Self { resource, free, names: NameTable::new(buckets)? })
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Bytes held by the free queue and the bucket array.
    pub fn allocated_bytes(&self) -> usize {
        self.free.capacity() + self.names.bucket_count() * std::mem::size_of::<Vec<()>>()
    }

    /// Binds `name` to the next free id.
    pub fn register(&mut self, name: &str) -> EcsResult<u8> {
        if self.names.contains(name) {
            return Err(EcsError::DuplicateName { resource: self.resource, name: name.to_owned() });
        }

        let id = self.free.pop().map_err(|_| EcsError::Exhausted {
            resource: self.resource,
            capacity: self.free.capacity(),
        })?;
        self.names.set(name, id);
        Ok(id)
    }

    /// Unbinds `name`, which must resolve to `id`, and recycles the id.
    pub fn unregister(&mut self, name: &str, id: u8) -> EcsResult<()> {
        let bound = self.lookup(name).ok_or_else(|| EcsError::NameNotFound {
            resource: self.resource,
            name: name.to_owned(),
        })?;
        if bound != id {
            return Err(EcsError::TypeIdMismatch {
                resource: self.resource,
                name: name.to_owned(),
                bound,
                given: id,
            });
        }

        // Registration holds the only reference, so this unbinds.
        self.names.remove(name)?;
        self.free.push(id)?;
        Ok(())
    }

    /// Id bound to `name`.
    pub fn lookup(&self, name: &str) -> Option<u8> {
        self.names.peek(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_recycles_fifo() {
        let mut registry = TypeRegistry::new(Resource::ComponentType, 3, 7).unwrap();
        assert_eq!(registry.register("a").unwrap(), 0);
        assert_eq!(registry.register("b").unwrap(), 1);

        registry.unregister("a", 0).unwrap();
        assert_eq!(registry.register("c").unwrap(), 2);
        // The recycled id comes back after the never-used ones
        assert_eq!(registry.register("d").unwrap(), 0);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_exhaustion() {
        let mut registry = TypeRegistry::new(Resource::Process, 1, 7).unwrap();
        registry.register("only").unwrap();
        assert_eq!(
            registry.register("more").unwrap_err(),
            EcsError::Exhausted { resource: Resource::Process, capacity: 1 }
        );
        assert_eq!(registry.lookup("more"), None);
    }

    #[test]
    fn test_duplicate_keeps_free_pool() {
        let mut registry = TypeRegistry::new(Resource::Process, 2, 7).unwrap();
        registry.register("physics").unwrap();
        assert!(matches!(
            registry.register("physics"),
            Err(EcsError::DuplicateName { .. })
        ));
        assert_eq!(registry.register("render").unwrap(), 1);
    }

    #[test]
    fn test_unregister_validates_id() {
        let mut registry = TypeRegistry::new(Resource::ComponentType, 4, 7).unwrap();
        registry.register("mesh").unwrap();

        assert_eq!(
            registry.unregister("mesh", 3).unwrap_err(),
            EcsError::TypeIdMismatch {
                resource: Resource::ComponentType,
                name: "mesh".to_owned(),
                bound: 0,
                given: 3,
            }
        );
        assert!(matches!(
            registry.unregister("ghost", 0),
            Err(EcsError::NameNotFound { .. })
        ));
        assert_eq!(registry.lookup("mesh"), Some(0));

        registry.unregister("mesh", 0).unwrap();
        assert_eq!(registry.lookup("mesh"), None);
    }
}
