//! # ECS Error Types
//!
//! All errors that can occur in the ECS core. Nothing here terminates the
//! process: the caller decides whether exhaustion is recoverable.

use std::fmt;

use thiserror::Error;

use crate::ecs::{ComponentTypeId, Entity, ProcessTypeId};

/// The id pools the ECS hands out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Entity handles.
    Entity,
    /// Component type ids.
    ComponentType,
    /// Process type ids.
    Process,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Entity => "entity",
            Self::ComponentType => "component type",
            Self::Process => "process",
        })
    }
}

/// Coarse classification of an [`EcsError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An id pool is empty.
    Exhausted,
    /// A handle, id or name does not refer to anything live.
    InvalidHandle,
    /// A name or component is already registered/attached.
    Duplicate,
    /// The call violates an API contract (bad size, bad layout, id mismatch).
    Misuse,
    /// The world is not in the lifecycle state the call requires.
    Lifecycle,
    /// The configuration is invalid.
    Config,
}

/// Errors raised by [`RecyclingQueue`](crate::RecyclingQueue).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Push on a full queue.
    #[error("queue overflow: capacity {capacity}")]
    Overflow {
        /// Fixed capacity of the queue.
        capacity: usize,
    },
    /// Pop on an empty queue.
    #[error("queue underflow: queue is empty")]
    Underflow,
}

/// Errors raised by [`NameTable`](crate::NameTable).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The key is not bound.
    #[error("key not found: {0:?}")]
    KeyNotFound(String),
    /// A table needs at least one bucket.
    #[error("hashtable capacity must be greater than zero")]
    ZeroCapacity,
}

/// Errors that can occur in the ECS core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The world was shut down (or never initialized).
    #[error("ecs is not initialized")]
    NotInitialized,

    /// `initialize` called on a live world.
    #[error("ecs is already initialized")]
    AlreadyInitialized,

    /// An id pool ran dry.
    #[error("{resource} pool exhausted: capacity {capacity}")]
    Exhausted {
        /// Which pool.
        resource: Resource,
        /// Its fixed capacity.
        capacity: usize,
    },

    /// Entity index outside `0..max_entities`.
    #[error("entity {entity} is out of range (max {max})")]
    EntityOutOfRange {
        /// The offending handle.
        entity: Entity,
        /// Configured entity capacity.
        max: usize,
    },

    /// The entity is free, or the handle's generation is stale.
    #[error("entity {0} is not alive")]
    DeadEntity(Entity),

    /// No storage is registered under this component type id.
    #[error("component type {0} is not registered")]
    UnknownComponentType(ComponentTypeId),

    /// No process is registered under this process type id.
    #[error("process {0} is not registered")]
    UnknownProcess(ProcessTypeId),

    /// A name is already registered.
    #[error("{resource} name {name:?} is already registered")]
    DuplicateName {
        /// Which registry.
        resource: Resource,
        /// The name.
        name: String,
    },

    /// A name is not registered.
    #[error("{resource} name {name:?} is not registered")]
    NameNotFound {
        /// Which registry.
        resource: Resource,
        /// The name.
        name: String,
    },

    /// The name resolves to a different id than the caller passed.
    #[error("{resource} name {name:?} is bound to id {bound}, not {given}")]
    TypeIdMismatch {
        /// Which registry.
        resource: Resource,
        /// The name.
        name: String,
        /// Id the name is bound to.
        bound: u8,
        /// Id the caller passed.
        given: u8,
    },

    /// The entity already has this component.
    #[error("entity {entity} already has component {component}")]
    DuplicateComponent {
        /// The entity.
        entity: Entity,
        /// The component type.
        component: ComponentTypeId,
    },

    /// The entity does not have this component.
    #[error("entity {entity} has no component {component}")]
    MissingComponent {
        /// The entity.
        entity: Entity,
        /// The component type.
        component: ComponentTypeId,
    },

    /// Component element size of zero.
    #[error("component element size must be greater than zero")]
    ZeroElementSize,

    /// The storage for `capacity` elements would not fit in memory.
    #[error("component element size {element_size} is too large for {capacity} entities")]
    ElementTooLarge {
        /// Requested element size.
        element_size: usize,
        /// Configured entity capacity.
        capacity: usize,
    },

    /// A typed view does not match the registered element layout.
    #[error("component {component} stores {stored} byte elements, requested type is {requested} bytes or misaligned")]
    LayoutMismatch {
        /// The component type.
        component: ComponentTypeId,
        /// Registered element size.
        stored: usize,
        /// Size of the requested type.
        requested: usize,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Recycling queue failure.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Name table failure.
    #[error(transparent)]
    Table(#[from] TableError),
}

impl EcsError {
    /// Returns the coarse category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInitialized | Self::AlreadyInitialized => ErrorKind::Lifecycle,
            Self::Exhausted { .. } | Self::Queue(QueueError::Underflow) => ErrorKind::Exhausted,
            Self::EntityOutOfRange { .. }
            | Self::DeadEntity(_)
            | Self::UnknownComponentType(_)
            | Self::UnknownProcess(_)
            | Self::NameNotFound { .. }
            | Self::MissingComponent { .. }
            | Self::Table(TableError::KeyNotFound(_)) => ErrorKind::InvalidHandle,
            Self::DuplicateName { .. } | Self::DuplicateComponent { .. } => ErrorKind::Duplicate,
            Self::TypeIdMismatch { .. }
            | Self::ZeroElementSize
            | Self::ElementTooLarge { .. }
            | Self::LayoutMismatch { .. }
            | Self::Queue(QueueError::Overflow { .. }) => ErrorKind::Misuse,
            Self::InvalidConfig(_) | Self::Table(TableError::ZeroCapacity) => ErrorKind::Config,
        }
    }
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
