// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Simulation-wide identifiers.

/// Identifier attached to every tracked object.
///
/// IDs are handed out by the [`Tracker`](crate::Tracker) and are unique
/// within one simulation. Two values are reserved: [`NO_ID`] and [`ROOT`].
#[derive(Copy, Clone, Default, Eq, Hash, PartialEq)]
pub struct Id(pub u64);

/// Marks the absence of a valid ID, for example the parent of the top-level.
pub const NO_ID: Id = Id(0);

/// The ID of the top of the entity hierarchy.
pub const ROOT: Id = Id(1);

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Debug for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Anything with an [`Id`] that trace events can refer to.
pub trait Unique {
    /// The ID of this object.
    fn id(&self) -> Id;
}

impl Unique for Id {
    fn id(&self) -> Id {
        *self
    }
}

// Primitive types get an ID derived from their value so they can be sent
// through components in tests.
impl Unique for i32 {
    fn id(&self) -> Id {
        Id(*self as u64)
    }
}

impl Unique for usize {
    fn id(&self) -> Id {
        Id(*self as u64)
    }
}
