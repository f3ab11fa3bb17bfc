// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The simulation entity hierarchy.
//!
//! Every part of a model owns an [`Entity`] so that track events can name
//! it and be filtered on it. Entities form a tree rooted at the one entity
//! created with [`toplevel`].

use std::fmt;
use std::rc::Rc;

use crate::{Id, Tracker, create, destroy};

static JOIN: &str = "::";

/// One node in the entity tree.
///
/// The fields are public so the tracking macros can reach the tracker and
/// ID without going through accessors.
pub struct Entity {
    /// Leaf name of this entity.
    pub name: String,

    /// Parent in the tree. `None` only for the top-level.
    pub parent: Option<Rc<Entity>>,

    /// ID used in all track events about this entity.
    pub id: Id,

    /// Tracker every event from this entity is sent to.
    pub tracker: Tracker,
}

impl Entity {
    /// Create a child entity and trace its creation.
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        let entity = Self::build(parent, name);
        create!(entity);
        entity
    }

    /// Create a child entity, leaving the `create!` trace to the caller.
    #[must_use]
    pub fn new_without_create(parent: &Rc<Entity>, name: &str) -> Self {
        Self::build(parent, name)
    }

    fn build(parent: &Rc<Entity>, name: &str) -> Self {
        let tracker = parent.tracker.clone();
        let id = tracker.unique_id();
        tracker.register_entity(id, &format!("{}{JOIN}{name}", parent.full_name()));

        Self {
            name: String::from(name),
            parent: Some(parent.clone()),
            id,
            tracker,
        }
    }

    /// The `::`-joined path from the top-level down to this entity.
    #[must_use]
    pub fn full_name(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        let mut cursor = self.parent.as_deref();
        while let Some(entity) = cursor {
            parts.push(entity.name.as_str());
            cursor = entity.parent.as_deref();
        }
        parts.reverse();
        parts.join(JOIN)
    }
}

impl Drop for Entity {
    fn drop(&mut self) {
        destroy!(self);
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("id", &self.id)
            .finish()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// Create the root of the entity tree.
pub fn toplevel(tracker: &Tracker, name: &str) -> Rc<Entity> {
    let id = tracker.unique_id();
    tracker.register_entity(id, name);
    let top = Rc::new(Entity {
        name: String::from(name),
        parent: None,
        id,
        tracker: tracker.clone(),
    });
    create!(top);
    top
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::test_helpers::TestTracker;

    #[test]
    fn full_names_follow_the_tree() {
        let recorder = Rc::new(TestTracker::new(1));
        let tracker: Tracker = recorder.clone();

        let top = toplevel(&tracker, "net");
        let fabric = Rc::new(Entity::new(&top, "fabric"));
        let leaf = Entity::new(&fabric, "leaf_0");

        assert_eq!(top.full_name(), "net");
        assert_eq!(fabric.full_name(), "net::fabric");
        assert_eq!(leaf.full_name(), "net::fabric::leaf_0");
        assert_eq!(format!("{leaf}"), "net::fabric::leaf_0");
    }

    #[test]
    fn creation_is_traced() {
        let recorder = Rc::new(TestTracker::new(1));
        let tracker: Tracker = recorder.clone();

        let top = toplevel(&tracker, "net");
        let _child = Entity::new(&top, "client");

        recorder.expect(&[
            r"0: created 1, net, 0 bytes",
            r"1: created 2, net::client, 0 bytes",
        ]);
    }
}
