//! Process-wide type and property registry (§4.2, §5).
//!
//! Type ids and property ids are process-wide and guarded by the single
//! global write lock the spec allows (§5): writers take [`LOCK`], compute
//! the new snapshot, and publish it atomically via [`ArcSwap`]. Because a
//! single process owns every shard, "broadcast to all shards" reduces to
//! publishing that snapshot once — every shard already reads from the same
//! `ArcSwap`, so the next read anywhere observes the new schema with no
//! network hop. Readers never block; they call [`snapshot`] and get a
//! point-in-time view, exactly the way the teacher's `config::config()`
//! reads its `ArcSwap<ConfigAndUsers>`.

use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::property::{self, Kind};

#[derive(Debug, Clone, Default)]
pub struct Registry {
    node_types: IndexMap<String, u16>,
    node_schemas: Vec<property::Schema>,
    relationship_types: IndexMap<String, u16>,
    relationship_schemas: Vec<property::Schema>,
}

impl Registry {
    pub fn node_type_id(&self, name: &str) -> Option<u16> {
        self.node_types.get(name).copied()
    }

    pub fn node_type_name(&self, id: u16) -> Option<&str> {
        self.node_types
            .iter()
            .find(|&(_, &v)| v == id)
            .map(|(k, _)| k.as_str())
    }

    pub fn relationship_type_id(&self, name: &str) -> Option<u16> {
        self.relationship_types.get(name).copied()
    }

    pub fn relationship_type_name(&self, id: u16) -> Option<&str> {
        self.relationship_types
            .iter()
            .find(|&(_, &v)| v == id)
            .map(|(k, _)| k.as_str())
    }

    pub fn node_schema(&self, id: u16) -> Option<&property::Schema> {
        self.node_schemas.get(id as usize)
    }

    pub fn relationship_schema(&self, id: u16) -> Option<&property::Schema> {
        self.relationship_schemas.get(id as usize)
    }

    pub fn node_types(&self) -> std::collections::BTreeSet<String> {
        self.node_types.keys().cloned().collect()
    }

    pub fn relationship_types(&self) -> std::collections::BTreeSet<String> {
        self.relationship_types.keys().cloned().collect()
    }

    pub fn node_type_count(&self) -> u16 {
        self.node_types.len() as u16
    }

    pub fn relationship_type_count(&self) -> u16 {
        self.relationship_types.len() as u16
    }
}

static REGISTRY: Lazy<ArcSwap<Registry>> = Lazy::new(|| ArcSwap::from_pointee(Registry::default()));
static LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// A lock-free, point-in-time view of the schema.
pub fn snapshot() -> Arc<Registry> {
    REGISTRY.load_full()
}

/// Register a node type by name, idempotently. Takes the process-wide
/// write lock for the duration of the mutation only.
pub fn register_node_type(name: &str) -> u16 {
    let _guard = LOCK.lock();
    let current = REGISTRY.load();
    if let Some(&id) = current.node_types.get(name) {
        return id;
    }
    let mut next = (**current).clone();
    let id = next.node_types.len() as u16;
    next.node_types.insert(name.to_string(), id);
    next.node_schemas.push(property::Schema::new());
    REGISTRY.store(Arc::new(next));
    id
}

pub fn register_relationship_type(name: &str) -> u16 {
    let _guard = LOCK.lock();
    let current = REGISTRY.load();
    if let Some(&id) = current.relationship_types.get(name) {
        return id;
    }
    let mut next = (**current).clone();
    let id = next.relationship_types.len() as u16;
    next.relationship_types.insert(name.to_string(), id);
    next.relationship_schemas.push(property::Schema::new());
    REGISTRY.store(Arc::new(next));
    id
}

pub fn delete_node_type(name: &str) -> bool {
    let _guard = LOCK.lock();
    let current = REGISTRY.load();
    if !current.node_types.contains_key(name) {
        return false;
    }
    let mut next = (**current).clone();
    next.node_types.shift_remove(name);
    REGISTRY.store(Arc::new(next));
    true
}

pub fn delete_relationship_type(name: &str) -> bool {
    let _guard = LOCK.lock();
    let current = REGISTRY.load();
    if !current.relationship_types.contains_key(name) {
        return false;
    }
    let mut next = (**current).clone();
    next.relationship_types.shift_remove(name);
    REGISTRY.store(Arc::new(next));
    true
}

/// Register `(name, kind)` for a node type's property schema.
/// `SchemaConflict` if already registered with a different kind.
pub fn register_node_property(type_id: u16, name: &str, kind: Kind) -> Result<u16, property::Error> {
    let _guard = LOCK.lock();
    let current = REGISTRY.load();
    let mut next = (**current).clone();
    let schema = next
        .node_schemas
        .get_mut(type_id as usize)
        .ok_or(property::Error::UnknownProperty {
            name: name.to_string(),
        })?;
    let id = schema.register(name, kind)?;
    REGISTRY.store(Arc::new(next));
    Ok(id)
}

pub fn register_relationship_property(
    type_id: u16,
    name: &str,
    kind: Kind,
) -> Result<u16, property::Error> {
    let _guard = LOCK.lock();
    let current = REGISTRY.load();
    let mut next = (**current).clone();
    let schema = next.relationship_schemas.get_mut(type_id as usize).ok_or(
        property::Error::UnknownProperty {
            name: name.to_string(),
        },
    )?;
    let id = schema.register(name, kind)?;
    REGISTRY.store(Arc::new(next));
    Ok(id)
}

pub fn delete_node_property(type_id: u16, name: &str) -> bool {
    let _guard = LOCK.lock();
    let current = REGISTRY.load();
    let mut next = (**current).clone();
    let removed = next
        .node_schemas
        .get_mut(type_id as usize)
        .map(|s| s.delete(name))
        .unwrap_or(false);
    if removed {
        REGISTRY.store(Arc::new(next));
    }
    removed
}

pub fn delete_relationship_property(type_id: u16, name: &str) -> bool {
    let _guard = LOCK.lock();
    let current = REGISTRY.load();
    let mut next = (**current).clone();
    let removed = next
        .relationship_schemas
        .get_mut(type_id as usize)
        .map(|s| s.delete(name))
        .unwrap_or(false);
    if removed {
        REGISTRY.store(Arc::new(next));
    }
    removed
}

/// Test-only: discard all global registrations so tests don't leak state
/// into each other via the process-wide statics. Not `cfg(test)`-gated
/// since integration tests under `tests/` link the crate as an ordinary
/// dependency and need to call this too.
pub fn reset_for_test() {
    let _guard = LOCK.lock();
    REGISTRY.store(Arc::new(Registry::default()));
}

#[cfg(test)]
mod test {
    // A single test function: the registry is a process-wide static, so
    // running these as separate #[test] fns would race under cargo's
    // default parallel test execution.
    #[test]
    fn registry_behaviour() {
        use super::*;

        reset_for_test();

        let a = register_node_type("Person");
        let b = register_node_type("Person");
        assert_eq!(a, b, "registration is idempotent");

        let c = register_node_type("Company");
        assert_ne!(a, c, "distinct types get distinct ids");

        register_node_property(a, "age", Kind::I64).unwrap();
        let err = register_node_property(a, "age", Kind::String).unwrap_err();
        assert!(matches!(err, property::Error::Conflict { .. }));
    }
}
