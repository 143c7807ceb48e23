//! Types admin contract (§6.1): register/delete node and relationship
//! types and their properties. The schema is a process-wide `ArcSwap`
//! (§5), so none of this needs a shard dispatch — every shard already
//! reads the same snapshot the moment it's published.

use std::collections::{BTreeMap, BTreeSet};

use crate::property::{Error as PropertyError, Kind};
use crate::types;
use crate::Result;

pub fn register_node_type(name: &str) -> u16 {
    types::register_node_type(name)
}

pub fn register_relationship_type(name: &str) -> u16 {
    types::register_relationship_type(name)
}

pub fn delete_node_type(name: &str) -> bool {
    types::delete_node_type(name)
}

pub fn delete_relationship_type(name: &str) -> bool {
    types::delete_relationship_type(name)
}

/// Register `name: kind` on node type `type_id`'s schema. Idempotent if
/// the name is already registered with the same kind; a `SchemaConflict`
/// otherwise (§7).
pub fn register_node_property(type_id: u16, name: &str, kind: Kind) -> Result<u16> {
    types::register_node_property(type_id, name, kind).map_err(property_to_crate_error)
}

pub fn register_relationship_property(type_id: u16, name: &str, kind: Kind) -> Result<u16> {
    types::register_relationship_property(type_id, name, kind).map_err(property_to_crate_error)
}

pub fn delete_node_property(type_id: u16, name: &str) -> bool {
    types::delete_node_property(type_id, name)
}

pub fn delete_relationship_property(type_id: u16, name: &str) -> bool {
    types::delete_relationship_property(type_id, name)
}

fn property_to_crate_error(e: PropertyError) -> crate::Error {
    crate::Error::Property(e)
}

pub fn node_types() -> BTreeSet<String> {
    types::snapshot().node_types()
}

pub fn relationship_types() -> BTreeSet<String> {
    types::snapshot().relationship_types()
}

pub fn node_type_count() -> u16 {
    types::snapshot().node_type_count()
}

pub fn relationship_type_count() -> u16 {
    types::snapshot().relationship_type_count()
}

pub fn node_type_properties(type_name: &str) -> BTreeMap<String, &'static str> {
    let registry = types::snapshot();
    registry
        .node_type_id(type_name)
        .and_then(|id| registry.node_schema(id).map(|s| s.property_types()))
        .unwrap_or_default()
}

pub fn relationship_type_properties(type_name: &str) -> BTreeMap<String, &'static str> {
    let registry = types::snapshot();
    registry
        .relationship_type_id(type_name)
        .and_then(|id| registry.relationship_schema(id).map(|s| s.property_types()))
        .unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn register_and_inspect_node_type() {
        crate::types::reset_for_test();
        let id = register_node_type("Person");
        register_node_property(id, "age", Kind::I64).unwrap();
        assert_eq!(node_types(), BTreeSet::from(["Person".to_string()]));
        assert_eq!(node_type_properties("Person").get("age"), Some(&"i64"));
    }

    #[test]
    fn conflicting_property_kind_is_rejected() {
        crate::types::reset_for_test();
        let id = register_node_type("Person");
        register_node_property(id, "age", Kind::I64).unwrap();
        let err = register_node_property(id, "age", Kind::String).unwrap_err();
        assert!(matches!(err, crate::Error::Property(PropertyError::Conflict { .. })));
    }
}
