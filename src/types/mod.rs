//! Global type/property registry and per-shard, per-type tables (§4.2, §4.4).

mod node_table;
mod registry;
mod relationship_table;

pub use node_table::NodeTable;
pub use registry::{reset_for_test, snapshot, Registry};
pub use relationship_table::RelationshipTable;

pub(crate) use registry::{
    delete_node_property, delete_node_type, delete_relationship_property,
    delete_relationship_type, register_node_property, register_node_type,
    register_relationship_property, register_relationship_type,
};
