//! Shard-local operations (§4.6): the atomic units a peered call composes.
//! Each runs to completion on a single shard without yielding mid-operation
//! (§5) — nothing here is `async`; suspension only happens one layer up, in
//! [`crate::peered`], where a call crosses shards.

use fnv::FnvHashMap;
use tracing::trace;

use crate::group::Direction;
use crate::id;
use crate::link::Link;
use crate::node::Node;
use crate::property::{self, Operator, Sort};
use crate::relationship::Relationship;
use crate::types::{self, NodeTable, RelationshipTable};
use crate::{Error, Result};

/// One remote cleanup a node removal cascade could not perform locally
/// because the counterpart lives on another shard. The peered layer
/// dispatches these after the local half of the removal completes.
#[derive(Debug, Clone, Copy)]
pub enum RemoteCleanup {
    /// Erase the incoming mirror of `rel_id` (type `rel_type`) on `shard`,
    /// where `ending_id` is the node whose incoming group holds it.
    Incoming {
        shard: u16,
        rel_type: u16,
        rel_id: u64,
        ending_id: u64,
    },
    /// Erase relationship `rel_id` (type `rel_type`) entirely on `shard` —
    /// outgoing group entry and its own slot — because its ending node is
    /// being removed and needs no further bookkeeping there.
    Outgoing {
        shard: u16,
        rel_type: u16,
        rel_id: u64,
        starting_id: u64,
    },
}

#[derive(Debug, Default)]
pub struct NodeRemoval {
    pub removed: bool,
    pub cleanups: Vec<RemoteCleanup>,
}

/// Typed, arena-backed storage of nodes and relationships for one shard.
pub struct Shard {
    id: u16,
    shards: u16,
    node_tables: FnvHashMap<u16, NodeTable>,
    relationship_tables: FnvHashMap<u16, RelationshipTable>,
}

impl Shard {
    pub fn new(id: u16, shards: u16) -> Self {
        Self {
            id,
            shards,
            node_tables: FnvHashMap::default(),
            relationship_tables: FnvHashMap::default(),
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    /// Shard-local liveness probe (original_source/src/main/handlers/HealthCheck.cpp).
    pub fn health_check(&self) -> String {
        format!("shard {} ok", self.id)
    }

    /// Reset this shard to empty. Used by tests and by replay-log restore
    /// to start from a clean slate (original_source/src/graph/Shard.h `Clear`).
    pub fn clear(&mut self) {
        self.node_tables.clear();
        self.relationship_tables.clear();
    }

    fn node_table(&self, type_id: u16) -> Option<&NodeTable> {
        self.node_tables.get(&type_id)
    }

    fn node_table_mut(&mut self, type_id: u16) -> &mut NodeTable {
        self.node_tables.entry(type_id).or_default()
    }

    fn rel_table(&self, type_id: u16) -> Option<&RelationshipTable> {
        self.relationship_tables.get(&type_id)
    }

    fn rel_table_mut(&mut self, type_id: u16) -> &mut RelationshipTable {
        self.relationship_tables.entry(type_id).or_default()
    }

    /// `valid_node(id)` (§4.4): local shard, known type, live slot.
    pub fn valid_node(&self, node_id: u64) -> bool {
        if node_id == id::INVALID {
            return false;
        }
        let (shard, type_id, slot) = id::decode(node_id);
        shard == self.id
            && types::snapshot().node_type_name(type_id).is_some()
            && self
                .node_table(type_id)
                .map(|t| t.is_live(slot))
                .unwrap_or(false)
    }

    /// `valid_rel(id)` (§4.4): local shard, known type, live slot.
    pub fn valid_relationship(&self, rel_id: u64) -> bool {
        if rel_id == id::INVALID {
            return false;
        }
        let (shard, type_id, slot) = id::decode(rel_id);
        shard == self.id
            && types::snapshot().relationship_type_name(type_id).is_some()
            && self
                .rel_table(type_id)
                .map(|t| t.is_live(slot))
                .unwrap_or(false)
    }

    // ---------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------

    pub fn node_get_id(&self, type_name: &str, key: &str) -> u64 {
        let registry = types::snapshot();
        let Some(type_id) = registry.node_type_id(type_name) else {
            return id::INVALID;
        };
        self.node_table(type_id)
            .and_then(|t| t.get_id(key))
            .unwrap_or(id::INVALID)
    }

    /// Compute the owning shard of `(type, key)` (§4.1). Used by the
    /// peered layer before dispatching a node creation.
    pub fn owning_shard(&self, type_name: &str, key: &str) -> u16 {
        id::owning_shard_for(type_name, key, self.shards)
    }

    /// Create a node with no properties. Idempotent: an existing key
    /// returns the existing id without allocating a slot.
    pub fn node_add_empty(&mut self, type_name: &str, key: &str) -> u64 {
        let type_id = types::register_node_type(type_name);
        if let Some(existing) = self.node_table(type_id).and_then(|t| t.get_id(key)) {
            return existing;
        }
        let table = self.node_table_mut(type_id);
        // The id embeds the slot, so peek the slot the allocation will use
        // before it happens.
        let next_slot = table.peek_next_slot();
        let new_id = id::encode(self.id, type_id, next_slot);
        let slot = table.allocate(key, new_id);
        debug_assert_eq!(slot, next_slot);
        trace!(shard = self.id, type_id, key, "node_add_empty");
        new_id
    }

    /// Create a node, applying `properties_json` (if any) against the
    /// type's schema after the node exists.
    pub fn node_add(
        &mut self,
        type_name: &str,
        key: &str,
        properties_json: Option<&serde_json::Value>,
    ) -> Result<u64> {
        let id = self.node_add_empty(type_name, key);
        if let Some(json) = properties_json {
            let (_, type_id, slot) = id::decode(id);
            let registry = types::snapshot();
            let schema = registry.node_schema(type_id).cloned().unwrap_or_default();
            let table = self.node_table_mut(type_id);
            let ok = table.properties.set_from_json(&schema, slot, json)?;
            if !ok {
                return Err(Error::InvalidArgument(
                    "properties do not match the node type's schema".to_string(),
                ));
            }
        }
        Ok(id)
    }

    pub fn node_get(&self, node_id: u64) -> Node {
        if !self.valid_node(node_id) {
            return Node::empty();
        }
        let (_, type_id, slot) = id::decode(node_id);
        let registry = types::snapshot();
        let type_name = registry.node_type_name(type_id).unwrap_or_default().to_string();
        let schema = registry.node_schema(type_id).cloned().unwrap_or_default();
        let table = self.node_table(type_id).expect("validated live above");
        Node {
            id: node_id,
            type_name,
            key: table.key(slot).unwrap_or_default().to_string(),
            properties: table.properties.all_as_json(&schema, slot),
        }
    }

    /// Shard-local half of node removal (§3 "Remove (node)"). Severs local
    /// adjacency and the node's own slot; reports what remote shards must
    /// still clean up.
    pub fn node_remove(&mut self, node_id: u64) -> NodeRemoval {
        if !self.valid_node(node_id) {
            return NodeRemoval::default();
        }
        let (_, type_id, slot) = id::decode(node_id);
        let adjacency = self
            .node_table(type_id)
            .and_then(|t| t.adjacency(slot))
            .cloned()
            .unwrap_or_default();

        let mut cleanups = Vec::new();

        // Outgoing: the relationship record lives here (this is its
        // starting shard). Free it, and mirror the removal on the ending
        // side — locally if possible, else ask that shard to do it.
        for group in adjacency.outgoing.groups() {
            for link in group.links() {
                let rel_type = group.rel_type_id;
                if let Ok((_, ending_id)) = self.relationship_remove_get_incoming(link.rel_id) {
                    let ending_shard = id::shard_of(ending_id);
                    if ending_shard == self.id {
                        self.relationship_remove_incoming(rel_type, link.rel_id, ending_id);
                    } else {
                        cleanups.push(RemoteCleanup::Incoming {
                            shard: ending_shard,
                            rel_type,
                            rel_id: link.rel_id,
                            ending_id,
                        });
                    }
                }
            }
        }

        // Incoming: the relationship record lives on the counterpart's
        // shard (it is that relationship's starting shard). Erase locally
        // if the counterpart happens to share this shard, else ask its
        // shard to erase the whole relationship.
        for group in adjacency.incoming.groups() {
            for link in group.links() {
                let rel_type = group.rel_type_id;
                let starting_shard = id::shard_of(link.node_id);
                if starting_shard == self.id {
                    self.relationship_remove_outgoing(rel_type, link.rel_id, link.node_id);
                } else {
                    cleanups.push(RemoteCleanup::Outgoing {
                        shard: starting_shard,
                        rel_type,
                        rel_id: link.rel_id,
                        starting_id: link.node_id,
                    });
                }
            }
        }

        self.node_table_mut(type_id).free(slot);
        NodeRemoval {
            removed: true,
            cleanups,
        }
    }

    /// Apply a remote cleanup reported by another shard's [`NodeRemoval`]
    /// or relationship removal.
    pub fn apply_remote_cleanup(&mut self, cleanup: RemoteCleanup) {
        match cleanup {
            RemoteCleanup::Incoming {
                rel_type,
                rel_id,
                ending_id,
                ..
            } => {
                self.relationship_remove_incoming(rel_type, rel_id, ending_id);
            }
            RemoteCleanup::Outgoing {
                rel_type,
                rel_id,
                starting_id,
                ..
            } => {
                self.relationship_remove_outgoing(rel_type, rel_id, starting_id);
            }
        }
    }

    pub fn node_get_degree(&self, node_id: u64, direction: Direction, rel_types: Option<&[u16]>) -> u64 {
        if !self.valid_node(node_id) {
            return 0;
        }
        let (_, type_id, slot) = id::decode(node_id);
        self.node_table(type_id)
            .and_then(|t| t.adjacency(slot))
            .map(|a| a.degree(direction, rel_types))
            .unwrap_or(0)
    }

    pub fn node_get_relationships_ids(
        &self,
        node_id: u64,
        direction: Direction,
        rel_types: Option<&[u16]>,
    ) -> Vec<Link> {
        if !self.valid_node(node_id) {
            return Vec::new();
        }
        let (_, type_id, slot) = id::decode(node_id);
        self.node_table(type_id)
            .and_then(|t| t.adjacency(slot))
            .map(|a| a.iter(direction, rel_types))
            .unwrap_or_default()
    }

    /// Links from `node_id` whose counterpart is exactly `other_id`: the
    /// shard-local half of "relationships directly connecting two specific
    /// nodes". Every outgoing/incoming link for `node_id` lives on this
    /// shard regardless of which shard owns `other_id`, so no second
    /// dispatch is needed here.
    pub fn node_get_relationships_ids_to(
        &self,
        node_id: u64,
        other_id: u64,
        direction: Direction,
        rel_types: Option<&[u16]>,
    ) -> Vec<Link> {
        self.node_get_relationships_ids(node_id, direction, rel_types)
            .into_iter()
            .filter(|link| link.node_id == other_id)
            .collect()
    }

    /// Always local: every outgoing relationship of a node lives on that
    /// node's own shard, so this needs no peered counterpart beyond
    /// dispatch-to-owner.
    pub fn node_get_outgoing_relationships(
        &self,
        node_id: u64,
        rel_types: Option<&[u16]>,
    ) -> Vec<Relationship> {
        self.node_get_relationships_ids(node_id, Direction::Out, rel_types)
            .into_iter()
            .map(|link| self.relationship_get(link.rel_id))
            .filter(|r| !r.is_empty())
            .collect()
    }

    pub fn node_types_get_count(&self) -> u16 {
        types::snapshot().node_type_count()
    }

    pub fn node_type_get_count(&self, type_name: &str) -> u64 {
        let Some(type_id) = types::snapshot().node_type_id(type_name) else {
            return 0;
        };
        self.node_table(type_id).map(|t| t.live_count()).unwrap_or(0)
    }

    pub fn node_types_get(&self) -> std::collections::BTreeSet<String> {
        types::snapshot().node_types()
    }

    pub fn node_type_get(&self, type_name: &str) -> std::collections::BTreeMap<String, &'static str> {
        types::snapshot()
            .node_type_id(type_name)
            .and_then(|id| types::snapshot().node_schema(id).map(|s| s.property_types()))
            .unwrap_or_default()
    }

    /// All live node ids of `type_name`, in stable slot order, paginated.
    pub fn all_node_ids(&self, type_name: &str, skip: usize, limit: usize) -> Vec<u64> {
        let registry = types::snapshot();
        let Some(type_id) = registry.node_type_id(type_name) else {
            return Vec::new();
        };
        let Some(table) = self.node_table(type_id) else {
            return Vec::new();
        };
        table
            .live_slots_sorted()
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|slot| id::encode(self.id, type_id, slot))
            .collect()
    }

    pub fn all_nodes(&self, type_name: &str, skip: usize, limit: usize) -> Vec<Node> {
        self.all_node_ids(type_name, skip, limit)
            .into_iter()
            .map(|id| self.node_get(id))
            .collect()
    }

    pub fn node_type_live_count(&self, type_name: &str) -> u64 {
        self.node_type_get_count(type_name)
    }

    // ---------------------------------------------------------------
    // Relationships
    // ---------------------------------------------------------------

    pub fn relationship_get(&self, rel_id: u64) -> Relationship {
        if !self.valid_relationship(rel_id) {
            return Relationship::empty();
        }
        let (_, type_id, slot) = id::decode(rel_id);
        let registry = types::snapshot();
        let type_name = registry
            .relationship_type_name(type_id)
            .unwrap_or_default()
            .to_string();
        let schema = registry.relationship_schema(type_id).cloned().unwrap_or_default();
        let table = self.rel_table(type_id).expect("validated live above");
        let (starting_id, ending_id) = table.endpoints(slot).unwrap_or((id::INVALID, id::INVALID));
        Relationship {
            id: rel_id,
            type_name,
            starting_id,
            ending_id,
            properties: table.properties.all_as_json(&schema, slot),
        }
    }

    /// Both endpoints local: create the relationship and update both sides
    /// atomically. Returns 0 if either endpoint is invalid (§8 boundary
    /// behaviour: no state change on failure).
    pub fn relationship_add_same_shard(
        &mut self,
        rel_type_name: &str,
        id1: u64,
        id2: u64,
        properties_json: Option<&serde_json::Value>,
    ) -> Result<u64> {
        if !self.valid_node(id1) || !self.valid_node(id2) {
            return Ok(id::INVALID);
        }
        let rel_type_id = types::register_relationship_type(rel_type_name);
        let slot = self.rel_table_mut(rel_type_id).allocate(id1, id2);
        let rel_id = id::encode(self.id, rel_type_id, slot);

        let (_, t1, s1) = id::decode(id1);
        self.node_table_mut(t1)
            .adjacency_mut(s1)
            .expect("validated live above")
            .outgoing
            .add(rel_type_id, Link::new(id2, rel_id));

        let (_, t2, s2) = id::decode(id2);
        self.node_table_mut(t2)
            .adjacency_mut(s2)
            .expect("validated live above")
            .incoming
            .add(rel_type_id, Link::new(id1, rel_id));

        self.apply_relationship_properties(rel_type_id, slot, properties_json)?;
        Ok(rel_id)
    }

    /// `id1` local; the peered coordinator completes the mirror on `id2`'s
    /// shard with [`Shard::relationship_add_to_incoming`].
    pub fn relationship_add_to_outgoing(
        &mut self,
        rel_type_name: &str,
        id1: u64,
        id2: u64,
        properties_json: Option<&serde_json::Value>,
    ) -> Result<u64> {
        if !self.valid_node(id1) {
            return Ok(id::INVALID);
        }
        let rel_type_id = types::register_relationship_type(rel_type_name);
        let slot = self.rel_table_mut(rel_type_id).allocate(id1, id2);
        let rel_id = id::encode(self.id, rel_type_id, slot);

        let (_, t1, s1) = id::decode(id1);
        self.node_table_mut(t1)
            .adjacency_mut(s1)
            .expect("validated live above")
            .outgoing
            .add(rel_type_id, Link::new(id2, rel_id));

        self.apply_relationship_properties(rel_type_id, slot, properties_json)?;
        Ok(rel_id)
    }

    /// `id2` local: completes the mirror created by
    /// [`Shard::relationship_add_to_outgoing`] on the other shard.
    pub fn relationship_add_to_incoming(
        &mut self,
        rel_type_id: u16,
        rel_id: u64,
        id1: u64,
        id2: u64,
    ) -> bool {
        if !self.valid_node(id2) {
            return false;
        }
        let (_, t2, s2) = id::decode(id2);
        self.node_table_mut(t2)
            .adjacency_mut(s2)
            .expect("validated live above")
            .incoming
            .add(rel_type_id, Link::new(id1, rel_id));
        true
    }

    fn apply_relationship_properties(
        &mut self,
        rel_type_id: u16,
        slot: u64,
        properties_json: Option<&serde_json::Value>,
    ) -> Result<()> {
        let Some(json) = properties_json else {
            return Ok(());
        };
        let registry = types::snapshot();
        let schema = registry.relationship_schema(rel_type_id).cloned().unwrap_or_default();
        let table = self.rel_table_mut(rel_type_id);
        let ok = table.properties.set_from_json(&schema, slot, json)?;
        if !ok {
            return Err(Error::InvalidArgument(
                "properties do not match the relationship type's schema".to_string(),
            ));
        }
        Ok(())
    }

    /// Erase the starting-side bookkeeping for `rel_id` (outgoing group
    /// entry + the relationship's own slot, which lives on this, its
    /// starting, shard). Reports `(rel_type, ending_id)` so the caller can
    /// dispatch the mirror removal.
    pub fn relationship_remove_get_incoming(&mut self, rel_id: u64) -> Result<(u16, u64)> {
        if !self.valid_relationship(rel_id) {
            return Err(Error::NotFound);
        }
        let (_, rel_type_id, slot) = id::decode(rel_id);
        let (starting_id, ending_id) = self
            .rel_table(rel_type_id)
            .and_then(|t| t.endpoints(slot))
            .ok_or(Error::NotFound)?;

        let (_, t1, s1) = id::decode(starting_id);
        if let Some(adjacency) = self.node_table_mut(t1).adjacency_mut(s1) {
            adjacency
                .outgoing
                .remove_one(rel_type_id, Link::new(ending_id, rel_id));
        }
        self.rel_table_mut(rel_type_id).free(slot);
        Ok((rel_type_id, ending_id))
    }

    /// Erase the ending-side mirror of `rel_id` only.
    pub fn relationship_remove_incoming(&mut self, rel_type_id: u16, rel_id: u64, ending_node_id: u64) -> bool {
        let (_, t2, s2) = id::decode(ending_node_id);
        match self.node_table_mut(t2).adjacency_mut(s2) {
            Some(adjacency) => !adjacency
                .incoming
                .remove(rel_type_id, |l| l.rel_id == rel_id)
                .is_empty(),
            None => false,
        }
    }

    /// Erase the starting-side mirror of `rel_id` and free its slot. Used
    /// when the ending node is being removed wholesale and needs no
    /// further bookkeeping.
    pub fn relationship_remove_outgoing(&mut self, rel_type_id: u16, rel_id: u64, starting_node_id: u64) -> bool {
        let (_, t1, s1) = id::decode(starting_node_id);
        let removed = if let Some(adjacency) = self.node_table_mut(t1).adjacency_mut(s1) {
            !adjacency
                .outgoing
                .remove(rel_type_id, |l| l.rel_id == rel_id)
                .is_empty()
        } else {
            false
        };
        let (_, _, slot) = id::decode(rel_id);
        self.rel_table_mut(rel_type_id).free(slot);
        removed
    }

    pub fn relationship_types_get_count(&self) -> u16 {
        types::snapshot().relationship_type_count()
    }

    pub fn relationship_type_get_count(&self, type_name: &str) -> u64 {
        let Some(type_id) = types::snapshot().relationship_type_id(type_name) else {
            return 0;
        };
        self.rel_table(type_id).map(|t| t.live_count()).unwrap_or(0)
    }

    pub fn relationship_types_get(&self) -> std::collections::BTreeSet<String> {
        types::snapshot().relationship_types()
    }

    pub fn relationship_type_get(
        &self,
        type_name: &str,
    ) -> std::collections::BTreeMap<String, &'static str> {
        types::snapshot()
            .relationship_type_id(type_name)
            .and_then(|id| types::snapshot().relationship_schema(id).map(|s| s.property_types()))
            .unwrap_or_default()
    }

    pub fn all_relationship_ids(&self, type_name: &str, skip: usize, limit: usize) -> Vec<u64> {
        let registry = types::snapshot();
        let Some(type_id) = registry.relationship_type_id(type_name) else {
            return Vec::new();
        };
        let Some(table) = self.rel_table(type_id) else {
            return Vec::new();
        };
        table
            .live_slots_sorted()
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|slot| id::encode(self.id, type_id, slot))
            .collect()
    }

    pub fn all_relationships(&self, type_name: &str, skip: usize, limit: usize) -> Vec<Relationship> {
        self.all_relationship_ids(type_name, skip, limit)
            .into_iter()
            .map(|id| self.relationship_get(id))
            .collect()
    }

    // ---------------------------------------------------------------
    // Properties
    // ---------------------------------------------------------------

    pub fn node_property_get(&self, node_id: u64, name: &str) -> Result<property::Value> {
        if !self.valid_node(node_id) {
            return Err(Error::NotFound);
        }
        let (_, type_id, slot) = id::decode(node_id);
        let registry = types::snapshot();
        let schema = registry.node_schema(type_id).cloned().unwrap_or_default();
        Ok(self
            .node_table(type_id)
            .expect("validated live above")
            .properties
            .get(&schema, slot, name)?)
    }

    pub fn node_property_set(&mut self, node_id: u64, name: &str, value: property::Value) -> Result<()> {
        if !self.valid_node(node_id) {
            return Err(Error::NotFound);
        }
        let (_, type_id, slot) = id::decode(node_id);
        let registry = types::snapshot();
        let schema = registry.node_schema(type_id).cloned().unwrap_or_default();
        self.node_table_mut(type_id).properties.set(&schema, slot, name, value)?;
        Ok(())
    }

    pub fn node_property_delete(&mut self, node_id: u64, name: &str) -> Result<()> {
        if !self.valid_node(node_id) {
            return Err(Error::NotFound);
        }
        let (_, type_id, slot) = id::decode(node_id);
        let registry = types::snapshot();
        let schema = registry.node_schema(type_id).cloned().unwrap_or_default();
        self.node_table_mut(type_id).properties.delete(&schema, slot, name)?;
        Ok(())
    }

    pub fn relationship_property_get(&self, rel_id: u64, name: &str) -> Result<property::Value> {
        if !self.valid_relationship(rel_id) {
            return Err(Error::NotFound);
        }
        let (_, type_id, slot) = id::decode(rel_id);
        let registry = types::snapshot();
        let schema = registry.relationship_schema(type_id).cloned().unwrap_or_default();
        Ok(self
            .rel_table(type_id)
            .expect("validated live above")
            .properties
            .get(&schema, slot, name)?)
    }

    pub fn relationship_property_set(
        &mut self,
        rel_id: u64,
        name: &str,
        value: property::Value,
    ) -> Result<()> {
        if !self.valid_relationship(rel_id) {
            return Err(Error::NotFound);
        }
        let (_, type_id, slot) = id::decode(rel_id);
        let registry = types::snapshot();
        let schema = registry.relationship_schema(type_id).cloned().unwrap_or_default();
        self.rel_table_mut(type_id).properties.set(&schema, slot, name, value)?;
        Ok(())
    }

    pub fn relationship_property_delete(&mut self, rel_id: u64, name: &str) -> Result<()> {
        if !self.valid_relationship(rel_id) {
            return Err(Error::NotFound);
        }
        let (_, type_id, slot) = id::decode(rel_id);
        let registry = types::snapshot();
        let schema = registry.relationship_schema(type_id).cloned().unwrap_or_default();
        self.rel_table_mut(type_id).properties.delete(&schema, slot, name)?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Filters
    // ---------------------------------------------------------------

    pub fn filter_count_nodes(&self, ids: &[u64], type_id: u16, name: &str, op: Operator, value: &property::Value) -> usize {
        let registry = types::snapshot();
        let Some(schema) = registry.node_schema(type_id) else {
            return 0;
        };
        let Some(table) = self.node_table(type_id) else {
            return 0;
        };
        property::count(schema, &table.properties, ids, name, op, value)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn filter_ids_nodes(
        &self,
        ids: &[u64],
        type_id: u16,
        name: &str,
        op: Operator,
        value: &property::Value,
        skip: usize,
        limit: usize,
        sort: Sort,
    ) -> Vec<u64> {
        let registry = types::snapshot();
        let Some(schema) = registry.node_schema(type_id) else {
            return Vec::new();
        };
        let Some(table) = self.node_table(type_id) else {
            return Vec::new();
        };
        property::ids(schema, &table.properties, ids, name, op, value, skip, limit, sort)
    }

    pub fn filter_count_relationships(
        &self,
        ids: &[u64],
        type_id: u16,
        name: &str,
        op: Operator,
        value: &property::Value,
    ) -> usize {
        let registry = types::snapshot();
        let Some(schema) = registry.relationship_schema(type_id) else {
            return 0;
        };
        let Some(table) = self.rel_table(type_id) else {
            return 0;
        };
        property::count(schema, &table.properties, ids, name, op, value)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn filter_ids_relationships(
        &self,
        ids: &[u64],
        type_id: u16,
        name: &str,
        op: Operator,
        value: &property::Value,
        skip: usize,
        limit: usize,
        sort: Sort,
    ) -> Vec<u64> {
        let registry = types::snapshot();
        let Some(schema) = registry.relationship_schema(type_id) else {
            return Vec::new();
        };
        let Some(table) = self.rel_table(type_id) else {
            return Vec::new();
        };
        property::ids(schema, &table.properties, ids, name, op, value, skip, limit, sort)
    }
}
