//! The node view returned at the API boundary (§3 "Node").

use serde::Serialize;
use serde_json::Map;

use crate::id;

/// A node as handed back to callers. Absence is represented by `id == 0`
/// (§7 "User-visible failure"), not by an error.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Node {
    pub id: u64,
    pub type_name: String,
    pub key: String,
    pub properties: Map<String, serde_json::Value>,
}

impl Node {
    pub fn empty() -> Self {
        Self {
            id: id::INVALID,
            type_name: String::new(),
            key: String::new(),
            properties: Map::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id == id::INVALID
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::empty()
    }
}
