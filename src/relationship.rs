//! The relationship view returned at the API boundary (§3 "Relationship").

use serde::Serialize;
use serde_json::Map;

use crate::id;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Relationship {
    pub id: u64,
    pub type_name: String,
    pub starting_id: u64,
    pub ending_id: u64,
    pub properties: Map<String, serde_json::Value>,
}

impl Relationship {
    pub fn empty() -> Self {
        Self {
            id: id::INVALID,
            type_name: String::new(),
            starting_id: id::INVALID,
            ending_id: id::INVALID,
            properties: Map::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id == id::INVALID
    }
}

impl Default for Relationship {
    fn default() -> Self {
        Self::empty()
    }
}
