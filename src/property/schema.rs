//! Property schema (§4.2): per type, bidirectional name↔id↔kind maps.
//!
//! Registration of `(name, kind)` is idempotent when the kind matches; a
//! conflicting re-registration is rejected with [`Error::Conflict`].
//! Deletion removes the mapping; the caller (the property store) is
//! responsible for dropping the backing arena column.

use indexmap::IndexMap;

use crate::property::{Error, Kind};

#[derive(Debug, Clone, Default)]
pub struct Schema {
    by_name: IndexMap<String, u16>,
    kinds: Vec<Option<Kind>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `(name, kind)`, returning its property id. Idempotent when
    /// the name is already registered with the same kind.
    pub fn register(&mut self, name: &str, kind: Kind) -> Result<u16, Error> {
        if let Some(&id) = self.by_name.get(name) {
            let existing = self.kinds[id as usize].expect("registered id always has a kind");
            return if existing.name() == kind.name() {
                Ok(id)
            } else {
                Err(Error::Conflict {
                    name: name.to_string(),
                    existing: existing.name(),
                    requested: kind.name(),
                })
            };
        }
        let id = self.kinds.len() as u16;
        self.kinds.push(Some(kind));
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn id_of(&self, name: &str) -> Option<u16> {
        self.by_name.get(name).copied()
    }

    pub fn kind_of(&self, id: u16) -> Option<Kind> {
        self.kinds.get(id as usize).copied().flatten()
    }

    pub fn kind_of_name(&self, name: &str) -> Option<Kind> {
        self.id_of(name).and_then(|id| self.kind_of(id))
    }

    /// Remove the mapping for `name`. The id slot is left vacated (not
    /// reused) so any stale references resolve to "unknown" rather than a
    /// different property.
    pub fn delete(&mut self, name: &str) -> bool {
        if let Some(id) = self.by_name.shift_remove(name) {
            self.kinds[id as usize] = None;
            true
        } else {
            false
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn property_types(&self) -> std::collections::BTreeMap<String, &'static str> {
        self.by_name
            .iter()
            .filter_map(|(name, &id)| self.kind_of(id).map(|kind| (name.clone(), kind.name())))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn register_is_idempotent() {
        let mut schema = Schema::new();
        let id1 = schema.register("age", Kind::I64).unwrap();
        let id2 = schema.register("age", Kind::I64).unwrap();
        assert_eq!(id1, id2);
    }

    #[test]
    fn conflicting_kind_rejected() {
        let mut schema = Schema::new();
        schema.register("age", Kind::I64).unwrap();
        let err = schema.register("age", Kind::String).unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[test]
    fn delete_removes_mapping() {
        let mut schema = Schema::new();
        schema.register("age", Kind::I64).unwrap();
        assert!(schema.delete("age"));
        assert_eq!(schema.id_of("age"), None);
    }
}
