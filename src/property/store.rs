//! Property store (§4.3): type-partitioned columnar arenas with typed value
//! access, one arena per property, each paired with a presence bitmap.
//!
//! Storage note: the spec calls for "offset-into-pool" representations for
//! string/list properties; here the dense per-slot `Vec<T>` column plays
//! that role directly rather than through a separate interned pool, which
//! is semantically equivalent (same access pattern, same sentinel-on-absence
//! behaviour) for a single-process, non-durable store.

use bit_vec::BitVec;

use crate::property::{Error, Kind, Schema, Value};

#[derive(Debug, Clone)]
enum Column {
    Boolean(Vec<bool>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    String(Vec<String>),
    ListBoolean(Vec<Vec<bool>>),
    ListI64(Vec<Vec<i64>>),
    ListF64(Vec<Vec<f64>>),
    ListString(Vec<Vec<String>>),
}

impl Column {
    fn new(kind: Kind) -> Self {
        match kind {
            Kind::Boolean => Column::Boolean(Vec::new()),
            Kind::I64 => Column::I64(Vec::new()),
            Kind::F64 => Column::F64(Vec::new()),
            Kind::String => Column::String(Vec::new()),
            Kind::ListBoolean => Column::ListBoolean(Vec::new()),
            Kind::ListI64 => Column::ListI64(Vec::new()),
            Kind::ListF64 => Column::ListF64(Vec::new()),
            Kind::ListString => Column::ListString(Vec::new()),
        }
    }

    fn len(&self) -> usize {
        match self {
            Column::Boolean(v) => v.len(),
            Column::I64(v) => v.len(),
            Column::F64(v) => v.len(),
            Column::String(v) => v.len(),
            Column::ListBoolean(v) => v.len(),
            Column::ListI64(v) => v.len(),
            Column::ListF64(v) => v.len(),
            Column::ListString(v) => v.len(),
        }
    }

    fn ensure_len(&mut self, slot: usize, kind: Kind) {
        if self.len() > slot {
            return;
        }
        macro_rules! grow {
            ($v:expr, $sentinel:expr) => {
                $v.resize(slot + 1, $sentinel)
            };
        }
        match self {
            Column::Boolean(v) => grow!(v, false),
            Column::I64(v) => grow!(v, 0),
            Column::F64(v) => grow!(v, 0.0),
            Column::String(v) => grow!(v, String::new()),
            Column::ListBoolean(v) => grow!(v, Vec::new()),
            Column::ListI64(v) => grow!(v, Vec::new()),
            Column::ListF64(v) => grow!(v, Vec::new()),
            Column::ListString(v) => grow!(v, Vec::new()),
        }
        let _ = kind;
    }

    fn clear_slot(&mut self, slot: usize) {
        if slot >= self.len() {
            return;
        }
        match self {
            Column::Boolean(v) => v[slot] = false,
            Column::I64(v) => v[slot] = 0,
            Column::F64(v) => v[slot] = 0.0,
            Column::String(v) => v[slot].clear(),
            Column::ListBoolean(v) => v[slot].clear(),
            Column::ListI64(v) => v[slot].clear(),
            Column::ListF64(v) => v[slot].clear(),
            Column::ListString(v) => v[slot].clear(),
        }
    }

    fn get(&self, slot: usize) -> Value {
        match self {
            Column::Boolean(v) => Value::Boolean(v.get(slot).copied().unwrap_or_default()),
            Column::I64(v) => Value::I64(v.get(slot).copied().unwrap_or_default()),
            Column::F64(v) => Value::F64(v.get(slot).copied().unwrap_or_default()),
            Column::String(v) => Value::String(v.get(slot).cloned().unwrap_or_default()),
            Column::ListBoolean(v) => Value::ListBoolean(v.get(slot).cloned().unwrap_or_default()),
            Column::ListI64(v) => Value::ListI64(v.get(slot).cloned().unwrap_or_default()),
            Column::ListF64(v) => Value::ListF64(v.get(slot).cloned().unwrap_or_default()),
            Column::ListString(v) => Value::ListString(v.get(slot).cloned().unwrap_or_default()),
        }
    }

    fn set(&mut self, slot: usize, value: Value) -> Result<(), Error> {
        macro_rules! put {
            ($v:expr, $variant:path, $kind_name:expr) => {
                match value {
                    $variant(x) => {
                        $v[slot] = x;
                        Ok(())
                    }
                    _ => Err(Error::KindMismatch {
                        expected: $kind_name,
                    }),
                }
            };
        }
        match self {
            Column::Boolean(v) => put!(v, Value::Boolean, "boolean"),
            Column::I64(v) => put!(v, Value::I64, "i64"),
            Column::F64(v) => put!(v, Value::F64, "f64"),
            Column::String(v) => put!(v, Value::String, "string"),
            Column::ListBoolean(v) => put!(v, Value::ListBoolean, "list-of-boolean"),
            Column::ListI64(v) => put!(v, Value::ListI64, "list-of-i64"),
            Column::ListF64(v) => put!(v, Value::ListF64, "list-of-f64"),
            Column::ListString(v) => put!(v, Value::ListString, "list-of-string"),
        }
    }
}

#[derive(Debug, Clone)]
struct Arena {
    column: Column,
    presence: BitVec,
}

impl Arena {
    fn new(kind: Kind) -> Self {
        Self {
            column: Column::new(kind),
            presence: BitVec::new(),
        }
    }

    fn ensure_len(&mut self, slot: usize, kind: Kind) {
        self.column.ensure_len(slot, kind);
        if self.presence.len() <= slot {
            self.presence.grow(slot + 1 - self.presence.len(), false);
        }
    }
}

/// A type-partitioned property store: one [`Arena`] per registered
/// property, indexed by slot.
#[derive(Debug, Clone, Default)]
pub struct Store {
    arenas: Vec<Option<Arena>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn arena_mut(&mut self, id: u16, kind: Kind) -> &mut Arena {
        let idx = id as usize;
        if self.arenas.len() <= idx {
            self.arenas.resize_with(idx + 1, || None);
        }
        self.arenas[idx].get_or_insert_with(|| Arena::new(kind))
    }

    pub fn delete_column(&mut self, id: u16) {
        if let Some(slot) = self.arenas.get_mut(id as usize) {
            *slot = None;
        }
    }

    /// Read `name`'s value at `slot`, or the kind's sentinel if unset.
    pub fn get(&self, schema: &Schema, slot: u64, name: &str) -> Result<Value, Error> {
        let id = schema
            .id_of(name)
            .ok_or_else(|| Error::UnknownProperty {
                name: name.to_string(),
            })?;
        let kind = schema.kind_of(id).expect("schema id always has a kind");
        match self.arenas.get(id as usize).and_then(Option::as_ref) {
            Some(arena) => Ok(arena.column.get(slot as usize)),
            None => Ok(Value::sentinel(kind)),
        }
    }

    pub fn is_present(&self, id: u16, slot: u64) -> bool {
        self.arenas
            .get(id as usize)
            .and_then(Option::as_ref)
            .map(|a| a.presence.get(slot as usize).unwrap_or(false))
            .unwrap_or(false)
    }

    /// Write `name`'s value at `slot`, validating against `schema`.
    pub fn set(&mut self, schema: &Schema, slot: u64, name: &str, value: Value) -> Result<(), Error> {
        let id = schema
            .id_of(name)
            .ok_or_else(|| Error::UnknownProperty {
                name: name.to_string(),
            })?;
        let kind = schema.kind_of(id).expect("schema id always has a kind");
        if value.kind().name() != kind.name() {
            return Err(Error::KindMismatch { expected: kind.name() });
        }
        let slot = slot as usize;
        let arena = self.arena_mut(id, kind);
        arena.ensure_len(slot, kind);
        arena.column.set(slot, value)?;
        arena.presence.set(slot, true);
        Ok(())
    }

    /// Clear `name` at `slot` back to its sentinel and unset presence.
    pub fn delete(&mut self, schema: &Schema, slot: u64, name: &str) -> Result<(), Error> {
        let id = schema
            .id_of(name)
            .ok_or_else(|| Error::UnknownProperty {
                name: name.to_string(),
            })?;
        if let Some(arena) = self.arenas.get_mut(id as usize).and_then(Option::as_mut) {
            let slot = slot as usize;
            arena.column.clear_slot(slot);
            if slot < arena.presence.len() {
                arena.presence.set(slot, false);
            }
        }
        Ok(())
    }

    /// Clear every property at `slot`, regardless of schema membership.
    pub fn delete_all(&mut self, slot: u64) {
        let slot = slot as usize;
        for arena in self.arenas.iter_mut().flatten() {
            arena.column.clear_slot(slot);
            if slot < arena.presence.len() {
                arena.presence.set(slot, false);
            }
        }
    }

    /// Parse a JSON object against `schema` and apply it field by field.
    /// Writes are applied only after every field validates; a single
    /// violation leaves the store untouched.
    pub fn set_from_json(
        &mut self,
        schema: &Schema,
        slot: u64,
        object: &serde_json::Value,
    ) -> Result<bool, Error> {
        let Some(map) = object.as_object() else {
            return Err(Error::NotAnObject);
        };
        let mut staged = Vec::with_capacity(map.len());
        for (name, json) in map {
            let Some(kind) = schema.kind_of_name(name) else {
                return Ok(false);
            };
            let Ok(value) = Value::from_json(kind, json) else {
                return Ok(false);
            };
            staged.push((name.clone(), value));
        }
        for (name, value) in staged {
            self.set(schema, slot, &name, value)?;
        }
        Ok(true)
    }

    /// `delete_all(slot)` then `set_from_json(slot, object)`, atomic from
    /// the observer's perspective on this shard (no suspension in between).
    pub fn reset_from_json(
        &mut self,
        schema: &Schema,
        slot: u64,
        object: &serde_json::Value,
    ) -> Result<bool, Error> {
        self.delete_all(slot);
        self.set_from_json(schema, slot, object)
    }

    pub fn all_as_json(&self, schema: &Schema, slot: u64) -> serde_json::Map<String, serde_json::Value> {
        let mut out = serde_json::Map::new();
        for name in schema.names() {
            let id = schema.id_of(name).unwrap();
            if self.is_present(id, slot) {
                if let Ok(value) = self.get(schema, slot, name) {
                    out.insert(name.to_string(), value.to_json());
                }
            }
        }
        out
    }
}
