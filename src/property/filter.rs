//! Filter predicates over a caller-supplied id list (§4.3).
//!
//! `count`/`ids` iterate the *caller-supplied* id list, not the full type,
//! so output order matches input order modulo `sort`.

use crate::id;
use crate::property::{Schema, Store, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    StartsWith,
    EndsWith,
    Contains,
    IsNull,
    NotNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sort {
    None,
    Ascending,
    Descending,
}

fn cmp_values(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    use Value::*;
    match (a, b) {
        (Boolean(x), Boolean(y)) => x.partial_cmp(y),
        (I64(x), I64(y)) => x.partial_cmp(y),
        (F64(x), F64(y)) => x.partial_cmp(y),
        (String(x), String(y)) => x.partial_cmp(y),
        _ => None,
    }
}

fn matches(value: &Value, present: bool, op: Operator, needle: &Value) -> bool {
    match op {
        Operator::IsNull => !present,
        Operator::NotNull => present,
        Operator::Eq => present && cmp_values(value, needle) == Some(std::cmp::Ordering::Equal),
        Operator::Neq => !present || cmp_values(value, needle) != Some(std::cmp::Ordering::Equal),
        Operator::Lt => present && cmp_values(value, needle) == Some(std::cmp::Ordering::Less),
        Operator::Lte => {
            present
                && matches!(
                    cmp_values(value, needle),
                    Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
                )
        }
        Operator::Gt => present && cmp_values(value, needle) == Some(std::cmp::Ordering::Greater),
        Operator::Gte => {
            present
                && matches!(
                    cmp_values(value, needle),
                    Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
                )
        }
        Operator::StartsWith => match (value, needle) {
            (Value::String(a), Value::String(b)) => present && a.starts_with(b.as_str()),
            _ => false,
        },
        Operator::EndsWith => match (value, needle) {
            (Value::String(a), Value::String(b)) => present && a.ends_with(b.as_str()),
            _ => false,
        },
        Operator::Contains => match (value, needle) {
            (Value::String(a), Value::String(b)) => present && a.contains(b.as_str()),
            _ => false,
        },
    }
}

/// Evaluate `op`/`value` for `name` over `ids`, returning the matching
/// count. Reads the column directly for every id in the caller's list.
pub fn count(
    schema: &Schema,
    store: &Store,
    ids: &[u64],
    name: &str,
    op: Operator,
    value: &Value,
) -> usize {
    ids_matching(schema, store, ids, name, op, value).count()
}

fn ids_matching<'a>(
    schema: &'a Schema,
    store: &'a Store,
    ids: &'a [u64],
    name: &'a str,
    op: Operator,
    value: &'a Value,
) -> impl Iterator<Item = u64> + 'a {
    ids.iter().copied().filter(move |&id| {
        let slot = id::slot_of(id);
        let Some(prop_id) = schema.id_of(name) else {
            return false;
        };
        let present = store.is_present(prop_id, slot);
        let stored = store.get(schema, slot, name).unwrap_or(Value::Boolean(false));
        matches(&stored, present, op, value)
    })
}

/// Evaluate `op`/`value` for `name` over `ids`, returning matching ids
/// after `skip`/`limit` and optional `sort` by the property's value.
pub fn ids(
    schema: &Schema,
    store: &Store,
    ids_in: &[u64],
    name: &str,
    op: Operator,
    value: &Value,
    skip: usize,
    limit: usize,
    sort: Sort,
) -> Vec<u64> {
    let mut matched: Vec<u64> = ids_matching(schema, store, ids_in, name, op, value).collect();

    if sort != Sort::None {
        matched.sort_by(|&a, &b| {
            let va = store
                .get(schema, id::slot_of(a), name)
                .unwrap_or(Value::Boolean(false));
            let vb = store
                .get(schema, id::slot_of(b), name)
                .unwrap_or(Value::Boolean(false));
            let ord = cmp_values(&va, &vb).unwrap_or(std::cmp::Ordering::Equal);
            if sort == Sort::Descending {
                ord.reverse()
            } else {
                ord
            }
        });
    }

    matched.into_iter().skip(skip).take(limit).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::id::encode;
    use crate::property::Kind;

    fn setup() -> (Schema, Store, Vec<u64>) {
        let mut schema = Schema::new();
        schema.register("age", Kind::I64).unwrap();
        let mut store = Store::new();
        let mut ids = Vec::new();
        for i in 0..1000u64 {
            let id = encode(0, 1, i);
            store.set(&schema, i, "age", Value::I64(i as i64)).unwrap();
            ids.push(id);
        }
        (schema, store, ids)
    }

    #[test]
    fn gt_and_lt_intersection_sizes() {
        let (schema, store, ids) = setup();
        let gt500 = ids(
            &schema,
            &store,
            &ids,
            "age",
            Operator::Gt,
            &Value::I64(500),
            0,
            usize::MAX,
            Sort::None,
        );
        assert_eq!(gt500.len(), 499);

        let lt600 = ids(
            &schema,
            &store,
            &ids,
            "age",
            Operator::Lt,
            &Value::I64(600),
            0,
            usize::MAX,
            Sort::None,
        );
        assert_eq!(lt600.len(), 600);
    }

    #[test]
    fn empty_input_returns_empty() {
        let (schema, store, _) = setup();
        let out = ids(
            &schema,
            &store,
            &[],
            "age",
            Operator::Gt,
            &Value::I64(0),
            0,
            10,
            Sort::None,
        );
        assert!(out.is_empty());
    }
}
