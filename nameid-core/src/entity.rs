//! Entity model helpers: namespaces, system fields, and `rdf:type` access.
//!
//! An entity is an open JSON object. Keys may be namespaced (`customer:shaid`)
//! or bare (`shaid`); the entity's own namespace is the prefix of its `_id`
//! value when that value has the `ns:local` form.

use serde_json::Value;

/// An entity as decoded from the request body. The underlying map preserves
/// insertion order, so untouched keys round-trip in their original position.
pub type Entity = serde_json::Map<String, Value>;

/// The identifier field, preserved on output and the default rewrite target.
pub const ID_FIELD: &str = "_id";

/// The type field consulted by plan gates.
pub const TYPE_FIELD: &str = "rdf:type";

/// Marker prefix for entity references in the source serialization.
const REF_SENTINEL: &str = "~:";

/// Strip the `~:` entity-reference sentinel, if present.
pub fn strip_ref_sentinel(value: &str) -> &str {
    value.strip_prefix(REF_SENTINEL).unwrap_or(value)
}

/// The namespace of a `ns:local` key or value: the text before the first
/// colon. `None` when there is no colon or the prefix is empty.
pub fn namespace_of(key: &str) -> Option<&str> {
    match key.find(':') {
        Some(0) | None => None,
        Some(idx) => Some(&key[..idx]),
    }
}

/// The local part of a key: the text after the last colon, or the whole key.
pub fn local_part(key: &str) -> &str {
    match key.rfind(':') {
        Some(idx) => &key[idx + 1..],
        None => key,
    }
}

/// The entity namespace, taken from the `_id` value when it is a namespaced
/// string. Entities without an `_id`, or with an un-namespaced one, have no
/// namespace.
pub fn entity_namespace(entity: &Entity) -> Option<&str> {
    entity
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .and_then(namespace_of)
}

/// Drop every `_`-prefixed system field except `_id`, in place. Remaining
/// keys keep their original order.
pub fn strip_system_fields(entity: &mut Entity) {
    entity.retain(|key, _| !key.starts_with('_') || key == ID_FIELD);
}

/// The entity's `rdf:type` strings, in declaration order.
///
/// A single string value yields one entry; an array yields its string
/// elements (non-strings are skipped); anything else yields none. Sentinel
/// stripping is left to the gate so the stored values stay untouched.
pub fn type_values(entity: &Entity) -> Vec<&str> {
    match entity.get(TYPE_FIELD) {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}
