//! Evaluation of a plan's type gate against one entity.

use crate::entity::{namespace_of, strip_ref_sentinel, type_values, Entity};
use crate::plan::TypeGate;

/// The type value the gate selects for this entity, if any.
///
/// Namespaced specs derive under `seed` + the returned value; `None` means
/// they degrade to the bare seed. Entity `rdf:type` strings are compared
/// with the `~:` reference sentinel stripped, and the stripped form is what
/// gets returned.
pub fn matched_type<'a>(gate: &'a TypeGate, entity: &'a Entity) -> Option<&'a str> {
    match gate {
        TypeGate::Unconditional => None,
        TypeGate::Value(value) => Some(value.as_str()),
        TypeGate::AnyType => type_values(entity)
            .into_iter()
            .map(strip_ref_sentinel)
            .find(|value| !value.is_empty()),
        TypeGate::Namespace(ns) => type_values(entity)
            .into_iter()
            .map(strip_ref_sentinel)
            .find(|value| namespace_of(value) == Some(ns.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn entity(value: Value) -> Entity {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_unconditional_never_matches() {
        let e = entity(json!({"rdf:type": "~:namespace:value"}));
        assert_eq!(matched_type(&TypeGate::Unconditional, &e), None);
    }

    #[test]
    fn test_any_type_takes_first_nonempty() {
        let gate = TypeGate::AnyType;

        let e = entity(json!({"rdf:type": "~:namespace:value"}));
        assert_eq!(matched_type(&gate, &e), Some("namespace:value"));

        let e = entity(json!({"rdf:type": ["~:a:b", "~:c:d"]}));
        assert_eq!(matched_type(&gate, &e), Some("a:b"));

        // Absent, empty, or blank types leave the gate unmatched.
        for value in [json!({}), json!({"rdf:type": ""}), json!({"rdf:type": []}), json!({"rdf:type": [""]})]
        {
            assert_eq!(matched_type(&gate, &entity(value)), None);
        }
    }

    #[test]
    fn test_namespace_gate_first_match_wins() {
        let gate = TypeGate::Namespace("namespace".to_string());

        let e = entity(json!({"rdf:type": ["~:other:x", "~:namespace:value", "~:namespace:late"]}));
        assert_eq!(matched_type(&gate, &e), Some("namespace:value"));

        let e = entity(json!({"rdf:type": "~:names-r-us:value"}));
        assert_eq!(matched_type(&gate, &e), None);

        let e = entity(json!({}));
        assert_eq!(matched_type(&gate, &e), None);
    }

    #[test]
    fn test_value_gate_does_not_consult_types() {
        let gate = TypeGate::Value("namespace:value".to_string());

        let e = entity(json!({"rdf:type": ["~:names-r-us:value", "~:namespace:othervalue"]}));
        assert_eq!(matched_type(&gate, &e), Some("namespace:value"));

        let e = entity(json!({}));
        assert_eq!(matched_type(&gate, &e), Some("namespace:value"));
    }
}
