//! Application of a compiled plan to decoded entities.

use std::collections::HashSet;

use serde_json::Value;

use crate::derive::AliasResolver;
use crate::entity::{entity_namespace, strip_system_fields, Entity};
use crate::gate::matched_type;
use crate::plan::{Plan, RewriteStyle, TypeGate};
use crate::resolve::target_keys;

/// Transform a batch of entities, preserving input order.
pub fn transform_batch(
    entities: Vec<Entity>,
    plan: &Plan,
    resolver: &dyn AliasResolver,
) -> Vec<Entity> {
    entities
        .into_iter()
        .map(|entity| transform_entity(entity, plan, resolver))
        .collect()
}

/// Transform one entity.
///
/// System fields other than `_id` are dropped first; the entity namespace is
/// taken from `_id` before any rewrite can touch it. Each key is rewritten
/// at most once, by the first spec in plan order that targets it.
pub fn transform_entity(mut entity: Entity, plan: &Plan, resolver: &dyn AliasResolver) -> Entity {
    let entity_ns = entity_namespace(&entity).map(str::to_owned);
    strip_system_fields(&mut entity);

    let gate_kind = matched_type(&plan.gate, &entity).map(str::to_owned);
    let value_gate = match &plan.gate {
        TypeGate::Value(value) => Some(value.clone()),
        _ => None,
    };

    let mut rewritten: HashSet<String> = HashSet::new();
    for spec in &plan.specs {
        let kind = if spec.namespaced {
            gate_kind.as_deref().unwrap_or("")
        } else {
            ""
        };
        for key in target_keys(&entity, entity_ns.as_deref(), spec) {
            if !rewritten.insert(key.clone()) {
                continue;
            }
            if let Some(value) = entity.get_mut(&key) {
                rewrite_value(value, kind, spec.style, value_gate.as_deref(), resolver);
            }
        }
    }

    entity
}

/// Rewrite one targeted value in place. Strings are replaced, arrays are
/// rewritten element-wise, and anything else is left untouched.
fn rewrite_value(
    value: &mut Value,
    kind: &str,
    style: RewriteStyle,
    value_gate: Option<&str>,
    resolver: &dyn AliasResolver,
) {
    match value {
        Value::String(s) => {
            *value = Value::String(rewrite_str(s, kind, style, value_gate, resolver));
        }
        Value::Array(items) => {
            for item in items {
                if let Value::String(s) = item {
                    *item = Value::String(rewrite_str(s, kind, style, value_gate, resolver));
                }
            }
        }
        _ => {}
    }
}

fn rewrite_str(
    input: &str,
    kind: &str,
    style: RewriteStyle,
    value_gate: Option<&str>,
    resolver: &dyn AliasResolver,
) -> String {
    if style == RewriteStyle::PreservePrefix {
        if let Some((prefix_path, functional_id)) = input.rsplit_once(':') {
            if !prefix_path.is_empty() {
                // The displayed prefix is the last path segment; an explicit
                // value gate overrides the derivation kind, not the display.
                let shown = prefix_path.rsplit(':').next().unwrap_or(prefix_path);
                let derived_kind = value_gate.unwrap_or(prefix_path);
                let id = resolver.resolve(derived_kind, functional_id);
                return format!("~:{}:{}", shown, id);
            }
        }
        // No embedded prefix: fall through to the plain rewrite.
    }
    resolver.resolve(kind, input).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::{seed_from_str, LocalDeriver};
    use crate::plan::Plan;
    use serde_json::json;

    const BARE_UUID: &str = "a60989a3-0af4-5d95-b632-72a604a96474";
    const BARE_UUID_ALSO: &str = "0e374c4b-be1d-5eb3-8385-5f177fd9a432";
    const GATED_UUID: &str = "81ef0d83-320b-540f-9e42-5cb9a3676bdc";
    const GATED_UUID_ALSO: &str = "052261c2-da4e-5d62-84e9-8f404c2babb0";

    fn deriver() -> LocalDeriver {
        LocalDeriver::new(seed_from_str("ginkgo"))
    }

    fn run(path: &str, body: serde_json::Value) -> serde_json::Value {
        let plan = Plan::compile(path).unwrap();
        let entities: Vec<Entity> = serde_json::from_value(body).unwrap();
        serde_json::to_value(transform_batch(entities, &plan, &deriver())).unwrap()
    }

    #[test]
    fn test_default_plan_rewrites_id_and_strips_system_fields() {
        let out = run(
            "/",
            json!([{
                "_id": "convert-to-sha1-UUID",
                "_previous": null,
                "_deleted": false,
                "key": "val",
                "fields": 2
            }]),
        );
        assert_eq!(out, json!([{"_id": BARE_UUID, "key": "val", "fields": 2}]));
    }

    #[test]
    fn test_entity_without_target_passes_through() {
        let out = run("/", json!([{"key": "val", "fields": 2}]));
        assert_eq!(out, json!([{"key": "val", "fields": 2}]));
    }

    #[test]
    fn test_gate_match_switches_derivation_kind() {
        let out = run(
            "/:shaid",
            json!([{
                "shaid": "convert-to-sha1-UUID",
                "rdf:type": "~:namespace:value",
                "key": "val"
            }]),
        );
        assert_eq!(
            out,
            json!([{
                "shaid": GATED_UUID,
                "rdf:type": "~:namespace:value",
                "key": "val"
            }])
        );
    }

    #[test]
    fn test_unmatched_gate_degrades_to_bare_seed() {
        let out = run("/:shaid", json!([{"shaid": "convert-to-sha1-UUID"}]));
        assert_eq!(out, json!([{"shaid": BARE_UUID}]));
    }

    #[test]
    fn test_bare_spec_ignores_gate() {
        let out = run(
            "/shaid;oldid",
            json!([{
                "_id": "ns:1",
                "ns:shaid": "convert-to-sha1-UUID",
                "ns:oldid": "convert-to-sha1-UUID",
                "rdf:type": "~:namespace:value"
            }]),
        );
        assert_eq!(
            out,
            json!([{
                "_id": "ns:1",
                "ns:shaid": BARE_UUID,
                "ns:oldid": BARE_UUID,
                "rdf:type": "~:namespace:value"
            }])
        );
    }

    #[test]
    fn test_array_values_rewrite_elementwise() {
        let out = run(
            "/:shaid",
            json!([{
                "_id": "ns:1",
                "ns:shaid": ["convert-to-sha1-UUID", "also-convert-to-sha1-UUID", "also-convert-to-sha1-UUID"],
                "rdf:type": "~:namespace:value"
            }]),
        );
        assert_eq!(
            out[0]["ns:shaid"],
            json!([GATED_UUID, GATED_UUID_ALSO, GATED_UUID_ALSO])
        );
    }

    #[test]
    fn test_mixed_array_leaves_non_strings() {
        let out = run(
            "/shaid",
            json!([{"shaid": ["convert-to-sha1-UUID", 7, null, true]}]),
        );
        assert_eq!(out[0]["shaid"], json!([BARE_UUID, 7, null, true]));
    }

    #[test]
    fn test_non_string_scalar_left_unchanged() {
        let out = run("/shaid", json!([{"shaid": 12345}]));
        assert_eq!(out, json!([{"shaid": 12345}]));
    }

    #[test]
    fn test_first_spec_wins_per_key() {
        // Both specs target the same key; only the first may rewrite it.
        let out = run(
            "/shaid;:shaid",
            json!([{
                "shaid": "convert-to-sha1-UUID",
                "rdf:type": "~:namespace:value"
            }]),
        );
        assert_eq!(out[0]["shaid"], json!(BARE_UUID));
    }

    #[test]
    fn test_prefix_rewrite_preserves_prefix_and_derives_from_whole() {
        let out = run(
            "/:shaid;+oldid",
            json!([{
                "_id": "entity:1",
                "entity:shaid": ["convert-to-sha1-UUID", "also-convert-to-sha1-UUID"],
                "entity:group.oldid": [
                    "ns:class:convert-to-sha1-UUID",
                    "ns:type:also-convert-to-sha1-UUID",
                    "ns:flavour:also-convert-to-sha1-UUID"
                ],
                "rdf:type": "~:namespace:value"
            }]),
        );
        assert_eq!(out[0]["entity:shaid"], json!([GATED_UUID, GATED_UUID_ALSO]));
        assert_eq!(
            out[0]["entity:group.oldid"],
            json!([
                "~:class:ab4ffc42-b2ba-535d-911a-5ab2da2bc59e",
                "~:type:cf526379-30af-563a-8789-710799ce33a7",
                "~:flavour:0437a832-73a7-537c-8086-081cec7fb7f3"
            ])
        );
    }

    #[test]
    fn test_prefix_rewrite_value_gate_overrides_derivation_kind() {
        // The gate value replaces the derivation kind; the shown prefix stays.
        let out = run(
            "/+oldid/namespace:value",
            json!([{"_id": "entity:1", "entity:oldid": "ns:class:convert-to-sha1-UUID"}]),
        );
        assert_eq!(
            out[0]["entity:oldid"],
            json!(format!("~:class:{}", GATED_UUID))
        );
    }

    #[test]
    fn test_prefix_rewrite_without_colon_degrades() {
        let out = run(
            "/+oldid",
            json!([{"_id": "entity:1", "entity:oldid": "plainvalue"}]),
        );
        assert_eq!(
            out[0]["entity:oldid"],
            json!("0205b0b1-e20f-5a24-b4d7-36a9542cf6a8")
        );

        let out = run(
            "/:shaid;+oldid",
            json!([{
                "_id": "entity:1",
                "entity:oldid": "plainvalue",
                "rdf:type": "~:namespace:value"
            }]),
        );
        // With the any-type gate matched, the colon-less value derives typed.
        assert_eq!(
            out[0]["entity:oldid"],
            json!("8cbcec96-ef52-5e0e-93aa-f91e52fbf96c")
        );
    }

    #[test]
    fn test_duplicate_inputs_map_to_equal_outputs() {
        let out = run(
            "/:shaid;:oldid",
            json!([{
                "_id": "ns:1",
                "ns:shaid": "convert-to-sha1-UUID",
                "ns:oldid": "convert-to-sha1-UUID",
                "rdf:type": "~:namespace:value"
            }]),
        );
        assert_eq!(out[0]["ns:shaid"], out[0]["ns:oldid"]);
        assert_eq!(out[0]["ns:shaid"], json!(GATED_UUID));
    }

    #[test]
    fn test_untargeted_keys_pass_structurally_unchanged() {
        let body = json!([{
            "_id": "ns:1",
            "ns:shaid": "convert-to-sha1-UUID",
            "nested": {"deep": [1, 2, {"x": "y"}]},
            "number": 2.5,
            "flag": false
        }]);
        let out = run("/:shaid", body.clone());
        assert_eq!(out[0]["nested"], body[0]["nested"]);
        assert_eq!(out[0]["number"], body[0]["number"]);
        assert_eq!(out[0]["flag"], body[0]["flag"]);
    }

    #[test]
    fn test_multi_entity_types_derive_independently() {
        let out = run(
            "/:shaid",
            json!([
                {
                    "_id": "ns:1",
                    "ns:shaid": "convert-to-sha1-UUID",
                    "rdf:type": "~:namespace:value"
                },
                {
                    "_id": "ns:2",
                    "ns:shaid": "also-convert-to-sha1-UUID",
                    "rdf:type": "~:namespace:othervalue"
                }
            ]),
        );
        assert_eq!(out[0]["ns:shaid"], json!(GATED_UUID));
        assert_eq!(
            out[1]["ns:shaid"],
            json!("b2a2ff67-027e-5790-b046-10d9f044fd28")
        );
    }

    #[test]
    fn test_suffix_spec_with_gate() {
        let out = run(
            "/:.shaid",
            json!([{
                "entity-namespace:prefix.shaid": "convert-to-sha1-UUID",
                "rdf:type": "~:namespace:value",
                "entity-namespace:key": "val"
            }]),
        );
        assert_eq!(out[0]["entity-namespace:prefix.shaid"], json!(GATED_UUID));
        assert_eq!(out[0]["entity-namespace:key"], json!("val"));
    }

    #[test]
    fn test_same_entity_same_plan_is_deterministic() {
        let body = json!([{
            "_id": "ns:1",
            "ns:shaid": "convert-to-sha1-UUID",
            "rdf:type": "~:namespace:value"
        }]);
        assert_eq!(run("/:shaid", body.clone()), run("/:shaid", body));
    }
}
