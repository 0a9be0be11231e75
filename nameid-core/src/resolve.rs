//! Resolution of field specs to the entity keys they target.
//!
//! Precedence is load-bearing: an exact key wins over the namespaced
//! shortcut, which wins over the namespace-agnostic local-part sweep. The
//! sweep is what lets a URL author write `shaid` against entities whose keys
//! are fully namespaced but whose `_id` (and therefore entity namespace) is
//! absent.

use crate::entity::{local_part, Entity};
use crate::plan::{FieldSpec, MatchKind};

/// The entity keys a spec targets, in match order.
///
/// Exact specs yield at most one key from the precedence chain, falling back
/// to every key whose local part equals the token. Suffix specs yield every
/// key whose local part ends with `.<token>`, restricted to the entity
/// namespace when the spec is namespaced and the entity has one.
pub fn target_keys(entity: &Entity, entity_ns: Option<&str>, spec: &FieldSpec) -> Vec<String> {
    match spec.match_kind {
        MatchKind::Exact => exact_targets(entity, entity_ns, spec),
        MatchKind::Suffix => suffix_targets(entity, entity_ns, spec),
    }
}

fn exact_targets(entity: &Entity, entity_ns: Option<&str>, spec: &FieldSpec) -> Vec<String> {
    let shortcut = entity_ns.map(|ns| format!("{}:{}", ns, spec.token));

    // Namespaced specs prefer the shortcut; bare specs prefer the exact key.
    let chain: [Option<&str>; 2] = if spec.namespaced {
        [shortcut.as_deref(), Some(spec.token.as_str())]
    } else {
        [Some(spec.token.as_str()), shortcut.as_deref()]
    };

    for candidate in chain.into_iter().flatten() {
        if entity.contains_key(candidate) {
            return vec![candidate.to_string()];
        }
    }

    // Local-part sweep over namespaced keys the chain could not name.
    entity
        .keys()
        .filter(|key| key.contains(':') && local_part(key) == spec.token)
        .cloned()
        .collect()
}

fn suffix_targets(entity: &Entity, entity_ns: Option<&str>, spec: &FieldSpec) -> Vec<String> {
    let wanted = format!(".{}", spec.token);
    let ns_prefix = match (spec.namespaced, entity_ns) {
        (true, Some(ns)) => Some(format!("{}:", ns)),
        _ => None,
    };

    entity
        .keys()
        .filter(|key| match &ns_prefix {
            Some(prefix) => key.starts_with(prefix),
            None => true,
        })
        .filter(|key| local_part(key).ends_with(&wanted))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::RewriteStyle;
    use serde_json::{json, Value};

    fn entity(value: Value) -> Entity {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn exact(token: &str, namespaced: bool) -> FieldSpec {
        FieldSpec {
            token: token.to_string(),
            namespaced,
            match_kind: MatchKind::Exact,
            style: RewriteStyle::Plain,
        }
    }

    fn suffix(token: &str, namespaced: bool) -> FieldSpec {
        FieldSpec {
            token: token.to_string(),
            namespaced,
            match_kind: MatchKind::Suffix,
            style: RewriteStyle::Plain,
        }
    }

    #[test]
    fn test_bare_spec_prefers_bare_key() {
        // Adversarial: both forms present; the bare spec must pick the bare key.
        let e = entity(json!({
            "_id": "ns:1",
            "shaid": "bare-value",
            "ns:shaid": "namespaced-value"
        }));
        assert_eq!(
            target_keys(&e, Some("ns"), &exact("shaid", false)),
            ["shaid"]
        );
        // The namespaced spec picks the other one.
        assert_eq!(
            target_keys(&e, Some("ns"), &exact("shaid", true)),
            ["ns:shaid"]
        );
    }

    #[test]
    fn test_bare_spec_namespaced_shortcut() {
        let e = entity(json!({"_id": "ns:1", "ns:shaid": "v"}));
        assert_eq!(
            target_keys(&e, Some("ns"), &exact("shaid", false)),
            ["ns:shaid"]
        );
    }

    #[test]
    fn test_namespaced_spec_falls_back_to_bare_key() {
        let e = entity(json!({"shaid": "v"}));
        assert_eq!(target_keys(&e, None, &exact("shaid", true)), ["shaid"]);
    }

    #[test]
    fn test_local_part_sweep_without_entity_namespace() {
        // Fully namespaced entity with no _id: both spec forms still find it.
        let e = entity(json!({"customer:shaid": "v", "customer:key": "val"}));
        assert_eq!(
            target_keys(&e, None, &exact("shaid", false)),
            ["customer:shaid"]
        );
        assert_eq!(
            target_keys(&e, None, &exact("shaid", true)),
            ["customer:shaid"]
        );
    }

    #[test]
    fn test_no_target_when_nothing_matches() {
        let e = entity(json!({"key": "val", "fields": 2}));
        assert!(target_keys(&e, None, &exact("shaid", false)).is_empty());
        assert!(target_keys(&e, None, &suffix("shaid", false)).is_empty());
    }

    #[test]
    fn test_suffix_matches_local_part_only() {
        let e = entity(json!({
            "customer:group.oldid": "a",
            "plain.oldid": "b",
            "oldid": "c",
            "customer:oldid": "d"
        }));
        assert_eq!(
            target_keys(&e, None, &suffix("oldid", false)),
            ["customer:group.oldid", "plain.oldid"]
        );
    }

    #[test]
    fn test_namespaced_suffix_restricts_to_entity_namespace() {
        let e = entity(json!({
            "_id": "customer:1",
            "customer:group.oldid": "a",
            "vendor:group.oldid": "b"
        }));
        assert_eq!(
            target_keys(&e, Some("customer"), &suffix("oldid", true)),
            ["customer:group.oldid"]
        );
        // Without an entity namespace the restriction degrades away.
        assert_eq!(
            target_keys(&e, None, &suffix("oldid", true)),
            ["customer:group.oldid", "vendor:group.oldid"]
        );
    }
}
