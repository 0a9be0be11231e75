//! RFC 4122 name-based UUID derivation and the alias rewrite hook.

use uuid::Uuid;

/// Derive a version-5 (SHA-1, name-based) UUID per RFC 4122 §4.3.
///
/// Pure and deterministic: the same `(namespace, name)` pair yields the same
/// UUID on every run and platform.
pub fn derive(namespace: Uuid, name: &str) -> Uuid {
    Uuid::new_v5(&namespace, name.as_bytes())
}

/// Build the process seed UUID from an operator-supplied string.
///
/// The string is hashed under the nil namespace, so the same operator input
/// always produces the same seed.
pub fn seed_from_str(input: &str) -> Uuid {
    derive(Uuid::nil(), input)
}

/// Answers a single identifier rewrite.
///
/// The key is the same pair the alias backend uses for its entries: a type
/// qualifier (empty when the rewrite is untyped) plus the functional
/// identifier being replaced. A remote implementation backed by the alias
/// service can be swapped in here without touching the transformer.
pub trait AliasResolver {
    /// Resolve `(kind, functional_id)` to the replacement UUID.
    fn resolve(&self, kind: &str, functional_id: &str) -> Uuid;
}

/// Local resolver deriving v5 UUIDs under the configured seed namespace.
///
/// An empty `kind` derives the functional id directly; a non-empty `kind`
/// is prepended with a `:` separator, giving typed identifiers their own
/// derivation space under the same seed.
#[derive(Debug, Clone, Copy)]
pub struct LocalDeriver {
    seed: Uuid,
}

impl LocalDeriver {
    pub fn new(seed: Uuid) -> Self {
        Self { seed }
    }

    /// The configured seed namespace.
    pub fn seed(&self) -> Uuid {
        self.seed
    }
}

impl AliasResolver for LocalDeriver {
    fn resolve(&self, kind: &str, functional_id: &str) -> Uuid {
        if kind.is_empty() {
            derive(self.seed, functional_id)
        } else {
            derive(self.seed, &format!("{}:{}", kind, functional_id))
        }
    }
}
