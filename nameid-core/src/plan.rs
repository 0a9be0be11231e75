//! Compiler from the request path to a rewrite plan.
//!
//! The path is a small DSL naming the fields to rewrite and, optionally, a
//! type gate:
//!
//! ```text
//! path     = "/" specs [ "/" gate ]
//! specs    = spec *( ";" spec )
//! spec     = [":"] [ "." | "+" ] token
//! token    = 1*( ALPHA / DIGIT / "_" / "-" )
//! gate     = ns ":" [ value ] | ""
//! ```
//!
//! `:` marks a spec as entity-namespaced, `.` switches it to suffix matching,
//! and `+` selects the prefix-preserving rewrite. The empty path compiles to
//! the default plan rewriting `_id`. This module is the sole authority on
//! what a spec or gate may look like; nothing downstream re-parses the URL.

use thiserror::Error;

/// Rejection of a request path that does not fit the plan grammar.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    /// A `;`-separated spec was empty or reduced to a bare marker.
    #[error("empty field spec in rewrite path")]
    EmptySpec,

    /// A field token contained a character outside `[A-Za-z0-9_-]`.
    #[error("invalid field token {token:?}")]
    InvalidToken { token: String },

    /// The gate segment was not `ns:`, `ns:value`, or empty.
    #[error("invalid type gate {gate:?}")]
    InvalidGate { gate: String },

    /// The path had more segments than `/<specs>/<gate>`.
    #[error("unknown path shape")]
    UnknownPath,
}

/// How a spec's token is matched against entity keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The token names a field outright.
    Exact,
    /// The token matches any key whose local part ends with `.<token>`.
    Suffix,
}

/// How a targeted value is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteStyle {
    /// Replace the value with the derived UUID string.
    Plain,
    /// Split `prefix:functional-id` values, derive from the whole, and
    /// re-emit as `~:<prefix>:<uuid>`.
    PreservePrefix,
}

/// One field rewrite directive parsed from the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// The user-written field token.
    pub token: String,
    /// Whether targeting prefers the `<entity-namespace>:<token>` form and
    /// the rewrite derives under the gate's matched type.
    pub namespaced: bool,
    pub match_kind: MatchKind,
    pub style: RewriteStyle,
}

/// Predicate over an entity's `rdf:type` selecting the derivation type for
/// namespaced specs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeGate {
    /// No gate: namespaced specs derive under the bare seed.
    Unconditional,
    /// Use the entity's first `rdf:type` value, when it has one.
    AnyType,
    /// Use the first `rdf:type` value in the given namespace.
    Namespace(String),
    /// Use the given `ns:value` directly; `rdf:type` is not consulted.
    Value(String),
}

/// An ordered sequence of field specs plus the plan's type gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub specs: Vec<FieldSpec>,
    pub gate: TypeGate,
}

impl Plan {
    /// Compile a request path into a plan.
    ///
    /// The bare root path yields the default plan: rewrite `_id`, ungated.
    pub fn compile(path: &str) -> Result<Plan, PlanError> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        if trimmed.is_empty() {
            return Ok(Plan {
                specs: vec![FieldSpec {
                    token: crate::entity::ID_FIELD.to_string(),
                    namespaced: false,
                    match_kind: MatchKind::Exact,
                    style: RewriteStyle::Plain,
                }],
                gate: TypeGate::Unconditional,
            });
        }

        let mut segments = trimmed.splitn(3, '/');
        let spec_text = segments.next().unwrap_or("");
        let gate_text = segments.next();
        if segments.next().is_some() {
            return Err(PlanError::UnknownPath);
        }

        let mut specs = Vec::new();
        let mut any_colon = false;
        for part in spec_text.split(';') {
            let (spec, leading_colon) = parse_spec(part)?;
            any_colon |= leading_colon;
            specs.push(spec);
        }

        let gate = parse_gate(gate_text, any_colon)?;
        Ok(Plan { specs, gate })
    }
}

fn token_is_valid(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Parse one `;`-separated spec. Also reports whether the spec carried a
/// leading `:`, which is what activates the implicit any-type gate.
fn parse_spec(text: &str) -> Result<(FieldSpec, bool), PlanError> {
    if text.is_empty() {
        return Err(PlanError::EmptySpec);
    }

    let (rest, leading_colon) = match text.strip_prefix(':') {
        Some(rest) => (rest, true),
        None => (text, false),
    };

    let mut namespaced = leading_colon;
    let (token, match_kind, style) = if let Some(token) = rest.strip_prefix('.') {
        (token, MatchKind::Suffix, RewriteStyle::Plain)
    } else if let Some(token) = rest.strip_prefix('+') {
        // Prefix-preserving rewrites target like namespaced specs.
        namespaced = true;
        (token, MatchKind::Exact, RewriteStyle::PreservePrefix)
    } else {
        (rest, MatchKind::Exact, RewriteStyle::Plain)
    };

    if token.is_empty() {
        return Err(PlanError::EmptySpec);
    }
    if !token_is_valid(token) {
        return Err(PlanError::InvalidToken {
            token: token.to_string(),
        });
    }

    Ok((
        FieldSpec {
            token: token.to_string(),
            namespaced,
            match_kind,
            style,
        },
        leading_colon,
    ))
}

/// Parse the optional gate segment.
///
/// An absent or empty segment leaves the implicit gate in force: any-type
/// when some spec had a leading `:`, unconditional otherwise. The literal
/// `rdf:type` names the entity's own type field and is the any-type gate
/// spelled out.
fn parse_gate(text: Option<&str>, any_colon: bool) -> Result<TypeGate, PlanError> {
    let implicit = if any_colon {
        TypeGate::AnyType
    } else {
        TypeGate::Unconditional
    };

    let text = match text {
        None | Some("") => return Ok(implicit),
        Some(text) => text,
    };

    if text == crate::entity::TYPE_FIELD {
        return Ok(TypeGate::AnyType);
    }

    match text.find(':') {
        Some(idx) if idx > 0 => {
            if idx + 1 == text.len() {
                Ok(TypeGate::Namespace(text[..idx].to_string()))
            } else {
                Ok(TypeGate::Value(text.to_string()))
            }
        }
        _ => Err(PlanError::InvalidGate {
            gate: text.to_string(),
        }),
    }
}
