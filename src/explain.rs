//! Conflict explanations for an unsatisfiable core.
//!
//! The core is *an* unsatisfiable subset, not necessarily a minimal one, so
//! pairwise explanations are a presentation of the core rather than a claim
//! that each pair is inconsistent on its own.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::authority::AuthorityRanker;
use crate::constraint::{Constraint, ConstraintKind};
use crate::error::ValidationError;

/// How two constraints conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// An assertion against a negation of the same fact.
    DirectContradiction,
    /// The constraints cannot hold together.
    LogicalImpossibility,
    /// At least one side is a temporal constraint.
    TemporalConflict,
    /// One constraint is unsatisfiable by itself.
    SelfContradiction,
}

impl ConflictType {
    /// Classifies a pair by the kinds of its sides.
    #[must_use]
    pub fn classify(a: ConstraintKind, b: ConstraintKind) -> Self {
        use ConstraintKind::{Assertion, Negation, Temporal};
        match (a, b) {
            (Assertion, Negation) | (Negation, Assertion) => Self::DirectContradiction,
            (Temporal, _) | (_, Temporal) => Self::TemporalConflict,
            _ => Self::LogicalImpossibility,
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DirectContradiction => "direct contradiction",
            Self::LogicalImpossibility => "logical impossibility",
            Self::TemporalConflict => "temporal conflict",
            Self::SelfContradiction => "self-contradiction",
        };
        f.write_str(s)
    }
}

/// One explained conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictExplanation {
    pub constraint_a: Constraint,
    /// Same as `constraint_a` for a self-contradiction.
    pub constraint_b: Constraint,
    pub conflict_type: ConflictType,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority_resolution: Option<String>,
    #[serde(default)]
    pub resolution_available: bool,
}

/// Turns core ids into provenance-backed explanations.
#[derive(Debug, Clone)]
pub struct ConflictExplainer {
    authority: Arc<AuthorityRanker>,
}

impl ConflictExplainer {
    /// Creates an explainer that adjudicates with `authority`.
    #[must_use]
    pub fn new(authority: Arc<AuthorityRanker>) -> Self {
        Self { authority }
    }

    /// Explains the conflicts among the constraints named by `core`.
    ///
    /// Ids with no matching constraint, and repeated ids, are skipped. One
    /// remaining constraint is a self-contradiction; two or more yield one
    /// explanation per unordered pair, in core order.
    pub fn explain(&self, core: &[String], constraints: &[Constraint]) -> Vec<ConflictExplanation> {
        let mut members: Vec<&Constraint> = Vec::with_capacity(core.len());
        for id in core {
            if members.iter().any(|c| &c.id == id) {
                continue;
            }
            match constraints.iter().find(|c| &c.id == id) {
                Some(c) => members.push(c),
                None => {
                    let err = ValidationError::ConstraintNotFound { id: id.clone() };
                    debug!(constraint_id = %id, error = %err, "skipping core id");
                }
            }
        }

        match members.as_slice() {
            [] => Vec::new(),
            [only] => vec![self_contradiction(only)],
            _ => {
                let mut out = Vec::new();
                for (i, a) in members.iter().enumerate() {
                    for b in &members[i + 1..] {
                        out.push(self.explain_pair(a, b));
                    }
                }
                out
            }
        }
    }

    fn explain_pair(&self, a: &Constraint, b: &Constraint) -> ConflictExplanation {
        let conflict_type = ConflictType::classify(a.kind, b.kind);
        let explanation = format!(
            "'{}' (from {}) conflicts with '{}' (from {})",
            a.gloss(),
            a.provenance.doc_title,
            b.gloss(),
            b.provenance.doc_title,
        );

        let auth_a = self.authority.detect_authority(&a.provenance.descriptor());
        let auth_b = self.authority.detect_authority(&b.provenance.descriptor());

        let authority_resolution = if auth_a.level.ordinal() == auth_b.level.ordinal() {
            None
        } else {
            let ((win, win_level), (lose, lose_level)) = if auth_a.level.outranks(auth_b.level) {
                ((a, auth_a.level), (b, auth_b.level))
            } else {
                ((b, auth_b.level), (a, auth_a.level))
            };
            Some(format!(
                "{win_level} ({}) overrides {lose_level} ({})",
                win.provenance.doc_title, lose.provenance.doc_title
            ))
        };

        ConflictExplanation {
            constraint_a: a.clone(),
            constraint_b: b.clone(),
            conflict_type,
            explanation,
            resolution_available: authority_resolution.is_some(),
            authority_resolution,
        }
    }
}

fn self_contradiction(c: &Constraint) -> ConflictExplanation {
    ConflictExplanation {
        constraint_a: c.clone(),
        constraint_b: c.clone(),
        conflict_type: ConflictType::SelfContradiction,
        explanation: format!(
            "'{}' (from {}) contradicts itself: '{}' cannot be satisfied",
            c.gloss(),
            c.provenance.doc_title,
            c.logic_form
        ),
        authority_resolution: None,
        resolution_available: false,
    }
}
