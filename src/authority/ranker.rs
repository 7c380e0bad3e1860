//! Authority detection cache, ranking and conflict resolution.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::patterns;
use super::{AuthorityInfo, AuthorityLevel};
use crate::constraint::Constraint;
use crate::provenance::SourceDescriptor;

/// Sorts after any real date string.
const MISSING_DATE: &str = "9999";

/// A constraint with the authority of its source and its 1-based rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedConstraint {
    pub rank: usize,
    pub authority: AuthorityInfo,
    pub constraint: Constraint,
}

/// Outcome of adjudicating a set of conflicting constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    /// One constraint prevails.
    Resolved {
        winner: Constraint,
        #[serde(skip_serializing_if = "Option::is_none")]
        loser: Option<Constraint>,
        reason: String,
        hierarchy: Vec<RankedConstraint>,
    },

    /// No winner; the ranked constraints go to a human.
    Unresolved {
        reason: String,
        constraints: Vec<Constraint>,
        #[serde(skip_serializing_if = "Option::is_none")]
        recommendation: Option<String>,
    },
}

impl Resolution {
    /// Returns true if a winner was chosen.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    /// The winning constraint, if any.
    #[must_use]
    pub const fn winner(&self) -> Option<&Constraint> {
        match self {
            Self::Resolved { winner, .. } => Some(winner),
            Self::Unresolved { .. } => None,
        }
    }

    /// Human-readable reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::Resolved { reason, .. } | Self::Unresolved { reason, .. } => reason,
        }
    }
}

/// Classifies sources and ranks constraints by the authority behind them.
///
/// Detection results are cached for the lifetime of the ranker, keyed by
/// `(doc_title, court)`. The cache is append-only and a key always maps to
/// the first info computed for it, so the ranker can be shared across
/// concurrent requests behind an `Arc`.
#[derive(Debug, Default)]
pub struct AuthorityRanker {
    cache: Mutex<HashMap<(String, String), AuthorityInfo>>,
}

impl AuthorityRanker {
    /// Create a new instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies a source.
    ///
    /// Tries the court field, then the title, then the quote against the
    /// court pattern tables, then the document type keywords. Anything
    /// still unclassified is treated as document evidence, so `Unknown` is
    /// never returned.
    pub fn detect_authority(&self, source: &SourceDescriptor) -> AuthorityInfo {
        let key = (source.doc_title.to_lowercase(), source.court.to_lowercase());

        if let Some(info) = self.lock().get(&key) {
            return info.clone();
        }

        let level = patterns::level_from_text(&source.court)
            .or_else(|| patterns::level_from_text(&source.doc_title))
            .or_else(|| patterns::level_from_text(&source.quote))
            .or_else(|| patterns::level_from_doc_type(&source.doc_type))
            .unwrap_or(AuthorityLevel::DocumentEvidence);

        let name = if source.court.is_empty() {
            &source.doc_title
        } else {
            &source.court
        };

        let info = AuthorityInfo {
            level,
            court_name: (!name.is_empty()).then(|| name.clone()),
            jurisdiction: patterns::jurisdiction(name),
            binding: level.is_binding(),
            overruled: false,
        };
        debug!(doc_title = %source.doc_title, court = %source.court, level = %level, "authority detected");

        self.lock().entry(key).or_insert(info).clone()
    }

    /// Number of cached sources.
    #[must_use]
    pub fn cached_sources(&self) -> usize {
        self.lock().len()
    }

    /// One-sentence account of what a source's authority means.
    pub fn explain_authority(&self, source: &SourceDescriptor) -> String {
        let info = self.detect_authority(source);
        match info.court_name {
            Some(name) => format!("{}. Source: {name}", info.level.significance()),
            None => info.level.significance().to_string(),
        }
    }

    /// Sorts constraints highest authority first.
    ///
    /// Key: `(level ordinal, not binding, date)`. Dates compare as raw
    /// strings and a missing date sorts last; this is lexical, not
    /// calendar, order. The sort is stable.
    pub fn rank_constraints(&self, constraints: &[Constraint]) -> Vec<Constraint> {
        self.rank_with_authority(constraints)
            .into_iter()
            .map(|r| r.constraint)
            .collect()
    }

    /// Like [`rank_constraints`](Self::rank_constraints), keeping each
    /// source's authority.
    pub fn rank_with_authority(&self, constraints: &[Constraint]) -> Vec<RankedConstraint> {
        let mut keyed: Vec<_> = constraints
            .iter()
            .map(|c| (self.detect_authority(&c.provenance.descriptor()), c))
            .collect();

        keyed.sort_by(|(a_info, a), (b_info, b)| {
            let a_key = (a_info.level.ordinal(), !a_info.binding, date_key(a));
            let b_key = (b_info.level.ordinal(), !b_info.binding, date_key(b));
            a_key.cmp(&b_key)
        });

        keyed
            .into_iter()
            .enumerate()
            .map(|(idx, (authority, c))| RankedConstraint {
                rank: idx + 1,
                authority,
                constraint: c.clone(),
            })
            .collect()
    }

    /// Decides which of several conflicting constraints prevails.
    ///
    /// Compares the top- and bottom-ranked constraints. Different levels
    /// resolve in favour of the higher; equal levels are left for manual
    /// review with the full ranked list.
    pub fn resolve_conflict(&self, constraints: &[Constraint]) -> Resolution {
        match constraints {
            [] => Resolution::Unresolved {
                reason: "no constraints".to_string(),
                constraints: Vec::new(),
                recommendation: None,
            },
            [only] => Resolution::Resolved {
                winner: only.clone(),
                loser: None,
                reason: "only one constraint".to_string(),
                hierarchy: self.rank_with_authority(constraints),
            },
            _ => {
                let ranked = self.rank_with_authority(constraints);
                let top = &ranked[0];
                let bottom = &ranked[ranked.len() - 1];

                if top.authority.level.ordinal() == bottom.authority.level.ordinal() {
                    return Resolution::Unresolved {
                        reason: format!(
                            "same authority level ({}) - manual review required",
                            top.authority.level
                        ),
                        constraints: ranked.into_iter().map(|r| r.constraint).collect(),
                        recommendation: Some("Manual review required".to_string()),
                    };
                }

                Resolution::Resolved {
                    winner: top.constraint.clone(),
                    loser: Some(bottom.constraint.clone()),
                    reason: format!(
                        "{} ({}) overrides {} ({})",
                        top.authority.level,
                        source_name(top),
                        bottom.authority.level,
                        source_name(bottom),
                    ),
                    hierarchy: ranked,
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(String, String), AuthorityInfo>> {
        // Entries are never partially written, so a poisoned cache is still usable.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn date_key(c: &Constraint) -> &str {
    c.provenance.date.as_deref().unwrap_or(MISSING_DATE)
}

fn source_name(r: &RankedConstraint) -> &str {
    r.authority
        .court_name
        .as_deref()
        .unwrap_or(&r.constraint.provenance.doc_title)
}
