//! Legal authority model.
//!
//! Sources are placed on a fixed precedent hierarchy (lower ordinal means
//! more authoritative). When two constraints conflict, the one backed by
//! the more authoritative source prevails; equal levels go to manual review.

mod patterns;
mod ranker;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use ranker::{AuthorityRanker, RankedConstraint, Resolution};

/// Position on the precedent hierarchy.
///
/// Several variants share an ordinal (e.g. circuit courts and state supreme
/// courts). Compare with [`AuthorityLevel::ordinal`], never by variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityLevel {
    SupremeCourt,
    CircuitCourt,
    StateSupreme,
    DistrictCourt,
    StateAppeals,
    TrialCourt,
    Administrative,
    SecondarySource,
    WitnessStatement,
    DocumentEvidence,
    Unknown,
}

impl AuthorityLevel {
    /// Binding sources sit at or above this ordinal.
    pub const BINDING_CUTOFF: u8 = 3;

    /// Ordinal on the total order. Lower is more authoritative.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::SupremeCourt => 1,
            Self::CircuitCourt | Self::StateSupreme => 2,
            Self::DistrictCourt | Self::StateAppeals => 3,
            Self::TrialCourt => 4,
            Self::Administrative => 5,
            Self::SecondarySource => 6,
            Self::WitnessStatement | Self::DocumentEvidence => 7,
            Self::Unknown => 10,
        }
    }

    /// True if this level creates binding precedent.
    #[must_use]
    pub const fn is_binding(self) -> bool {
        self.ordinal() <= Self::BINDING_CUTOFF
    }

    /// True if `self` is strictly more authoritative than `other`.
    #[must_use]
    pub const fn outranks(self, other: Self) -> bool {
        self.ordinal() < other.ordinal()
    }

    /// Human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SupremeCourt => "Supreme Court",
            Self::CircuitCourt => "Circuit Court",
            Self::StateSupreme => "State Supreme Court",
            Self::DistrictCourt => "District Court",
            Self::StateAppeals => "State Appeals Court",
            Self::TrialCourt => "Trial Court",
            Self::Administrative => "Administrative",
            Self::SecondarySource => "Secondary Source",
            Self::WitnessStatement => "Witness Statement",
            Self::DocumentEvidence => "Document Evidence",
            Self::Unknown => "Unknown",
        }
    }

    /// What the level means for precedent.
    #[must_use]
    pub const fn significance(self) -> &'static str {
        match self {
            Self::SupremeCourt => "Supreme Court decisions are binding on all lower courts",
            Self::CircuitCourt => "Circuit Court decisions are binding within their circuit",
            Self::StateSupreme => "State Supreme Court decisions are authoritative for state law",
            Self::DistrictCourt => "District Court decisions may be persuasive but not binding",
            Self::StateAppeals => "State Appeals Court decisions are persuasive within the state",
            Self::TrialCourt => "Trial court filings are evidence, not precedent",
            Self::Administrative => "Administrative rulings may guide but don't bind courts",
            Self::SecondarySource => "Secondary sources inform but don't create law",
            Self::WitnessStatement => "Witness statements are factual claims, not legal authority",
            Self::DocumentEvidence => "Documentary evidence is factual, not legal authority",
            Self::Unknown => "Authority level could not be determined",
        }
    }
}

impl fmt::Display for AuthorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Derived facts about a source, cached per `(doc_title, court)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityInfo {
    pub level: AuthorityLevel,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub court_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,

    /// True iff the level is district court or higher.
    pub binding: bool,

    /// Reserved; nothing sets it yet.
    #[serde(default)]
    pub overruled: bool,
}

impl AuthorityInfo {
    /// Builds info for a level; `binding` follows the level.
    #[must_use]
    pub fn new(level: AuthorityLevel) -> Self {
        Self {
            level,
            court_name: None,
            jurisdiction: None,
            binding: level.is_binding(),
            overruled: false,
        }
    }
}
