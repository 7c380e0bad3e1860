//! Operation definitions and payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authority::{AuthorityInfo, RankedConstraint, Resolution};
use crate::constraint::Constraint;
use crate::explain::ConflictExplanation;
use crate::extract::Finding;
use crate::provenance::{SourceDescriptor, SourceDocument};
use crate::validator::ValidationResult;

/// Envelope around one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Protocol version (e.g., "1.0").
    pub version: String,

    /// Correlation id.
    pub request_id: Uuid,

    /// When the request was created.
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,
}

impl Request {
    /// Current protocol version.
    pub const CURRENT_VERSION: &'static str = "1.0";

    /// Wraps `operation` with a fresh id and the current time.
    #[must_use]
    pub fn new(operation: Operation) -> Self {
        Self {
            version: Self::CURRENT_VERSION.to_string(),
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            operation,
        }
    }

    /// Sets a caller-chosen request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }
}

/// The operations the service executes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "payload", rename_all = "snake_case")]
pub enum Operation {
    /// Turn findings into constraints.
    ExtractConstraints(ExtractPayload),

    /// Check a constraint set for joint satisfiability.
    ValidateConsistency(ValidatePayload),

    /// Explain an unsatisfiable core.
    ExplainConflict(ExplainPayload),

    /// Order constraints by source authority and adjudicate.
    RankByAuthority(RankPayload),

    /// Classify one source.
    DetectAuthority(DetectAuthorityPayload),
}

impl Operation {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ExtractConstraints(_) => "extract_constraints",
            Self::ValidateConsistency(_) => "validate_consistency",
            Self::ExplainConflict(_) => "explain_conflict",
            Self::RankByAuthority(_) => "rank_by_authority",
            Self::DetectAuthority(_) => "detect_authority",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractPayload {
    pub findings: Vec<Finding>,

    /// Documents the findings cite, for court/date/type enrichment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatePayload {
    pub constraints: Vec<Constraint>,

    /// Also solve soft constraints.
    #[serde(default)]
    pub include_soft: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainPayload {
    pub unsat_core: Vec<String>,
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankPayload {
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectAuthorityPayload {
    pub source: SourceDescriptor,
}

/// Result of executing an [`Operation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", content = "payload", rename_all = "snake_case")]
pub enum Response {
    /// Result of `extract_constraints`.
    Extracted {
        extraction_id: Uuid,
        constraints: Vec<Constraint>,
    },

    /// Result of `validate_consistency`.
    Validated(ValidationResult),

    /// Result of `explain_conflict`.
    Explained {
        conflicts: Vec<ConflictExplanation>,
    },

    /// Result of `rank_by_authority`.
    Ranked {
        ranked: Vec<RankedConstraint>,
        resolution: Resolution,
    },

    /// Result of `detect_authority`.
    Authority {
        authority: AuthorityInfo,
        explanation: String,
    },
}
