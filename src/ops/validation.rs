//! Request validation.
//!
//! Deserialized requests come from outside the process, so the envelope
//! and caller-supplied constraints are checked before execution.

use crate::constraint::Constraint;
use crate::error::ValidationError;
use crate::ops::operations::{Operation, Request};

/// Upper bound on findings or constraints in one request.
pub const MAX_BATCH_LEN: usize = 10_000;

fn validate_batch_len(field: &'static str, len: usize) -> Result<(), ValidationError> {
    if len > MAX_BATCH_LEN {
        return Err(ValidationError::BatchTooLarge {
            field: field.to_string(),
            len,
            max: MAX_BATCH_LEN,
        });
    }
    Ok(())
}

fn validate_constraints(constraints: &[Constraint]) -> Result<(), ValidationError> {
    validate_batch_len("constraints", constraints.len())?;
    for c in constraints {
        if c.id.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "constraint.id".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&c.confidence) {
            return Err(ValidationError::ConfidenceOutOfRange { value: c.confidence });
        }
    }
    Ok(())
}

impl Request {
    /// Checks the version and the caller-supplied payload.
    ///
    /// Duplicate constraint ids are not rejected here; the validator logs
    /// them and solves the batch as given.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version != Self::CURRENT_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                version: self.version.clone(),
                expected: Self::CURRENT_VERSION.to_string(),
            });
        }

        match &self.operation {
            Operation::ExtractConstraints(p) => {
                validate_batch_len("findings", p.findings.len())?;
                validate_batch_len("sources", p.sources.len())
            }
            Operation::ValidateConsistency(p) => validate_constraints(&p.constraints),
            Operation::ExplainConflict(p) => {
                validate_batch_len("unsat_core", p.unsat_core.len())?;
                validate_constraints(&p.constraints)
            }
            Operation::RankByAuthority(p) => validate_constraints(&p.constraints),
            Operation::DetectAuthority(_) => Ok(()),
        }
    }
}
