//! Satisfiability validation of constraint sets.
//!
//! A batch is turned into one tracked formula: every hard constraint (and
//! every soft one, on request) is parsed and asserted under its id. The
//! engine's verdict is mapped to a [`ValidationResult`]; an unsatisfiable
//! core is handed to the [`ConflictExplainer`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constraint::Constraint;
use crate::error::{SolverError, ValidationError};
use crate::explain::{ConflictExplainer, ConflictExplanation};
use crate::logic::parse;
use crate::provenance::truncate_chars;
use crate::solver::{SatEngine, SolveOutcome, TrackedFormula};

/// Quotes attached to model facts are cut to this many characters.
pub const FACT_QUOTE_LEN: usize = 200;

/// Solver verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Sat,
    Unsat,
    Unknown,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sat => "sat",
            Self::Unsat => "unsat",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A constraint left out of the formula because its logic form did not parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedConstraint {
    pub id: String,
    pub logic_form: String,
    pub reason: String,
}

/// Outcome of [`ConsistencyValidator::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub satisfiable: bool,
    pub status: SolveStatus,

    /// Complete assignment; present iff `status` is `Sat`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<BTreeMap<String, bool>>,

    /// Ids of an unsatisfiable subset, in input order; present iff `Unsat`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsat_core: Option<Vec<String>>,

    /// Present iff `Unsat`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<Vec<ConflictExplanation>>,

    pub explanation: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<DroppedConstraint>,
}

impl ValidationResult {
    fn sat(model: BTreeMap<String, bool>, explanation: impl Into<String>) -> Self {
        Self {
            satisfiable: true,
            status: SolveStatus::Sat,
            model: Some(model),
            unsat_core: None,
            conflicts: None,
            explanation: explanation.into(),
            dropped: Vec::new(),
        }
    }

    fn unsat(core: Vec<String>, conflicts: Vec<ConflictExplanation>) -> Self {
        let explanation = format!(
            "Found {} conflicting constraint(s) producing {} conflict(s)",
            core.len(),
            conflicts.len()
        );
        Self {
            satisfiable: false,
            status: SolveStatus::Unsat,
            model: None,
            unsat_core: Some(core),
            conflicts: Some(conflicts),
            explanation,
            dropped: Vec::new(),
        }
    }

    fn unknown(err: &SolverError) -> Self {
        let explanation = match err {
            SolverError::Timeout { duration_ms } => {
                format!("Satisfiability unknown: solver timed out after {duration_ms}ms")
            }
            SolverError::ResourceLimit { .. } => {
                format!("Satisfiability unknown: formula too complex ({err})")
            }
            SolverError::Busy { .. } | SolverError::Engine { .. } => format!("Satisfiability unknown: {err}"),
        };
        Self {
            satisfiable: false,
            status: SolveStatus::Unknown,
            model: None,
            unsat_core: None,
            conflicts: None,
            explanation,
            dropped: Vec::new(),
        }
    }
}

/// One variable of a model together with the constraints that mention it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFact {
    pub variable: String,
    pub value: bool,
    pub natural_language: String,
    pub sources: Vec<FactSource>,
}

/// Where a model fact comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactSource {
    pub doc_title: String,
    pub quote: String,
    pub constraint: String,
}

/// Checks joint satisfiability of constraint sets.
#[derive(Clone)]
pub struct ConsistencyValidator {
    engine: Arc<dyn SatEngine>,
    explainer: ConflictExplainer,
}

impl fmt::Debug for ConsistencyValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsistencyValidator")
            .field("engine", &self.engine.name())
            .finish_non_exhaustive()
    }
}

impl ConsistencyValidator {
    /// Creates a validator over `engine`.
    #[must_use]
    pub fn new(engine: Arc<dyn SatEngine>, explainer: ConflictExplainer) -> Self {
        Self { engine, explainer }
    }

    /// The explainer used for unsatisfiable cores.
    #[must_use]
    pub fn explainer(&self) -> &ConflictExplainer {
        &self.explainer
    }

    /// Decides whether `constraints` can all hold.
    ///
    /// Soft constraints are ignored unless `include_soft`. A constraint
    /// whose logic form does not parse is dropped and listed in
    /// [`ValidationResult::dropped`]; validation continues without it.
    pub fn validate(&self, constraints: &[Constraint], include_soft: bool) -> ValidationResult {
        let included: Vec<&Constraint> = constraints
            .iter()
            .filter(|c| include_soft || c.is_hard)
            .collect();

        if included.is_empty() {
            let msg = if constraints.is_empty() {
                "No constraints to validate"
            } else {
                "No hard constraints to validate"
            };
            return ValidationResult::sat(BTreeMap::new(), msg);
        }

        let mut seen = HashSet::new();
        for c in &included {
            if !seen.insert(c.id.as_str()) {
                let err = ValidationError::DuplicateConstraintId { id: c.id.clone() };
                warn!(constraint_id = %c.id, error = %err, "duplicate constraint id");
            }
        }

        let mut formula = TrackedFormula::default();
        for c in &included {
            for v in &c.variables {
                formula.declare(v);
            }
        }

        let mut dropped = Vec::new();
        for c in &included {
            match parse(&c.logic_form) {
                Ok(expr) => {
                    for symbol in expr.symbols() {
                        if formula.declare(symbol) {
                            debug!(constraint_id = %c.id, variable = symbol, "declared undeclared variable");
                        }
                    }
                    formula.track(c.id.clone(), expr);
                }
                Err(e) => {
                    warn!(constraint_id = %c.id, logic_form = %c.logic_form, error = %e, "dropping unparseable constraint");
                    dropped.push(DroppedConstraint {
                        id: c.id.clone(),
                        logic_form: c.logic_form.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(
            engine = self.engine.name(),
            constraints = formula.tracked.len(),
            variables = formula.variables.len(),
            "validating"
        );

        let mut result = match self.engine.solve(&formula) {
            SolveOutcome::Sat(mut model) => {
                for v in &formula.variables {
                    model.entry(v.clone()).or_insert(false);
                }
                let msg = format!("All {} constraint(s) are consistent", formula.tracked.len());
                ValidationResult::sat(model, msg)
            }
            SolveOutcome::Unsat(core) => {
                let conflicts = self.explainer.explain(&core, constraints);
                info!(core = ?core, conflicts = conflicts.len(), "constraints are inconsistent");
                ValidationResult::unsat(core, conflicts)
            }
            SolveOutcome::Unknown(err) => {
                warn!(error = %err, "satisfiability unknown");
                ValidationResult::unknown(&err)
            }
        };
        result.dropped = dropped;
        result
    }
}

/// Lists each model variable with its value and the sources behind it.
///
/// Every constraint that declares a variable contributes one source; the
/// fact's text is the first such constraint's gloss.
#[must_use]
pub fn facts_from_model(model: &BTreeMap<String, bool>, constraints: &[Constraint]) -> Vec<ModelFact> {
    model
        .iter()
        .map(|(variable, &value)| {
            let related: Vec<&Constraint> = constraints.iter().filter(|c| c.mentions(variable)).collect();
            ModelFact {
                variable: variable.clone(),
                value,
                natural_language: related
                    .first()
                    .map_or_else(|| variable.clone(), |c| c.gloss().to_string()),
                sources: related
                    .iter()
                    .map(|c| FactSource {
                        doc_title: c.provenance.doc_title.clone(),
                        quote: truncate_chars(&c.provenance.quote, FACT_QUOTE_LEN),
                        constraint: c.gloss().to_string(),
                    })
                    .collect(),
            }
        })
        .collect()
}
