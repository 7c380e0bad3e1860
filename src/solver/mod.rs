//! Boolean satisfiability seam.
//!
//! The validator hands a [`TrackedFormula`] to a [`SatEngine`] and gets back
//! a model, the labels of an unsatisfiable core, or an `Unknown` verdict.
//! Each call is self-contained: engines keep no state between calls, so
//! labels may repeat across calls without interfering.

mod cdcl;
mod encode;

use std::collections::BTreeMap;

use crate::error::SolverError;
use crate::logic::Expr;

pub use cdcl::VarisatEngine;

/// A formula asserted under a label (the constraint id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracked {
    pub label: String,
    pub expr: Expr,
}

/// Everything one solve needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedFormula {
    /// Declared symbols; the model assigns every one of them.
    pub variables: Vec<String>,
    pub tracked: Vec<Tracked>,
}

impl TrackedFormula {
    /// Declares a symbol if it is not declared yet. Returns true if new.
    pub fn declare(&mut self, name: &str) -> bool {
        if self.variables.iter().any(|v| v == name) {
            return false;
        }
        self.variables.push(name.to_string());
        true
    }

    /// Adds a labelled formula.
    pub fn track(&mut self, label: impl Into<String>, expr: Expr) {
        self.tracked.push(Tracked {
            label: label.into(),
            expr,
        });
    }
}

/// Verdict of a solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    /// Complete assignment over the declared symbols.
    Sat(BTreeMap<String, bool>),

    /// Labels of an unsatisfiable subset, in tracking order. Not necessarily
    /// minimal.
    Unsat(Vec<String>),

    /// No verdict within the engine's bounds.
    Unknown(SolverError),
}

/// A boolean satisfiability engine.
pub trait SatEngine: Send + Sync {
    /// Name of the engine (for logs).
    fn name(&self) -> &str;

    /// Decides `formula`. Must return within the engine's own time bound.
    fn solve(&self, formula: &TrackedFormula) -> SolveOutcome;
}
