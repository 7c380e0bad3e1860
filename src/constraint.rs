//! Constraint types: the formal propositions the validator solves.
//!
//! A Constraint is immutable once built. The extractor mints them, callers
//! may hand them back in across requests, and the validator and explainer
//! only ever read them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::provenance::Provenance;

/// Logical shape of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// X is true.
    #[default]
    Assertion,
    /// X is not true.
    Negation,
    /// X implies Y.
    Implication,
    /// X before/after Y.
    Temporal,
    /// X equals Y.
    Equivalence,
    /// X and Y cannot both hold.
    Exclusion,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assertion => write!(f, "assertion"),
            Self::Negation => write!(f, "negation"),
            Self::Implication => write!(f, "implication"),
            Self::Temporal => write!(f, "temporal"),
            Self::Equivalence => write!(f, "equivalence"),
            Self::Exclusion => write!(f, "exclusion"),
        }
    }
}

const fn default_confidence() -> f64 {
    0.8
}

const fn default_true() -> bool {
    true
}

/// A single formal logical proposition with its citation.
///
/// # Examples
///
/// ```
/// use lexcheck::{Constraint, ConstraintKind};
///
/// let c = Constraint::builder()
///     .id("c1")
///     .kind(ConstraintKind::Assertion)
///     .subject("Smith met Jones")
///     .variable("smith_met_jones")
///     .logic_form("smith_met_jones == True")
///     .build()
///     .unwrap();
/// assert!(c.is_hard);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Unique within one validation batch.
    pub id: String,

    #[serde(default, alias = "constraint_type", alias = "type")]
    pub kind: ConstraintKind,

    #[serde(default)]
    pub subject: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,

    /// Symbols referenced by `logic_form`, without duplicates.
    #[serde(default)]
    pub variables: Vec<String>,

    #[serde(default)]
    pub logic_form: String,

    #[serde(default)]
    pub natural_language: String,

    /// Extraction confidence in [0, 1]. Not used by the solver.
    #[serde(default = "default_confidence")]
    pub confidence: f64,

    #[serde(default = "default_true")]
    pub is_hard: bool,

    #[serde(default)]
    pub provenance: Provenance,
}

impl Constraint {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> ConstraintBuilder {
        ConstraintBuilder::new()
    }

    /// Returns true if `variable` is declared by this constraint.
    #[must_use]
    pub fn mentions(&self, variable: &str) -> bool {
        self.variables.iter().any(|v| v == variable)
    }

    /// Short label for logs and explanations.
    #[must_use]
    pub fn gloss(&self) -> &str {
        if self.natural_language.is_empty() {
            &self.logic_form
        } else {
            &self.natural_language
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.id, self.kind, self.logic_form)
    }
}

/// Builder for [`Constraint`].
#[derive(Debug, Default)]
pub struct ConstraintBuilder {
    id: Option<String>,
    kind: Option<ConstraintKind>,
    subject: Option<String>,
    predicate: Option<String>,
    variables: Vec<String>,
    logic_form: Option<String>,
    natural_language: Option<String>,
    confidence: Option<f64>,
    is_hard: Option<bool>,
    provenance: Option<Provenance>,
}

impl ConstraintBuilder {
    /// Creates a new constraint builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: ConstraintKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    /// Adds a variable; repeated names are kept once.
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.variables.contains(&name) {
            self.variables.push(name);
        }
        self
    }

    /// Adds several variables, keeping first occurrences.
    #[must_use]
    pub fn variables<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(self, Self::variable)
    }

    #[must_use]
    pub fn logic_form(mut self, logic_form: impl Into<String>) -> Self {
        self.logic_form = Some(logic_form.into());
        self
    }

    #[must_use]
    pub fn natural_language(mut self, text: impl Into<String>) -> Self {
        self.natural_language = Some(text.into());
        self
    }

    #[must_use]
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    #[must_use]
    pub fn hard(mut self, is_hard: bool) -> Self {
        self.is_hard = Some(is_hard);
        self
    }

    #[must_use]
    pub fn provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// Builds the Constraint.
    /// Returns `ValidationError` if the id or logic form is missing, or the
    /// confidence is outside [0, 1].
    pub fn build(self) -> Result<Constraint, ValidationError> {
        let id = self.id.ok_or(ValidationError::MissingField {
            field: "id".to_string(),
        })?;

        let logic_form = self.logic_form.ok_or(ValidationError::MissingField {
            field: "logic_form".to_string(),
        })?;

        let confidence = self.confidence.unwrap_or_else(default_confidence);
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ValidationError::ConfidenceOutOfRange { value: confidence });
        }

        Ok(Constraint {
            id,
            kind: self.kind.unwrap_or_default(),
            subject: self.subject.unwrap_or_default(),
            predicate: self.predicate,
            variables: self.variables,
            logic_form,
            natural_language: self.natural_language.unwrap_or_default(),
            confidence,
            is_hard: self.is_hard.unwrap_or(true),
            provenance: self.provenance.unwrap_or_default(),
        })
    }
}
