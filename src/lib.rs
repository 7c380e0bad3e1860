//! # lexcheck - Consistency checking for legal assertions
//!
//! lexcheck decides whether a set of assertions drawn from legal documents
//! can all be true at once and, when they cannot, which assertions conflict
//! and which of them should prevail given the authority of their sources.
//!
//! ## Pipeline
//!
//! - **Extract**: findings (quote + document metadata) become typed
//!   [`Constraint`]s with [`Provenance`], via a completion service or local
//!   cue patterns.
//! - **Solve**: constraints are parsed into propositional formulas and
//!   handed to a SAT engine; an unsatisfiable result names the constraints
//!   responsible.
//! - **Explain**: the unsatisfiable core is turned into pairwise,
//!   provenance-backed [`ConflictExplanation`]s.
//! - **Adjudicate**: the [`AuthorityRanker`] places each source on the
//!   precedent hierarchy and decides which side wins.
//!
//! ## Usage
//!
//! ```rust
//! use lexcheck::{Config, Constraint, ConstraintService, SolveStatus};
//!
//! let service = ConstraintService::offline(&Config::default());
//!
//! let met = Constraint::builder()
//!     .id("c1")
//!     .variable("met")
//!     .logic_form("met == True")
//!     .build()?;
//! let never_met = Constraint::builder()
//!     .id("c2")
//!     .variable("met")
//!     .logic_form("met == False")
//!     .build()?;
//!
//! let result = service.validate_consistency(&[met, never_met], false);
//! assert_eq!(result.status, SolveStatus::Unsat);
//! assert_eq!(result.unsat_core, Some(vec!["c1".to_string(), "c2".to_string()]));
//! # Ok::<(), lexcheck::ValidationError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Data model
pub mod constraint;
pub mod error;
pub mod provenance;

// Components
pub mod authority;
pub mod explain;
pub mod extract;
pub mod logic;
pub mod solver;
pub mod validator;

// Configuration, transport representation and the service
pub mod config;
pub mod ops;
pub mod service;

// Re-export primary types at crate root for convenience
pub use authority::{AuthorityInfo, AuthorityLevel, AuthorityRanker, RankedConstraint, Resolution};
pub use config::{CompletionConfig, Config, ExtractionConfig, SolverConfig};
pub use constraint::{Constraint, ConstraintBuilder, ConstraintKind};
pub use error::{
    ConfigError, ExtractionError, LexError, LexResult, ParseError, SolverError, ValidationError,
};
pub use explain::{ConflictExplainer, ConflictExplanation, ConflictType};
pub use extract::{CompletionService, ConstraintExtractor, Finding, HttpCompletionClient};
pub use logic::{parse, Expr};
pub use ops::{Operation, Request, Response};
pub use provenance::{Provenance, SourceDescriptor, SourceDocument};
pub use service::ConstraintService;
pub use solver::{SatEngine, SolveOutcome, TrackedFormula, VarisatEngine};
pub use validator::{facts_from_model, ConsistencyValidator, ModelFact, SolveStatus, ValidationResult};
