//! The constraint service: one owned object per deployment.
//!
//! Holds the only shared mutable state of the pipeline (the extractor's id
//! counter and the authority cache) and dispatches [`Operation`]s to the
//! components.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::authority::{AuthorityInfo, AuthorityRanker, RankedConstraint, Resolution};
use crate::config::Config;
use crate::constraint::Constraint;
use crate::error::{LexError, LexResult};
use crate::explain::{ConflictExplainer, ConflictExplanation};
use crate::extract::{CompletionService, ConstraintExtractor, Finding, HttpCompletionClient};
use crate::ops::{Operation, Request, Response};
use crate::provenance::{SourceDescriptor, SourceDocument};
use crate::solver::{SatEngine, VarisatEngine};
use crate::validator::{ConsistencyValidator, ValidationResult};

/// Extract, validate, explain and rank behind one handle.
///
/// `Send + Sync`; share it behind an `Arc` across concurrent requests.
#[derive(Debug)]
pub struct ConstraintService {
    extractor: ConstraintExtractor,
    validator: Arc<ConsistencyValidator>,
    authority: Arc<AuthorityRanker>,
}

impl ConstraintService {
    /// Service using the HTTP completion client described by `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> LexResult<Self> {
        let client = HttpCompletionClient::new(&config.completion)?;
        Ok(Self::with_completion(Arc::new(client), config))
    }

    /// Service using a caller-supplied completion service.
    #[must_use]
    pub fn with_completion(completion: Arc<dyn CompletionService>, config: &Config) -> Self {
        Self::assemble(ConstraintExtractor::new(completion, &config.extraction), config)
    }

    /// Service that extracts with cue patterns only.
    #[must_use]
    pub fn offline(config: &Config) -> Self {
        Self::assemble(ConstraintExtractor::offline(&config.extraction), config)
    }

    /// Replaces the SAT engine.
    #[must_use]
    pub fn with_engine(mut self, engine: Arc<dyn SatEngine>) -> Self {
        let explainer = ConflictExplainer::new(Arc::clone(&self.authority));
        self.validator = Arc::new(ConsistencyValidator::new(engine, explainer));
        self
    }

    fn assemble(extractor: ConstraintExtractor, config: &Config) -> Self {
        let authority = Arc::new(AuthorityRanker::new());
        let explainer = ConflictExplainer::new(Arc::clone(&authority));
        let validator = Arc::new(ConsistencyValidator::new(
            Arc::new(VarisatEngine::new(&config.solver)),
            explainer,
        ));
        Self {
            extractor,
            validator,
            authority,
        }
    }

    /// The authority model (and its cache).
    #[must_use]
    pub fn authority(&self) -> &AuthorityRanker {
        &self.authority
    }

    /// Validates and executes a request.
    ///
    /// Must be called within a Tokio runtime: satisfiability checks run on
    /// the blocking pool so they do not stall other requests.
    ///
    /// # Errors
    ///
    /// Envelope problems (unsupported version, malformed payload) and a
    /// validation task that panicked are errors; extraction, parse and
    /// solver failures are reported inside the response.
    pub async fn execute(&self, request: Request) -> LexResult<Response> {
        request.validate()?;
        let op = request.operation.name();
        debug!(request_id = %request.request_id, op, "executing");

        let response = match request.operation {
            Operation::ExtractConstraints(p) => {
                let constraints = self.extract_constraints(&p.findings, &p.sources).await;
                Response::Extracted {
                    extraction_id: Uuid::new_v4(),
                    constraints,
                }
            }
            Operation::ValidateConsistency(p) => {
                let validator = Arc::clone(&self.validator);
                let result = tokio::task::spawn_blocking(move || validator.validate(&p.constraints, p.include_soft))
                    .await
                    .map_err(|e| LexError::internal(format!("validation task failed: {e}")))?;
                Response::Validated(result)
            }
            Operation::ExplainConflict(p) => Response::Explained {
                conflicts: self.explain_conflict(&p.unsat_core, &p.constraints),
            },
            Operation::RankByAuthority(p) => {
                let (ranked, resolution) = self.rank_by_authority(&p.constraints);
                Response::Ranked { ranked, resolution }
            }
            Operation::DetectAuthority(p) => Response::Authority {
                authority: self.detect_authority(&p.source),
                explanation: self.authority.explain_authority(&p.source),
            },
        };

        info!(request_id = %request.request_id, op, "request complete");
        Ok(response)
    }

    /// Extracts constraints from findings; see
    /// [`ConstraintExtractor::extract_constraints`].
    pub async fn extract_constraints(&self, findings: &[Finding], sources: &[SourceDocument]) -> Vec<Constraint> {
        self.extractor.extract_constraints(findings, sources).await
    }

    /// Checks joint satisfiability on the calling thread; see
    /// [`ConsistencyValidator::validate`].
    pub fn validate_consistency(&self, constraints: &[Constraint], include_soft: bool) -> ValidationResult {
        self.validator.validate(constraints, include_soft)
    }

    /// Explains the conflicts among the constraints named by `unsat_core`.
    pub fn explain_conflict(&self, unsat_core: &[String], constraints: &[Constraint]) -> Vec<ConflictExplanation> {
        self.validator.explainer().explain(unsat_core, constraints)
    }

    /// Ranks constraints by source authority and adjudicates between them.
    pub fn rank_by_authority(&self, constraints: &[Constraint]) -> (Vec<RankedConstraint>, Resolution) {
        let ranked = self.authority.rank_with_authority(constraints);
        let resolution = self.authority.resolve_conflict(constraints);
        (ranked, resolution)
    }

    /// Classifies one source.
    pub fn detect_authority(&self, source: &SourceDescriptor) -> AuthorityInfo {
        self.authority.detect_authority(source)
    }
}
