//! Constraint extraction from findings.
//!
//! Each finding goes to the completion service first; if that path yields
//! nothing (including any failure) the local cue patterns take over. A
//! batch is extracted concurrently and deduplicated by `logic_form` in
//! input order, so the first finding to produce a formula keeps it no
//! matter which request finished first.

mod completion;
mod fallback;
mod prompt;

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ExtractionConfig;
use crate::constraint::Constraint;
use crate::error::ExtractionError;
use crate::provenance::{truncate_chars, Provenance, SourceDocument};

pub use completion::{CompletionService, HttpCompletionClient, SYSTEM_PROMPT};
pub use prompt::{build_prompt, parse_reply, strip_code_fence, RawConstraint};

/// A quoted excerpt plus what is known about where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(default, alias = "Quote")]
    pub quote: String,

    /// Title of the document quoted.
    #[serde(default = "unknown_document", alias = "Document")]
    pub document: String,

    #[serde(default, alias = "Significance")]
    pub significance: String,

    #[serde(default, alias = "Entities")]
    pub entities: Vec<String>,

    #[serde(default)]
    pub doc_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

fn unknown_document() -> String {
    "Unknown".to_string()
}

impl Default for Finding {
    fn default() -> Self {
        Self {
            quote: String::new(),
            document: unknown_document(),
            significance: String::new(),
            entities: Vec::new(),
            doc_id: String::new(),
            court: None,
            date: None,
            doc_type: None,
            paragraph: None,
            page: None,
        }
    }
}

impl Finding {
    /// A finding quoting `document`.
    #[must_use]
    pub fn new(quote: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            quote: quote.into(),
            document: document.into(),
            ..Self::default()
        }
    }

    /// Provenance for constraints drawn from this finding.
    #[must_use]
    pub fn provenance(&self, max_quote_len: usize) -> Provenance {
        Provenance {
            doc_id: self.doc_id.clone(),
            doc_title: self.document.clone(),
            paragraph: self.paragraph,
            page: self.page,
            quote: truncate_chars(&self.quote, max_quote_len),
            court: self.court.clone(),
            date: self.date.clone(),
            doc_type: self.doc_type.clone(),
        }
    }
}

/// Monotonic counter behind `c_<n>` ids and `fact_<n>` variables.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    /// Starts at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next number; never repeats.
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Turns findings into constraints with provenance.
pub struct ConstraintExtractor {
    completion: Option<Arc<dyn CompletionService>>,
    ids: IdAllocator,
    max_quote_len: usize,
}

impl std::fmt::Debug for ConstraintExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintExtractor")
            .field("completion", &self.completion.as_ref().map(|c| c.id().to_string()))
            .field("ids", &self.ids)
            .field("max_quote_len", &self.max_quote_len)
            .finish()
    }
}

impl ConstraintExtractor {
    /// Extractor backed by `completion`, falling back to cue patterns.
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionService>, config: &ExtractionConfig) -> Self {
        Self {
            completion: Some(completion),
            ids: IdAllocator::new(),
            max_quote_len: config.max_quote_len,
        }
    }

    /// Extractor that only uses cue patterns.
    #[must_use]
    pub fn offline(config: &ExtractionConfig) -> Self {
        Self {
            completion: None,
            ids: IdAllocator::new(),
            max_quote_len: config.max_quote_len,
        }
    }

    /// Extracts constraints from a batch of findings.
    ///
    /// `sources` fill in court, date and document type for findings that
    /// cite them without those fields. Findings without a quote produce
    /// nothing. Never fails: a finding whose completion call fails is
    /// handled by the cue patterns.
    pub async fn extract_constraints(&self, findings: &[Finding], sources: &[SourceDocument]) -> Vec<Constraint> {
        let per_finding = join_all(findings.iter().map(|f| self.extract_from_finding(f, sources))).await;

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for constraint in per_finding.into_iter().flatten() {
            if seen.insert(constraint.logic_form.clone()) {
                out.push(constraint);
            } else {
                debug!(constraint_id = %constraint.id, logic_form = %constraint.logic_form, "duplicate logic form dropped");
            }
        }

        info!(findings = findings.len(), constraints = out.len(), "extraction complete");
        out
    }

    async fn extract_from_finding(&self, finding: &Finding, sources: &[SourceDocument]) -> Vec<Constraint> {
        if finding.quote.trim().is_empty() {
            return Vec::new();
        }

        let mut provenance = finding.provenance(self.max_quote_len);
        if let Some(doc) = sources.iter().find(|s| s.describes(&provenance)) {
            doc.enrich(&mut provenance);
        }

        let constraints = match &self.completion {
            Some(service) => match self.completion_extract(service.as_ref(), finding, &provenance).await {
                Ok(constraints) => constraints,
                Err(e) => {
                    warn!(document = %finding.document, service = service.id(), error = %e, "completion extraction failed");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        if constraints.is_empty() {
            debug!(document = %finding.document, "using pattern extraction");
            fallback::pattern_extract(&finding.quote, &provenance, &self.ids)
        } else {
            constraints
        }
    }

    async fn completion_extract(
        &self,
        service: &dyn CompletionService,
        finding: &Finding,
        provenance: &Provenance,
    ) -> Result<Vec<Constraint>, ExtractionError> {
        let prompt = build_prompt(&finding.quote, &finding.significance, &finding.entities);
        let reply = service.complete(&prompt).await?;
        let raw = parse_reply(&reply)?;

        let mut out = Vec::with_capacity(raw.len());
        for r in raw {
            if r.logic_form.trim().is_empty() {
                debug!(subject = %r.subject, "skipping reply element without logic form");
                continue;
            }
            let confidence = r.confidence();
            let built = Constraint::builder()
                .id(format!("c_{}", self.ids.next()))
                .kind(r.kind)
                .subject(r.subject)
                .variables(r.variables)
                .logic_form(r.logic_form)
                .natural_language(r.natural_language)
                .confidence(confidence)
                .hard(r.is_hard.unwrap_or(true))
                .provenance(provenance.clone());
            let built = match r.predicate {
                Some(p) => built.predicate(p),
                None => built,
            };

            match built.build() {
                Ok(c) => out.push(c),
                Err(e) => debug!(error = %e, "skipping incomplete constraint in reply"),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Scripted(Result<String, ()>);

    #[async_trait]
    impl CompletionService for Scripted {
        fn id(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _prompt: &str) -> Result<String, ExtractionError> {
            self.0.clone().map_err(|()| ExtractionError::Transport {
                message: "connection refused".to_string(),
            })
        }
    }

    fn extractor(reply: Result<&str, ()>) -> ConstraintExtractor {
        ConstraintExtractor::new(
            Arc::new(Scripted(reply.map(str::to_string))),
            &ExtractionConfig::default(),
        )
    }

    #[test]
    fn test_id_allocator_is_monotonic() {
        let ids = IdAllocator::new();
        assert_eq!(ids.next(), 1);
        assert_eq!(ids.next(), 2);
    }

    #[test]
    fn test_finding_aliases_and_defaults() {
        let f: Finding = serde_json::from_str(r#"{"Quote": "q", "Significance": "s", "Entities": ["A"]}"#).unwrap();
        assert_eq!(f.quote, "q");
        assert_eq!(f.document, "Unknown");
        assert_eq!(f.entities, vec!["A".to_string()]);
    }

    #[test]
    fn test_provenance_truncates_quote() {
        let f = Finding::new("x".repeat(20), "Doc");
        assert_eq!(f.provenance(5).quote, "xxxxx");
    }

    #[tokio::test]
    async fn test_completion_path() {
        let reply = r#"[{"type": "negation", "variables": ["met"], "logic_form": "met == False",
                         "natural_language": "did not meet", "predicate": "meeting"}]"#;
        let out = extractor(Ok(reply))
            .extract_constraints(&[Finding::new("Smith did not meet Jones", "302")], &[])
            .await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "c_1");
        assert_eq!(out[0].predicate.as_deref(), Some("meeting"));
        assert_eq!(out[0].provenance.doc_title, "302");
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_patterns() {
        let out = extractor(Err(()))
            .extract_constraints(&[Finding::new("Smith did not meet Jones", "302")], &[])
            .await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].logic_form, "fact_1 == False");
    }

    #[tokio::test]
    async fn test_empty_array_falls_back_to_patterns() {
        let out = extractor(Ok("[]"))
            .extract_constraints(&[Finding::new("Smith met Jones", "302")], &[])
            .await;
        assert_eq!(out.len(), 1);
        assert!(out[0].logic_form.ends_with("== True"));
    }

    #[tokio::test]
    async fn test_same_finding_twice_dedups() {
        let reply = r#"[{"variables": ["met"], "logic_form": "met == True"}]"#;
        let finding = Finding::new("Smith met Jones", "302");
        let out = extractor(Ok(reply))
            .extract_constraints(&[finding.clone(), finding], &[])
            .await;
        assert_eq!(out.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_quote_yields_nothing() {
        let out = ConstraintExtractor::offline(&ExtractionConfig::default())
            .extract_constraints(&[Finding::new("  ", "302")], &[])
            .await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_sources_enrich_provenance() {
        let mut finding = Finding::new("Smith never called", "Order");
        finding.doc_id = "d9".to_string();
        let source = SourceDocument {
            doc_id: "d9".to_string(),
            doc_title: "Order".to_string(),
            court: Some("U.S. District Court".to_string()),
            date: Some("2020-01-02".to_string()),
            doc_type: None,
        };
        let out = ConstraintExtractor::offline(&ExtractionConfig::default())
            .extract_constraints(&[finding], &[source])
            .await;
        assert_eq!(out[0].provenance.court.as_deref(), Some("U.S. District Court"));
        assert_eq!(out[0].provenance.date.as_deref(), Some("2020-01-02"));
    }
}
