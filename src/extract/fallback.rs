//! Pattern extraction used when the completion path yields nothing.

use std::sync::OnceLock;

use regex::Regex;

use super::IdAllocator;
use crate::constraint::{Constraint, ConstraintKind};
use crate::provenance::Provenance;

const NEGATION_CUES: &[&str] = &[
    r"did not (\w+)",
    r"never (\w+)",
    r"didn't (\w+)",
    r"was not (\w+)",
    r"no (\w+) was",
];

const ASSERTION_CUES: &[&str] = &[
    r"(\w+) confirmed that",
    r"(\w+) stated that",
    r"(\w+) was (\w+)",
    r"(\w+) met (\w+)",
];

const NEGATION_CONFIDENCE: f64 = 0.6;
const ASSERTION_CONFIDENCE: f64 = 0.5;

struct Cues {
    negation: Vec<Regex>,
    assertion: Vec<Regex>,
}

fn cues() -> &'static Cues {
    static CUES: OnceLock<Cues> = OnceLock::new();
    CUES.get_or_init(|| {
        let compile = |table: &[&str]| -> Vec<Regex> {
            table
                .iter()
                .map(|p| Regex::new(p).expect("static cue pattern"))
                .collect()
        };
        Cues {
            negation: compile(NEGATION_CUES),
            assertion: compile(ASSERTION_CUES),
        }
    })
}

/// Extracts constraints from cue phrases in `quote`.
///
/// Each cue contributes at most one constraint (its first match) over a
/// fresh `fact_<n>` variable: negation cues yield `fact_<n> == False`,
/// assertion cues `fact_<n> == True`.
pub(super) fn pattern_extract(quote: &str, provenance: &Provenance, ids: &IdAllocator) -> Vec<Constraint> {
    let lower = quote.to_lowercase();
    let cues = cues();

    let negations = cues
        .negation
        .iter()
        .filter_map(|re| re.find(&lower))
        .map(|m| (ConstraintKind::Negation, m.as_str(), false, NEGATION_CONFIDENCE));
    let assertions = cues
        .assertion
        .iter()
        .filter_map(|re| re.find(&lower))
        .map(|m| (ConstraintKind::Assertion, m.as_str(), true, ASSERTION_CONFIDENCE));

    negations
        .chain(assertions)
        .map(|(kind, text, value, confidence)| {
            let n = ids.next();
            let variable = format!("fact_{n}");
            let logic_form = format!("{variable} == {}", if value { "True" } else { "False" });
            Constraint {
                id: format!("c_{n}"),
                kind,
                subject: text.to_string(),
                predicate: None,
                variables: vec![variable],
                logic_form,
                natural_language: text.to_string(),
                confidence,
                is_hard: true,
                provenance: provenance.clone(),
            }
        })
        .collect()
}
