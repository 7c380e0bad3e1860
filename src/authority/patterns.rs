//! Fixed pattern tables for authority and jurisdiction detection.

use std::sync::OnceLock;

use regex::Regex;

use super::AuthorityLevel;

/// Checked in order; higher authority first so the more specific court wins.
const COURT_PATTERNS: &[(AuthorityLevel, &[&str])] = &[
    (
        AuthorityLevel::SupremeCourt,
        &[
            r"supreme\s+court\s+of\s+the\s+united\s+states",
            r"u\.?\s*s\.?\s+supreme\s+court",
            r"\bscotus\b",
            // U.S. Reports citation
            r"\b\d+\s+u\.?\s*s\.?\s+\d+",
        ],
    ),
    (
        AuthorityLevel::CircuitCourt,
        &[
            r"\d+(st|nd|rd|th)\s+circuit",
            r"\b(first|second|third|fourth|fifth|sixth|seventh|eighth|ninth|tenth|eleventh)\s+circuit",
            r"court\s+of\s+appeals?\s+for\s+the\s+(\d+(st|nd|rd|th)|federal|d\.?\s*c\.?)\s+circuit",
            r"u\.?\s*s\.?\s+court\s+of\s+appeals",
            // Federal Reporter citation
            r"\b\d+\s+f\.\s*\d*d?\s+\d+",
        ],
    ),
    (
        AuthorityLevel::StateSupreme,
        &[r"supreme\s+court\s+of\s+\w+", r"\w+\s+supreme\s+court"],
    ),
    (
        AuthorityLevel::DistrictCourt,
        &[
            r"district\s+court",
            r"\bu\.?\s*s\.?\s*d\.?\s*c\.?",
            // Federal Supplement citation
            r"\b\d+\s+f\.\s*supp",
        ],
    ),
    (
        AuthorityLevel::StateAppeals,
        &[
            r"court\s+of\s+appeals?\s+of\s+\w+",
            r"appellate\s+(court|division)",
            r"\w+\s+court\s+of\s+appeals?\b",
        ],
    ),
    (
        AuthorityLevel::TrialCourt,
        &[r"trial\s+court", r"superior\s+court", r"county\s+court"],
    ),
    (
        AuthorityLevel::Administrative,
        &[
            r"administrative\s+(law\s+judge|agency|ruling|decision|hearing)",
            r"\bagency\s+(ruling|decision|order)",
        ],
    ),
    (
        AuthorityLevel::SecondarySource,
        &[r"law\s+review", r"law\s+journal", r"\brestatement\b", r"\btreatise\b"],
    ),
];

const WITNESS_KEYWORDS: &[&str] = &["fd-302", "fbi", "interview", "statement"];
const FILING_KEYWORDS: &[&str] = &["indictment", "motion", "filing"];
const DOCUMENT_KEYWORDS: &[&str] = &["email", "memo", "document"];

const STATES: &[&str] = &[
    "alabama", "alaska", "arizona", "arkansas", "california", "colorado", "connecticut",
    "delaware", "florida", "georgia", "hawaii", "idaho", "illinois", "indiana", "iowa", "kansas",
    "kentucky", "louisiana", "maine", "maryland", "massachusetts", "michigan", "minnesota",
    "mississippi", "missouri", "montana", "nebraska", "nevada", "new hampshire", "new jersey",
    "new mexico", "new york", "north carolina", "north dakota", "ohio", "oklahoma", "oregon",
    "pennsylvania", "rhode island", "south carolina", "south dakota", "tennessee", "texas", "utah",
    "vermont", "virginia", "washington", "west virginia", "wisconsin", "wyoming",
];

struct Tables {
    courts: Vec<(AuthorityLevel, Vec<Regex>)>,
    circuit: Regex,
    // Longest first so "west virginia" is not reported as "virginia".
    states: Vec<&'static str>,
}

fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let courts = COURT_PATTERNS
            .iter()
            .map(|(level, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(|p| Regex::new(&format!("(?i){p}")).expect("static court pattern"))
                    .collect();
                (*level, compiled)
            })
            .collect();

        let mut states = STATES.to_vec();
        states.sort_by_key(|s| std::cmp::Reverse(s.len()));

        Tables {
            courts,
            circuit: Regex::new(r"(?i)(\d+)(st|nd|rd|th)\s+circuit").expect("static circuit pattern"),
            states,
        }
    })
}

/// Level whose court pattern matches `text`, if any.
pub(super) fn level_from_text(text: &str) -> Option<AuthorityLevel> {
    if text.is_empty() {
        return None;
    }
    tables()
        .courts
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(text)))
        .map(|(level, _)| *level)
}

/// Level implied by a document type such as "FD-302" or "Motion to dismiss".
pub(super) fn level_from_doc_type(doc_type: &str) -> Option<AuthorityLevel> {
    let doc_type = doc_type.to_lowercase();
    let has_any = |keys: &[&str]| keys.iter().any(|k| doc_type.contains(k));

    if has_any(WITNESS_KEYWORDS) {
        Some(AuthorityLevel::WitnessStatement)
    } else if has_any(FILING_KEYWORDS) {
        Some(AuthorityLevel::TrialCourt)
    } else if has_any(DOCUMENT_KEYWORDS) {
        Some(AuthorityLevel::DocumentEvidence)
    } else {
        None
    }
}

/// Circuit ("9th Circuit") or U.S. state ("New York") named in `text`.
pub(super) fn jurisdiction(text: &str) -> Option<String> {
    let tables = tables();
    if let Some(caps) = tables.circuit.captures(text) {
        return Some(format!("{}{} Circuit", &caps[1], caps[2].to_lowercase()));
    }

    let lower = text.to_lowercase();
    tables
        .states
        .iter()
        .find(|state| lower.contains(*state))
        .map(|state| title_case(state))
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
