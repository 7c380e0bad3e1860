//! Extraction prompt and reply parsing.

use serde::Deserialize;

use crate::constraint::ConstraintKind;
use crate::error::ExtractionError;

const DEFAULT_CONFIDENCE: f64 = 0.8;

/// Builds the user prompt for one finding.
pub fn build_prompt(quote: &str, significance: &str, entities: &[String]) -> String {
    let entities = if entities.is_empty() {
        "None specified".to_string()
    } else {
        entities.join(", ")
    };

    format!(
        r#"Extract logical constraints from this legal finding. Return JSON array.

Quote: "{quote}"

Significance: {significance}

Entities mentioned: {entities}

For each constraint, provide:
1. type: "assertion", "negation", "implication", "temporal", "equivalence", or "exclusion"
2. subject: The main entity or fact being asserted
3. predicate: For implications/relations, what it implies or relates to
4. variables: List of variable names for formal logic (snake_case)
5. logic_form: Boolean logic over the variables (use And, Or, Not, Implies, ==, !=)
6. natural_language: Human-readable version
7. confidence: 0.0-1.0 confidence in extraction accuracy
8. is_hard: true if this must be true, false if it's a soft constraint

Example output:
[
  {{
    "type": "assertion",
    "subject": "McNeal met Blackman",
    "predicate": null,
    "variables": ["mcneal_met_blackman"],
    "logic_form": "mcneal_met_blackman == True",
    "natural_language": "McNeal met Blackman during the presentation",
    "confidence": 0.95,
    "is_hard": true
  }},
  {{
    "type": "negation",
    "subject": "McNeal recalled Blackman's name",
    "predicate": null,
    "variables": ["mcneal_recalled_name"],
    "logic_form": "mcneal_recalled_name == False",
    "natural_language": "McNeal did not recall Blackman's name",
    "confidence": 0.9,
    "is_hard": true
  }}
]

Return ONLY the JSON array, no other text."#
    )
}

/// Removes a markdown code fence around the reply, if any.
///
/// A ```` ```json ```` fence wins over a bare one; text outside the first
/// fenced block is discarded.
pub fn strip_code_fence(content: &str) -> &str {
    let inner = if let Some((_, rest)) = content.split_once("```json") {
        rest.split("```").next().unwrap_or(rest)
    } else if let Some((_, rest)) = content.split_once("```") {
        rest.split("```").next().unwrap_or(rest)
    } else {
        content
    };
    inner.trim()
}

/// One element of the reply array, before ids and provenance are attached.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawConstraint {
    #[serde(default, rename = "type", alias = "kind", alias = "constraint_type")]
    pub kind: ConstraintKind,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub predicate: Option<String>,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default)]
    pub logic_form: String,
    #[serde(default)]
    pub natural_language: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub is_hard: Option<bool>,
}

impl RawConstraint {
    /// Confidence clamped to [0, 1]; 0.8 when absent or not a number.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        match self.confidence {
            Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
            _ => DEFAULT_CONFIDENCE,
        }
    }
}

/// Parses a completion reply into raw constraints.
///
/// # Errors
///
/// Returns [`ExtractionError::EmptyReply`] for blank content and
/// [`ExtractionError::MalformedReply`] if the content is not a JSON array
/// of constraint objects. One bad element fails the whole reply.
pub fn parse_reply(content: &str) -> Result<Vec<RawConstraint>, ExtractionError> {
    let body = strip_code_fence(content);
    if body.is_empty() {
        return Err(ExtractionError::EmptyReply);
    }
    serde_json::from_str(body).map_err(|e| ExtractionError::MalformedReply { message: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_inputs() {
        let p = build_prompt("Smith never met Jones", "alibi", &["Smith".into(), "Jones".into()]);
        assert!(p.contains("Quote: \"Smith never met Jones\""));
        assert!(p.contains("Entities mentioned: Smith, Jones"));
        assert!(build_prompt("q", "", &[]).contains("None specified"));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("Here you go:\n```\n[2]\n``` thanks"), "[2]");
        assert_eq!(strip_code_fence("  [3] "), "[3]");
    }

    #[test]
    fn test_parse_reply_defaults() {
        let raw = parse_reply(r#"[{"logic_form": "x == True", "variables": ["x"]}]"#).unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].kind, ConstraintKind::Assertion);
        assert!((raw[0].confidence() - 0.8).abs() < f64::EPSILON);
        assert_eq!(raw[0].is_hard, None);
    }

    #[test]
    fn test_parse_reply_full_element() {
        let raw = parse_reply(
            r#"```json
[{"type": "negation", "subject": "s", "predicate": null, "variables": ["a"],
  "logic_form": "a == False", "natural_language": "not a", "confidence": 1.7, "is_hard": false}]
```"#,
        )
        .unwrap();
        assert_eq!(raw[0].kind, ConstraintKind::Negation);
        assert!((raw[0].confidence() - 1.0).abs() < f64::EPSILON);
        assert_eq!(raw[0].is_hard, Some(false));
    }

    #[test]
    fn test_parse_reply_errors() {
        assert!(matches!(parse_reply("```json\n```"), Err(ExtractionError::EmptyReply)));
        assert!(matches!(
            parse_reply("I could not find any constraints."),
            Err(ExtractionError::MalformedReply { .. })
        ));
        assert!(matches!(
            parse_reply(r#"[{"type": "prophecy", "logic_form": "x == True"}]"#),
            Err(ExtractionError::MalformedReply { .. })
        ));
        assert!(matches!(
            parse_reply(r#"{"logic_form": "x == True"}"#),
            Err(ExtractionError::MalformedReply { .. })
        ));
    }
}
