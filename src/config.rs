//! Runtime configuration.
//!
//! Every knob has a default. The `lexcheck` binary overrides them from
//! flags and environment variables.

use std::time::Duration;

use crate::provenance::MAX_QUOTE_LEN;

/// Completion service settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    /// Base URL of an OpenAI-compatible gateway.
    pub base_url: String,
    /// Bearer token, if the gateway wants one.
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://litellm:4000".to_string(),
            api_key: None,
            model: "deepseek-chat".to_string(),
            timeout: Duration::from_secs(30),
            temperature: 0.1,
            max_tokens: 1000,
        }
    }
}

/// Bounds on a single solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Wall-clock limit; past it the verdict is Unknown.
    pub timeout: Duration,
    /// Largest CNF the engine will attempt.
    pub max_clauses: usize,
    /// Solver threads allowed to run at once, counting searches abandoned
    /// after a timeout.
    pub max_in_flight: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(10_000),
            max_clauses: 1_000_000,
            max_in_flight: 8,
        }
    }
}

/// Extraction settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Quotes stored in provenance are cut to this many characters.
    pub max_quote_len: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_quote_len: MAX_QUOTE_LEN,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub completion: CompletionConfig,
    pub solver: SolverConfig,
    pub extraction: ExtractionConfig,
}
