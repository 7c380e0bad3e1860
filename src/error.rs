//! Error types for lexcheck.
//!
//! All errors in lexcheck are strongly typed using thiserror.
//! Most of them never reach a caller: extraction failures fall back to
//! pattern extraction, parse failures drop a single constraint and solver
//! failures become an `Unknown` verdict. They are still typed so that the
//! recovery sites can log them and tests can match on them.

use thiserror::Error;

/// Validation errors that occur during input validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Confidence value {value} is out of range [0.0, 1.0]")]
    ConfidenceOutOfRange {
        value: f64,
    },

    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Constraint id '{id}' appears more than once in the batch")]
    DuplicateConstraintId {
        id: String,
    },

    #[error("Constraint not found: {id}")]
    ConstraintNotFound {
        id: String,
    },

    #[error("Field '{field}' has {len} entries, exceeding the maximum of {max}")]
    BatchTooLarge {
        field: String,
        len: usize,
        max: usize,
    },

    #[error("Unsupported request version '{version}' (expected {expected})")]
    UnsupportedVersion {
        version: String,
        expected: String,
    },
}

/// Failures while calling the completion service or reading its reply.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Completion request failed: {message}")]
    Transport {
        message: String,
    },

    #[error("Completion service returned status {code}: {message}")]
    Status {
        code: u16,
        message: String,
    },

    #[error("Malformed completion reply: {message}")]
    MalformedReply {
        message: String,
    },

    #[error("Completion reply was empty")]
    EmptyReply,
}

/// A `logic_form` that does not fit the formula grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Logic form is empty")]
    Empty,

    #[error("Unexpected character '{ch}' at byte {pos}")]
    UnexpectedChar {
        ch: char,
        pos: usize,
    },

    #[error("Unexpected {found} at byte {pos}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        pos: usize,
    },

    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEnd {
        expected: String,
    },

    #[error("Unknown connective '{name}' at byte {pos}")]
    UnknownFunction {
        name: String,
        pos: usize,
    },

    #[error("Formula nests deeper than {max} levels at byte {pos}")]
    TooDeep {
        max: usize,
        pos: usize,
    },

    #[error("{function} takes {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: String,
        actual: usize,
    },
}

/// Reasons the SAT engine could not produce a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error("Solver timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Formula too large: {clauses} clauses exceeds limit of {max_clauses}")]
    ResourceLimit {
        clauses: usize,
        max_clauses: usize,
    },

    #[error("Solver busy: {max_in_flight} searches already running")]
    Busy {
        max_in_flight: usize,
    },

    #[error("Solver engine failure: {message}")]
    Engine {
        message: String,
    },
}

/// Configuration that cannot be turned into working components.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to build completion client: {message}")]
    Client {
        message: String,
    },
}

/// Top-level error type for lexcheck.
#[derive(Debug, Error)]
pub enum LexError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl LexError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Extraction(e) => match e {
                ExtractionError::Transport { .. } => true,
                ExtractionError::Status { code, .. } => *code >= 500 || *code == 429,
                _ => false,
            },
            Self::Solver(e) => matches!(e, SolverError::Timeout { .. } | SolverError::Busy { .. }),
            Self::Validation(_) | Self::Parse(_) | Self::Config(_) | Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for lexcheck operations.
pub type LexResult<T> = Result<T, LexError>;
