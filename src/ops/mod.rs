//! Transport-neutral request/response representation.
//!
//! A [`Request`] envelope wraps exactly one [`Operation`]; executing it
//! yields a [`Response`]. Both are plain serde types so any transport
//! (the CLI, an HTTP or MCP front end) can frame them as JSON.

mod operations;
mod serialization;
mod validation;

pub use operations::{
    DetectAuthorityPayload, ExplainPayload, ExtractPayload, Operation, RankPayload, Request, Response,
    ValidatePayload,
};
pub use serialization::{from_json, response_to_json_pretty, to_json_pretty};
pub use validation::MAX_BATCH_LEN;
