pub mod types;
pub mod client;

pub use types::*;
pub use client::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("API key is missing")]
    MissingCredential,

    #[error("Model provider is unreachable at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Model provider returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Request was blocked by the model provider: {0}")]
    Blocked(String),

    #[error("No response from the model")]
    EmptyResponse,

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}
