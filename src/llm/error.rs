/// Error types for the chat probe
use thiserror::Error;

/// Errors from a chat-completion exchange
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network or transport failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Body or stream event was not valid JSON of the expected shape
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response carried no choices or no content
    #[error("Response contained no answer")]
    EmptyResponse,

    /// The byte stream broke off or was not valid UTF-8
    #[error("Stream error: {0}")]
    Stream(String),

    /// Writing fragments to the terminal failed
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}
