// Shared HTTP plumbing
pub mod client;

pub use client::{build_http_client, log_request, log_response, set_silent};
