//! Generic HTTP request wrapper.
//! Applies default headers, serializes structured bodies, parses JSON replies
//! and keeps an observable loading/error state per client instance.

pub mod client;
pub mod config;
pub mod state;

pub use client::RequestClient;
pub use config::{Method, RequestBody, RequestConfig};
pub use state::RequestState;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("HTTP error! Status: {status}")]
    Transport { status: u16 },
    #[error("Failed to decode response: {0}")]
    Decode(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl RequestError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RequestError::Timeout
        } else if e.is_builder() {
            RequestError::InvalidRequest(e.to_string())
        } else if e.is_body() || e.is_decode() {
            // Only reachable once the status was accepted.
            RequestError::Decode(e.to_string())
        } else if e.is_connect() {
            RequestError::Network("unable to reach the server".to_string())
        } else {
            RequestError::Network(e.to_string())
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Transport { status } => Some(*status),
            _ => None,
        }
    }
}

/// `Ok(None)` means the call succeeded but the reply was not JSON.
pub type ApiResult<T> = Result<Option<T>, RequestError>;

#[cfg(test)]
mod tests;
