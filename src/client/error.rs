use std::error::Error as _;

use reqwest::StatusCode;
use thiserror::Error;

pub const UNAVAILABLE_MESSAGE: &str = "Service unavailable, please retry";

#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection refused, unresolved host or timeout.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("failed to decode response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("{0}")]
    InvalidInput(String),
}

impl ClientError {
    /// Classifies a reqwest failure from either sending or reading the body.
    /// Timeouts and dropped connections count as network errors even when
    /// reqwest reports them while decoding.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ClientError::Build(err)
        } else if err.is_decode() && !is_transport(&err) {
            ClientError::Decode(err)
        } else {
            ClientError::Network(err)
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text suitable for showing to a person. Connectivity failures get a
    /// retry hint instead of transport detail.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => UNAVAILABLE_MESSAGE.to_string(),
            ClientError::Api { message, .. } => message.clone(),
            ClientError::InvalidInput(message) => message.clone(),
            ClientError::Decode(_) | ClientError::Build(_) => "Something went wrong".to_string(),
        }
    }
}

fn is_transport(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        return true;
    }
    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(inner) = inner.downcast_ref::<reqwest::Error>() {
            if inner.is_body() || inner.is_timeout() || inner.is_connect() {
                return true;
            }
        }
        source = inner.source();
    }
    false
}
