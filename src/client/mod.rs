//! Typed HTTP client for the todo API, used by front ends.
//!
//! Reads go through [`RetryPolicy::reads`]; writes are sent once so a lost
//! response never turns into a duplicate side effect.

pub mod error;
pub mod retry;

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config;
use crate::models::{CreateTodoRequest, Todo, UpdateTodoRequest};

pub use error::{ClientError, UNAVAILABLE_MESSAGE};
pub use retry::{Idempotency, RetryPolicy};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the caller runs decides how the API is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Next to the API, using the internal service address.
    Server,
    /// In a page served from `origin`; requests go through the same-origin
    /// `/api` proxy path.
    Browser { origin: String },
}

impl ExecutionContext {
    pub fn base_url(&self) -> String {
        match self {
            ExecutionContext::Server => config::internal_base_url(),
            ExecutionContext::Browser { origin } => {
                format!("{}/api", origin.trim_end_matches('/'))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub uptime: f64,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone, Debug)]
pub struct TodoClient {
    http: Client,
    base_url: String,
    read_policy: RetryPolicy,
}

impl TodoClient {
    pub fn new(context: &ExecutionContext) -> Result<Self, ClientError> {
        Self::with_base_url(context.base_url())
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            http: build_http(REQUEST_TIMEOUT)?,
            base_url,
            read_policy: RetryPolicy::reads(),
        })
    }

    /// Replaces the per-request timeout (default [`REQUEST_TIMEOUT`]). It
    /// covers the whole exchange, including reading the body.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ClientError> {
        self.http = build_http(timeout)?;
        Ok(self)
    }

    pub fn with_read_policy(mut self, policy: RetryPolicy) -> Self {
        self.read_policy = policy;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self, idempotency: Idempotency) -> RetryPolicy {
        match idempotency {
            Idempotency::Idempotent => self.read_policy,
            Idempotency::NonIdempotent => RetryPolicy::none(),
        }
    }

    pub async fn list(&self) -> Result<Vec<Todo>, ClientError> {
        self.policy(Idempotency::Idempotent)
            .run(|| async move {
                let response = self.execute(self.request(Method::GET, "/todos")).await?;
                decode(response).await
            })
            .await
    }

    pub async fn create(&self, title: &str) -> Result<Todo, ClientError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ClientError::InvalidInput("Title is required".to_string()));
        }
        let body = &CreateTodoRequest {
            title: title.to_string(),
        };

        self.policy(Idempotency::NonIdempotent)
            .run(|| async move {
                let response = self
                    .execute(self.request(Method::POST, "/todos").json(body))
                    .await?;
                decode(response).await
            })
            .await
    }

    pub async fn update(&self, id: i64, changes: &UpdateTodoRequest) -> Result<Todo, ClientError> {
        self.policy(Idempotency::NonIdempotent)
            .run(|| async move {
                let path = format!("/todos/{}", id);
                let response = self
                    .execute(self.request(Method::PATCH, &path).json(changes))
                    .await?;
                decode(response).await
            })
            .await
    }

    /// Flips a todo whose current state is `completed`.
    pub async fn toggle(&self, id: i64, completed: bool) -> Result<Todo, ClientError> {
        let changes = UpdateTodoRequest {
            title: None,
            completed: Some(!completed),
        };
        self.update(id, &changes).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        self.policy(Idempotency::NonIdempotent)
            .run(|| async move {
                let path = format!("/todos/{}", id);
                self.execute(self.request(Method::DELETE, &path)).await?;
                Ok(())
            })
            .await
    }

    /// Liveness probe. A single attempt so callers see the first failure.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self.execute(self.request(Method::GET, "/healthz")).await?;
        decode(response).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await.map_err(ClientError::from_reqwest)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
        Err(ClientError::Api { status, message })
    }
}

fn build_http(timeout: Duration) -> Result<Client, ClientError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ClientError::Build)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    response.json::<T>().await.map_err(ClientError::from_reqwest)
}
