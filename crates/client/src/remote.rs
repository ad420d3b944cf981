//! HTTP client for the onboarding progress endpoints.
//!
//! Wraps the server's progress, submit, and document-upload endpoints
//! using [`reqwest`]. The transport sits behind the [`ProgressClient`]
//! trait so the wizard engine can run against a fake in tests and
//! against [`NoopProgressClient`] in the demo flow.

use async_trait::async_trait;
use serde::Deserialize;

use onelink_core::documents::{DocumentHandle, DocumentType};
use onelink_core::session::{RemoteProgress, StepSubmission, SubmitOutcome};

/// Errors from the progress API layer.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("Progress API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The server answered 2xx but rejected the operation.
    #[error("Progress API rejected the request: {0}")]
    Rejected(String),
}

/// Server persistence operations used by the wizard engine.
#[async_trait]
pub trait ProgressClient: Send + Sync {
    /// Fetch the caller's saved progress. `None` when the server has
    /// no record for this user yet.
    async fn load_progress(&self) -> Result<Option<RemoteProgress>, RemoteError>;

    /// Persist one completed step.
    async fn save_step(&self, step: u8, submission: &StepSubmission) -> Result<(), RemoteError>;

    /// Submit the finished application.
    async fn submit(&self) -> Result<SubmitOutcome, RemoteError>;

    /// Upload a verification document, returning its opaque handle.
    async fn upload_document(
        &self,
        doc_type: DocumentType,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<DocumentHandle, RemoteError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Response envelope used by every endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

/// HTTP client for one API server, authenticated with a bearer token.
pub struct HttpProgressClient {
    client: reqwest::Client,
    base_url: String,
    bearer: String,
}

impl HttpProgressClient {
    /// Create a client for the API at `base_url` (no trailing slash).
    pub fn new(base_url: String, bearer: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            bearer,
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String, bearer: String) -> Self {
        Self {
            client,
            base_url,
            bearer,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn parse_envelope<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let envelope: Envelope<T> = response.json().await?;
        if !envelope.ok {
            return Err(RemoteError::Rejected(
                envelope.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        envelope
            .data
            .ok_or_else(|| RemoteError::Rejected("response envelope missing data".to_string()))
    }
}

#[async_trait]
impl ProgressClient for HttpProgressClient {
    async fn load_progress(&self) -> Result<Option<RemoteProgress>, RemoteError> {
        let response = self
            .client
            .get(self.url("/api/v1/onboarding/progress"))
            .bearer_auth(&self.bearer)
            .send()
            .await?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        let progress = Self::parse_envelope::<RemoteProgress>(response).await?;
        Ok(Some(progress))
    }

    async fn save_step(&self, step: u8, submission: &StepSubmission) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(self.url(&format!("/api/v1/onboarding/step/{step}")))
            .bearer_auth(&self.bearer)
            .json(submission)
            .send()
            .await?;

        Self::parse_envelope::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn submit(&self) -> Result<SubmitOutcome, RemoteError> {
        let response = self
            .client
            .post(self.url("/api/v1/onboarding/submit"))
            .bearer_auth(&self.bearer)
            .send()
            .await?;

        Self::parse_envelope::<SubmitOutcome>(response).await
    }

    async fn upload_document(
        &self,
        doc_type: DocumentType,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<DocumentHandle, RemoteError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new()
            .text("documentType", doc_type.as_str())
            .part("file", part);

        let response = self
            .client
            .post(self.url("/api/v1/onboarding/documents"))
            .bearer_auth(&self.bearer)
            .multipart(form)
            .send()
            .await?;

        Self::parse_envelope::<DocumentHandle>(response).await
    }
}

// ---------------------------------------------------------------------------
// Demo implementation
// ---------------------------------------------------------------------------

/// Progress client for the demo flow: nothing is persisted server-side
/// and every save succeeds.
#[derive(Debug, Default)]
pub struct NoopProgressClient;

#[async_trait]
impl ProgressClient for NoopProgressClient {
    async fn load_progress(&self) -> Result<Option<RemoteProgress>, RemoteError> {
        Ok(None)
    }

    async fn save_step(&self, _step: u8, _submission: &StepSubmission) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn submit(&self) -> Result<SubmitOutcome, RemoteError> {
        Err(RemoteError::Rejected(
            "the demo flow has nothing to submit".to_string(),
        ))
    }

    async fn upload_document(
        &self,
        _doc_type: DocumentType,
        _file_name: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<DocumentHandle, RemoteError> {
        Err(RemoteError::Rejected(
            "the demo flow does not upload documents".to_string(),
        ))
    }
}
