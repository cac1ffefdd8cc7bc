use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} responded with {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("could not decode {service} response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl SourceError {
    pub fn transport(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| SourceError::Transport { service, source }
    }

    pub fn decode(service: &'static str, message: impl std::fmt::Display) -> Self {
        SourceError::Decode {
            service,
            message: message.to_string(),
        }
    }

    /// Consume a non-success response into a status error carrying its body.
    pub async fn from_response(service: &'static str, response: Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        SourceError::Status {
            service,
            status,
            body,
        }
    }

    /// HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SourceError::Status { status, .. } => Some(*status),
            SourceError::Transport { source, .. } => source.status(),
            SourceError::Decode { .. } => None,
        }
    }
}

/// Read a response body and decode it as JSON, keeping the raw text in the error.
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> Result<T, SourceError> {
    let text = response.text().await.map_err(SourceError::transport(service))?;
    serde_json::from_str(&text).map_err(|e| {
        tracing::error!("Failed to parse {} response: {}. Raw response: {}", service, e, text);
        SourceError::decode(service, e)
    })
}
