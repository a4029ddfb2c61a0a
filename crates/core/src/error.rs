//! Fetch error taxonomy shared by producers and aggregators.

use crate::ResourceKind;

/// Status reason the API server uses for a missing resource or an unserved kind.
pub const REASON_NOT_FOUND: &str = "NotFound";

/// Error delivered by a producer in place of a raw list.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Status error returned by the API server.
    #[error(transparent)]
    Status(kube::core::ErrorResponse),
    /// Producer dropped its sender without writing a result.
    #[error("{kind} list producer closed without a result")]
    Closed { kind: ResourceKind },
    /// Aggregation asked for a list nobody wired a channel for.
    #[error("no {kind} list channel was wired for this aggregation")]
    Unwired { kind: ResourceKind },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FetchError {
    pub fn other(msg: impl std::fmt::Display) -> Self { FetchError::Other(anyhow::Error::msg(msg.to_string())) }

    /// Build a status error with the given reason (e.g. `NotFound`).
    pub fn status(reason: &str, message: &str, code: u16) -> Self {
        FetchError::Status(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: message.to_string(),
            reason: reason.to_string(),
            code,
        })
    }

    pub fn not_found(message: &str) -> Self { Self::status(REASON_NOT_FOUND, message, 404) }

    /// Only a status error whose reason is exactly `NotFound` counts; an empty
    /// reason or any other reason is a hard failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Status(s) if s.reason == REASON_NOT_FOUND)
    }
}

impl From<kube::Error> for FetchError {
    fn from(e: kube::Error) -> Self {
        match e {
            kube::Error::Api(resp) => FetchError::Status(resp),
            other => FetchError::Other(anyhow::Error::new(other)),
        }
    }
}
