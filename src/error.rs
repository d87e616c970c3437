//! Crate-wide error type.
//!
//! Mirrors the five-kind taxonomy from the reconciliation design: transient
//! cloud errors and not-yet-ready are absorbed locally by the retry kernel
//! ([`crate::retry`]) and never surface here; misconfiguration and
//! unrecoverable cloud errors bubble up and become a reconcile failure.

use crate::aliyun::CloudError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("kubernetes api error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("cloud api error: {0}")]
    Cloud(#[from] CloudError),

    #[error("timeout waiting for resource to become ready: {cause}")]
    Timeout { cause: Box<Error> },

    /// Internal-only sentinel requesting one more backoff step. Never
    /// returned from a public function; consumed entirely inside
    /// [`crate::retry::try_op`] and friends.
    #[error("retry")]
    Retry,

    #[error("misconfiguration: {0}")]
    Misconfiguration(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("required field missing: {0}")]
    MissingField(String),
}

impl Error {
    /// Used by the controller's error policy to pick a requeue duration.
    /// Misconfiguration and validation errors are a human's problem, not a
    /// transient cloud hiccup, so they get the long backoff.
    pub fn is_retriable(&self) -> bool {
        !matches!(
            self,
            Error::Misconfiguration(_) | Error::ValidationError(_) | Error::ConfigError(_)
        )
    }
}

/// Breadcrumb shape used for `AlicloudCluster.status.message` /
/// `AlicloudMachine.status.errorMessage`. Kept separate from [`Error`] so
/// status fields never carry a `Debug`-formatted internal error.
pub fn reason_string(err: &Error) -> String {
    match err {
        Error::Timeout { cause } => format!("timeout: {}", cause),
        other => other.to_string(),
    }
}
