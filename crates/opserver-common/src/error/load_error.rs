use thiserror::Error;

/// Why a single image probe failed.
///
/// These never reach a view: the probe engine recovers from every one of them
/// by moving on to the next candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Server answered with status {0}")]
    Status(u16),

    #[error("Response is not an image (content type '{0}')")]
    NotAnImage(String),

    #[error("Response body is empty")]
    EmptyBody,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Cannot resolve URL '{0}'")]
    Unresolvable(String),
}
