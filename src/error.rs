use aws_smithy_types::error::operation::BuildError;
use thiserror::Error as ThisError;

/// Errors surfaced by the client and the helpers built on it.
///
/// The first four variants classify what the service reports; the rest are raised locally.
#[allow(clippy::enum_variant_names)]
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("resource already exists: {0}")]
    ResourceAlreadyExists(String),
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
    #[error("conditional check failed: {0}")]
    ConditionalCheckFailed(String),
    #[error("aws-sdk error: {0}")]
    ServiceError(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("not found dynamodb stream from table: {0}")]
    NotFoundStream(String),
    #[error("not found dynamodb stream description from arn: {0}")]
    NotFoundStreamDescription(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unsupported attribute value: {0}")]
    UnsupportedAttributeValue(String),
    #[error("timed out waiting for {0}")]
    Timeout(String),
    #[error("failed to build request: {0}")]
    Build(#[from] BuildError),
}

impl Error {
    pub fn is_conditional_check_failed(&self) -> bool {
        matches!(self, Self::ConditionalCheckFailed(_))
    }

    pub fn is_resource_not_found(&self) -> bool {
        matches!(self, Self::ResourceNotFound(_))
    }

    pub(crate) fn service<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ServiceError(Box::new(err))
    }
}
