//! Classification of Blob service error responses.

use reqwest::{Response, StatusCode};
use strum::{AsRefStr, Display, IntoStaticStr};

use super::xml::{self, ServiceError};
use crate::error::{Error, ErrorKind, Result};

/// Blob service operation a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum Operation {
    GetContainerProperties,
    ListBlobs,
    GetUserDelegationKey,
    AcquireLease,
    ReleaseLease,
    CopyBlob,
    GetMetadata,
    SetMetadata,
}

impl Operation {
    /// Error kind reported for request failures specific to this operation.
    const fn kind(self) -> ErrorKind {
        match self {
            Self::GetContainerProperties => ErrorKind::Configuration,
            Self::ListBlobs => ErrorKind::Listing,
            Self::GetUserDelegationKey => ErrorKind::Authentication,
            Self::AcquireLease | Self::ReleaseLease => ErrorKind::Lease,
            Self::CopyBlob => ErrorKind::CopyInit,
            Self::GetMetadata | Self::SetMetadata => ErrorKind::Metadata,
        }
    }
}

/// Maps an HTTP status to an error kind for `operation`.
pub(crate) fn classify(operation: Operation, status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::Authentication,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::REQUEST_TIMEOUT => ErrorKind::Timeout,
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => ErrorKind::ServiceUnavailable,
        _ => operation.kind(),
    }
}

/// Service error code from the `x-ms-error-code` header.
pub(crate) fn error_code(response: &Response) -> Option<String> {
    response
        .headers()
        .get("x-ms-error-code")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Passes successful responses through, converts the rest into [`Error`].
pub(crate) async fn check(
    response: Response,
    operation: Operation,
    resource: &str,
) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let header_code = error_code(&response);
    let body = response.text().await.unwrap_or_default();
    let detail: Option<ServiceError> = xml::from_str(&body).ok();
    let code = header_code.or_else(|| detail.as_ref().and_then(|d| d.code.clone()));
    let kind = classify(operation, status);

    let mut message = format!("{operation} returned {status}");
    if let Some(code) = &code {
        message.push_str(&format!(" ({code})"));
    }
    if let Some(text) = detail.as_ref().and_then(first_message_line) {
        message.push_str(&format!(": {text}"));
    }

    Err(Error::new(kind)
        .with_message(message)
        .with_context(resource.to_owned()))
}

/// First line of the `<Message>` in a Blob service error body.
fn first_message_line(error: &ServiceError) -> Option<String> {
    error
        .message
        .as_deref()?
        .lines()
        .next()
        .map(|line| line.trim().to_owned())
}
