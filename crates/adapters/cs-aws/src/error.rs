//! SDK error mapping onto the classified error taxonomy.

use aws_sdk_ec2::error::{ProvideErrorMetadata, SdkError};
use cs_error::{classify_raw, ApiError};

/// Map an SDK error onto a classified [`ApiError`].
///
/// Service errors classify by their provider error code; dispatch and
/// timeout failures map directly onto the transient classes.
pub(crate) fn classify_sdk_error<E, R>(err: SdkError<E, R>) -> ApiError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::ServiceError(context) => {
            let service_error = context.err();
            classify_service_error(service_error.code(), service_error.message())
        }
        SdkError::TimeoutError(_) => ApiError::Timeout(format!("{err:?}")),
        SdkError::DispatchFailure(_) => ApiError::TransientNetwork(format!("{err:?}")),
        _ => classify_raw(&format!("{err:?}")),
    }
}

fn classify_service_error(code: Option<&str>, message: Option<&str>) -> ApiError {
    let code = code.unwrap_or("Unknown");
    let message = message.unwrap_or("no message");
    classify_raw(&format!("{code}: {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_codes_classify_fatal() {
        assert!(matches!(
            classify_service_error(Some("UnauthorizedOperation"), Some("not allowed")),
            ApiError::Auth(_)
        ));
        assert!(matches!(
            classify_service_error(Some("AccessDenied"), None),
            ApiError::Auth(_)
        ));
    }

    #[test]
    fn test_throttle_codes_classify_retryable() {
        assert!(matches!(
            classify_service_error(Some("RequestLimitExceeded"), Some("Rate exceeded")),
            ApiError::Throttle(_)
        ));
        assert!(matches!(
            classify_service_error(Some("SlowDown"), None),
            ApiError::Throttle(_)
        ));
    }

    #[test]
    fn test_unknown_code_classifies_other() {
        assert!(matches!(
            classify_service_error(None, None),
            ApiError::Other(_)
        ));
    }
}
