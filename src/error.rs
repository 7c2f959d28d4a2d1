use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::ExtractionError;
use crate::gateway::GatewayError;
use crate::validation::Violation;

pub const RATE_LIMITED_MESSAGE: &str = "사용량 한도를 초과했습니다. 잠시 후 다시 시도해주세요.";
pub const CREDITS_EXHAUSTED_MESSAGE: &str =
    "크레딧이 부족합니다. 워크스페이스에 크레딧을 추가해주세요.";
pub const GENERATION_FAILED_MESSAGE: &str = "AI 분석 중 오류가 발생했습니다";
pub const NOT_CONFIGURED_MESSAGE: &str = "AI service not configured";
pub const NO_ANALYSIS_MESSAGE: &str = "분석 결과를 생성하지 못했습니다";
pub const NO_IDEAS_MESSAGE: &str = "아이디어를 생성하지 못했습니다";

/// Wire shape of every error answer from the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

/// Everything a request can end in besides success.
///
/// Each variant maps to a fixed status and a fixed user-facing message.
/// Upstream detail is carried for logging only and never reaches the client.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    Validation(Violation),

    #[error("upstream rate limited")]
    UpstreamRateLimited,

    #[error("upstream credits exhausted")]
    UpstreamCreditsExhausted,

    #[error("upstream generation failed: {0}")]
    UpstreamGenerationFailure(String),

    #[error("gateway credential is not configured")]
    Configuration,

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
            ServiceError::UpstreamCreditsExhausted => StatusCode::PAYMENT_REQUIRED,
            ServiceError::UpstreamGenerationFailure(_)
            | ServiceError::Configuration
            | ServiceError::Extraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Validation(v) => v.message.clone(),
            ServiceError::UpstreamRateLimited => RATE_LIMITED_MESSAGE.to_string(),
            ServiceError::UpstreamCreditsExhausted => CREDITS_EXHAUSTED_MESSAGE.to_string(),
            ServiceError::UpstreamGenerationFailure(_) => GENERATION_FAILED_MESSAGE.to_string(),
            ServiceError::Configuration => NOT_CONFIGURED_MESSAGE.to_string(),
            ServiceError::Extraction(e) => e.user_message().to_string(),
        }
    }
}

impl From<Violation> for ServiceError {
    fn from(v: Violation) -> Self {
        ServiceError::Validation(v)
    }
}

impl From<GatewayError> for ServiceError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::RateLimited => ServiceError::UpstreamRateLimited,
            GatewayError::CreditsExhausted => ServiceError::UpstreamCreditsExhausted,
            GatewayError::NotConfigured => ServiceError::Configuration,
            other => ServiceError::UpstreamGenerationFailure(other.to_string()),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, %status, "request rejected");
        }
        let body = ErrorBody {
            error: self.user_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Field;

    #[test]
    fn gateway_errors_keep_their_status() {
        let rate: ServiceError = GatewayError::RateLimited.into();
        assert_eq!(rate.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(rate.user_message(), RATE_LIMITED_MESSAGE);

        let credits: ServiceError = GatewayError::CreditsExhausted.into();
        assert_eq!(credits.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(credits.user_message(), CREDITS_EXHAUSTED_MESSAGE);
    }

    #[test]
    fn other_upstream_status_is_generic_500() {
        let err: ServiceError = GatewayError::Status {
            status: 503,
            body: "upstream exploded: secret detail".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), GENERATION_FAILED_MESSAGE);
        assert!(!err.user_message().contains("secret"));
    }

    #[test]
    fn validation_message_is_surfaced() {
        let err: ServiceError = Violation::new(Field::Role, "담당 업무를 입력해주세요").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.user_message(), "담당 업무를 입력해주세요");
    }
}
