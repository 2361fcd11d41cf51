//! Mapping of `SubscriptionError` onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::dto::ErrorResponse;
use crate::domain::foundation::{DomainError, ValidationError};
use crate::domain::subscription::SubscriptionError;

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub SubscriptionError);

impl From<SubscriptionError> for ApiError {
    fn from(err: SubscriptionError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(SubscriptionError::from(err))
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(SubscriptionError::from(err))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SubscriptionError::PlanNotFound(_)
            | SubscriptionError::SubscriptionNotFound(_)
            | SubscriptionError::NoSubscriptionForUser(_) => StatusCode::NOT_FOUND,
            SubscriptionError::IllegalTransition { .. }
            | SubscriptionError::OpenSubscriptionExists(_)
            | SubscriptionError::ConcurrentModification(_) => StatusCode::CONFLICT,
            SubscriptionError::OverrideRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SubscriptionError::Verification(_) | SubscriptionError::ValidationFailed { .. } => {
                StatusCode::BAD_REQUEST
            }
            SubscriptionError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0.message(), "Request failed");
        }

        let code = self.0.code().to_string();
        let message = self.0.user_message();
        let body = match &self.0 {
            SubscriptionError::OverrideRejected(guard) => ErrorResponse::with_details(
                code,
                message,
                serde_json::json!({ "guard": guard.code() }),
            ),
            SubscriptionError::ValidationFailed { field, .. } => ErrorResponse::with_details(
                code,
                message,
                serde_json::json!({ "field": field }),
            ),
            _ => ErrorResponse::new(code, message),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SubscriptionId, UserId};
    use crate::domain::payment::{VerificationError, PAYMENT_NOT_CONFIRMED};
    use crate::domain::subscription::{OverrideGuard, SubscriptionStatus};

    #[test]
    fn verification_failures_share_one_message() {
        for err in [
            VerificationError::BadSignature,
            VerificationError::GatewayPayloadMalformed("signature"),
        ] {
            let api = ApiError(SubscriptionError::Verification(err));
            assert_eq!(api.status(), StatusCode::BAD_REQUEST);
            assert_eq!(api.0.user_message(), PAYMENT_NOT_CONFIRMED);
        }
    }

    #[test]
    fn status_codes_by_kind() {
        let id = SubscriptionId::new();
        let user = UserId::new("learner-1").unwrap();
        let cases = [
            (SubscriptionError::SubscriptionNotFound(id), StatusCode::NOT_FOUND),
            (
                SubscriptionError::illegal_transition(id, SubscriptionStatus::Cancelled, "user_cancel"),
                StatusCode::CONFLICT,
            ),
            (SubscriptionError::OpenSubscriptionExists(user), StatusCode::CONFLICT),
            (SubscriptionError::ConcurrentModification(id), StatusCode::CONFLICT),
            (
                SubscriptionError::OverrideRejected(OverrideGuard::MissingReason),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                SubscriptionError::validation("limit", "too large"),
                StatusCode::BAD_REQUEST,
            ),
            (
                SubscriptionError::infrastructure("pool timed out"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[test]
    fn infrastructure_detail_is_not_exposed() {
        let api = ApiError(SubscriptionError::infrastructure("password=hunter2"));
        assert!(!api.0.user_message().contains("hunter2"));
    }
}
