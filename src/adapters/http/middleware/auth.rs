//! Identity extractors for axum.
//!
//! Authentication happens upstream (API gateway / session service), which
//! forwards the caller's identity in headers:
//!
//! - `X-User-Id` - the learner making the request
//! - `X-Admin-Id` - the administrator making the request
//!
//! ```ignore
//! async fn handler(LearnerIdentity(user_id): LearnerIdentity) -> impl IntoResponse { ... }
//! ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::foundation::UserId;

pub const USER_HEADER: &str = "X-User-Id";
pub const ADMIN_HEADER: &str = "X-Admin-Id";

/// Rejection when the identity header is missing or blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRejection {
    header: &'static str,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error_code": "AUTHENTICATION_REQUIRED",
                "message": format!("{} header is required", self.header),
            })),
        )
            .into_response()
    }
}

fn identity(parts: &Parts, header: &'static str) -> Result<UserId, AuthRejection> {
    parts
        .headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| UserId::new(s.trim()).ok())
        .ok_or(AuthRejection { header })
}

/// The authenticated learner.
#[derive(Debug, Clone)]
pub struct LearnerIdentity(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for LearnerIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity(parts, USER_HEADER).map(LearnerIdentity)
    }
}

/// The authenticated administrator.
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for AdminIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity(parts, ADMIN_HEADER).map(AdminIdentity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<(&str, &str)>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn learner_identity_reads_header() {
        let mut parts = parts_with(Some((USER_HEADER, "learner-1")));
        let LearnerIdentity(user) = LearnerIdentity::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(user.as_str(), "learner-1");
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let mut parts = parts_with(None);
        let rejection = AdminIdentity::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn learner_header_does_not_grant_admin() {
        let mut parts = parts_with(Some((USER_HEADER, "learner-1")));
        assert!(AdminIdentity::from_request_parts(&mut parts, &())
            .await
            .is_err());
    }
}
