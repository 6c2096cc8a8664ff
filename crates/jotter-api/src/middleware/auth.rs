//! Bearer-token authentication extractor.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// The caller of an authenticated route.
///
/// ```ignore
/// async fn handler(user: AuthUser, State(state): State<AppState>) -> impl IntoResponse {
///     state.notes.list(user.user_id, Default::default()).await
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.authenticator.validate_token(token)?;
        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.email,
        })
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub(crate) fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Authorization header required".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| {
            ApiError::Unauthorized("Invalid authorization header format".to_string())
        })?
        .trim();

    if token.is_empty() {
        return Err(ApiError::Unauthorized("Token required".to_string()));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/notes");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc"))).unwrap(), "abc");
        assert!(matches!(
            bearer_token(&parts(None)),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            bearer_token(&parts(Some("Basic abc"))),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            bearer_token(&parts(Some("Bearer   "))),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
