use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{Claims, JwtVerifier};
use crate::error::ApiError;

/// Authenticated caller extracted from the bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(verifier): State<Arc<JwtVerifier>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_jwt_from_headers(&headers) {
        Ok(token) => token,
        Err(msg) => return ApiError::unauthorized(msg).into_response(),
    };

    let claims = match verifier.verify(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Rejected bearer token: {}", e);
            return ApiError::unauthorized(e.to_string()).into_response();
        }
    };

    request.extensions_mut().insert(AuthUser::from(claims));
    next.run(request).await
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_tokens;
    use crate::config::SecurityConfig;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Extension, Router};
    use chrono::Duration;
    use tower::ServiceExt;

    const SECRET: &str = "middleware-test-secret";

    fn app() -> Router {
        let verifier = JwtVerifier::new(&SecurityConfig {
            enable_cors: false,
            cors_origins: Vec::new(),
            jwt_secret: SECRET.to_string(),
            jwt_issuer: None,
            jwt_audience: None,
        })
        .unwrap();

        Router::new()
            .route("/me", get(|Extension(user): Extension<AuthUser>| async move { user.user_id }))
            .layer(middleware::from_fn_with_state(Arc::new(verifier), jwt_auth_middleware))
    }

    fn get_me(auth: Option<String>) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder().uri("/me");
        if let Some(value) = auth {
            builder = builder.header("authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_or_bad_token_is_401() {
        let res = app().oneshot(get_me(None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app().oneshot(get_me(Some("Bearer nope".into()))).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let token = test_tokens::sign(SECRET, "u1", Duration::hours(1));
        let res = app().oneshot(get_me(Some(format!("Token {}", token)))).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_reaches_handler() {
        let token = test_tokens::sign(SECRET, "user-7", Duration::hours(1));
        let res = app().oneshot(get_me(Some(format!("Bearer {}", token)))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"user-7");
    }
}
