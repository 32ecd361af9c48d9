// Copyright (c) Plateful Team
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::token;
use crate::error::ApiError;

/// Caller identity resolved from the Authorization header. Handlers take
/// this as an argument; there is no ambient session state.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ApiError::Unauthenticated("No authentication token, access denied".to_string())
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthenticated("No authentication token, access denied".to_string())
        })?;

        let claims = token::verify_token(token)?;

        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::issue_token;
    use crate::config::Config;
    use axum::http::Request;

    async fn extract(auth_header: Option<&str>) -> Result<AuthUser, ApiError> {
        let mut builder = Request::builder().uri("/api/friends");
        if let Some(value) = auth_header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let request = builder.body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        AuthUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn missing_header_is_unauthenticated() {
        let _ = Config::init();
        assert!(matches!(
            extract(None).await,
            Err(ApiError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn non_bearer_header_is_unauthenticated() {
        let _ = Config::init();
        assert!(matches!(
            extract(Some("Basic dXNlcjpwdw==")).await,
            Err(ApiError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn valid_bearer_token_resolves_the_caller() {
        let _ = Config::init();
        let token = issue_token(11, "eve@example.com").unwrap();
        let user = extract(Some(&format!("Bearer {}", token))).await.unwrap();
        assert_eq!(user.id, 11);
    }
}
