// Copyright (c) Plateful Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::ApiError;

/// Claims carried by a bearer token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i32,
    pub email: String,
    /// Expiry as a unix timestamp
    pub exp: i64,
}

/// Issue a signed bearer token for an authenticated user.
pub fn issue_token(user_id: i32, email: &str) -> Result<String, ApiError> {
    let config = Config::get();
    let expires_at = Utc::now() + Duration::days(config.auth.token_ttl_days);

    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: expires_at.timestamp(),
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.auth.jwt_secret.as_bytes()),
    )?)
}

/// Verify a bearer token and return its claims. Expired or tampered tokens
/// fail with `Unauthenticated`.
pub fn verify_token(token: &str) -> Result<Claims, ApiError> {
    let config = Config::get();

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.auth.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthenticated("Token is not valid".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_config() {
        let _ = Config::init();
    }

    #[test]
    fn token_round_trip() {
        init_config();

        let token = issue_token(42, "ada@example.com").unwrap();
        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "ada@example.com");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn tampered_token_is_rejected() {
        init_config();

        let token = issue_token(7, "bob@example.com").unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        assert!(matches!(
            verify_token(&tampered),
            Err(ApiError::Unauthenticated(_))
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        init_config();

        assert!(matches!(
            verify_token("not-a-token"),
            Err(ApiError::Unauthenticated(_))
        ));
    }
}
