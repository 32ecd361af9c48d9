// Copyright (c) Plateful Team
// SPDX-License-Identifier: Apache-2.0

//! Credential boundary: password hashing, bearer tokens and the request
//! extractor that resolves a token to a caller identity. Everything past
//! this module trusts the resolved identity unconditionally.

mod extractor;
mod token;

pub use extractor::AuthUser;
pub use token::{issue_token, verify_token, Claims};

use crate::error::ApiError;

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
}

/// Check a password against a stored hash.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, ApiError> {
    Ok(bcrypt::verify(password, password_hash)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }
}
