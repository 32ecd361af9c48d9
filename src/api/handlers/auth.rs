// Copyright (c) Plateful Team
// SPDX-License-Identifier: Apache-2.0

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::auth::{hash_password, issue_token, verify_password, AuthUser};
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::{NewUser, PublicUser, User};
use crate::schema::users;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Sign up a new user
pub async fn signup(
    State(db_pool): State<DbPool>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_string();

    if username.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Please provide username, email, and password".to_string(),
        ));
    }

    let mut conn = db_pool.get().await?;

    // Check if user already exists
    let existing = users::table
        .filter(users::email.eq(&email).or(users::username.eq(&username)))
        .first::<User>(&mut conn)
        .await
        .optional()?;

    if existing.is_some() {
        return Err(ApiError::Validation(
            "User already exists with this email or username".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password)?;

    let user: User = diesel::insert_into(users::table)
        .values(&NewUser {
            username,
            email,
            password_hash,
        })
        .get_result(&mut conn)
        .await?;

    debug!("Created user {} ({})", user.username, user.id);

    let token = issue_token(user.id, &user.email)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "token": token,
            "user": PublicUser::from(user)
        })),
    ))
}

/// Log in an existing user
pub async fn login(
    State(db_pool): State<DbPool>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Please provide email and password".to_string(),
        ));
    }

    let mut conn = db_pool.get().await?;

    let user = users::table
        .filter(users::email.eq(&payload.email))
        .first::<User>(&mut conn)
        .await
        .optional()?
        // Unknown email and wrong password are indistinguishable to the caller
        .ok_or_else(|| ApiError::Unauthenticated("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(ApiError::Unauthenticated("Invalid credentials".to_string()));
    }

    let token = issue_token(user.id, &user.email)?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "user": PublicUser::from(user)
    })))
}

/// Get the current user's profile
pub async fn me(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    let user = users::table
        .filter(users::id.eq(auth.id))
        .first::<User>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "user": {
            "id": user.id,
            "username": user.username,
            "email": user.email,
            "created_at": user.created_at,
        }
    })))
}
