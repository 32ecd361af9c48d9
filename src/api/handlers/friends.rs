// Copyright (c) Plateful Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::friendship::{STATUS_ACCEPTED, STATUS_PENDING};
use crate::models::{FriendDetail, FriendRequestDetail, Friendship, NewFriendship, PublicUser};
use crate::schema::{friendships, users};

/// Search results are capped; this is a people picker, not a directory.
const SEARCH_LIMIT: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FriendRequestBody {
    pub friend_id: Option<i32>,
}

/// Search for users by username, excluding the caller
pub async fn search_users(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Query(params): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.query.unwrap_or_default();
    let query = query.trim();

    if query.is_empty() {
        return Err(ApiError::Validation("Search query is required".to_string()));
    }

    let mut conn = db_pool.get().await?;

    let matches: Vec<PublicUser> = users::table
        .filter(users::username.ilike(format!("%{}%", query)))
        .filter(users::id.ne(auth.id))
        .select((users::id, users::username, users::email))
        .limit(SEARCH_LIMIT)
        .load(&mut conn)
        .await?;

    Ok(Json(json!({ "users": matches })))
}

/// Get all friends (accepted edges) with the peer's identity
pub async fn get_friends(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    let friends: Vec<FriendDetail> = friendships::table
        .inner_join(users::table.on(users::id.eq(friendships::friend_id)))
        .filter(friendships::user_id.eq(auth.id))
        .filter(friendships::status.eq(STATUS_ACCEPTED))
        .order_by(friendships::created_at.desc())
        .select((
            friendships::id,
            friendships::friend_id,
            users::username,
            users::email,
            friendships::created_at,
        ))
        .load(&mut conn)
        .await?;

    Ok(Json(json!({ "friends": friends })))
}

/// Get incoming pending friend requests with the requester's identity
pub async fn get_pending_requests(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    let requests: Vec<FriendRequestDetail> = friendships::table
        .inner_join(users::table.on(users::id.eq(friendships::user_id)))
        .filter(friendships::friend_id.eq(auth.id))
        .filter(friendships::status.eq(STATUS_PENDING))
        .order_by(friendships::created_at.desc())
        .select((
            friendships::id,
            friendships::user_id,
            users::username,
            users::email,
            friendships::created_at,
        ))
        .load(&mut conn)
        .await?;

    Ok(Json(json!({ "requests": requests })))
}

/// Send a friend request
pub async fn send_friend_request(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Json(payload): Json<FriendRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let friend_id = payload
        .friend_id
        .ok_or_else(|| ApiError::Validation("Friend ID is required".to_string()))?;

    if friend_id == auth.id {
        return Err(ApiError::InvalidTarget(
            "Cannot send friend request to yourself".to_string(),
        ));
    }

    let mut conn = db_pool.get().await?;

    // Check if the target exists
    let target_exists: i64 = users::table
        .filter(users::id.eq(friend_id))
        .count()
        .get_result(&mut conn)
        .await?;

    if target_exists == 0 {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    // Any row between the unordered pair blocks a new request, regardless of
    // direction or status
    let existing: i64 = friendships::table
        .filter(
            friendships::user_id
                .eq(auth.id)
                .and(friendships::friend_id.eq(friend_id))
                .or(friendships::user_id
                    .eq(friend_id)
                    .and(friendships::friend_id.eq(auth.id))),
        )
        .count()
        .get_result(&mut conn)
        .await?;

    if existing > 0 {
        return Err(ApiError::DuplicateRequest(
            "A friend request or friendship already exists with this user".to_string(),
        ));
    }

    let friendship: Friendship = diesel::insert_into(friendships::table)
        .values(&NewFriendship {
            user_id: auth.id,
            friend_id,
            status: STATUS_PENDING.to_string(),
        })
        .get_result(&mut conn)
        .await?;

    debug!("Friend request {} -> {}", auth.id, friend_id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Friend request sent",
            "friendship": friendship
        })),
    ))
}

/// Accept a friend request: promote the pending row and insert the
/// reciprocal edge. Both writes happen in one transaction so the graph can
/// never end up with a one-sided accepted friendship.
pub async fn accept_friend_request(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Path(request_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    let request = friendships::table
        .filter(friendships::id.eq(request_id))
        .filter(friendships::friend_id.eq(auth.id))
        .filter(friendships::status.eq(STATUS_PENDING))
        .first::<Friendship>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Friend request not found".to_string()))?;

    let requester_id = request.user_id;
    let current_user_id = auth.id;

    conn.build_transaction()
        .run(|conn| {
            async move {
                diesel::update(friendships::table.filter(friendships::id.eq(request_id)))
                    .set(friendships::status.eq(STATUS_ACCEPTED))
                    .execute(conn)
                    .await?;

                diesel::insert_into(friendships::table)
                    .values(&NewFriendship {
                        user_id: current_user_id,
                        friend_id: requester_id,
                        status: STATUS_ACCEPTED.to_string(),
                    })
                    .execute(conn)
                    .await?;

                Result::<_, diesel::result::Error>::Ok(())
            }
            .scope_boxed()
        })
        .await?;

    debug!("Friendship accepted: {} <-> {}", current_user_id, requester_id);

    Ok(Json(json!({ "message": "Friend request accepted" })))
}

/// Decline a friend request. The pending row is deleted outright; declined
/// friend requests leave no trace, unlike declined group invites.
pub async fn decline_friend_request(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Path(request_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    let deleted = diesel::delete(
        friendships::table
            .filter(friendships::id.eq(request_id))
            .filter(friendships::friend_id.eq(auth.id))
            .filter(friendships::status.eq(STATUS_PENDING)),
    )
    .execute(&mut conn)
    .await?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Friend request not found".to_string()));
    }

    Ok(Json(json!({ "message": "Friend request declined" })))
}

/// Unfriend a user: delete the caller's edge and the reciprocal edge in one
/// transaction. A missing reciprocal row is tolerated but logged, since it
/// means the graph was already asymmetric.
pub async fn unfriend_user(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Path(friendship_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    let friendship = friendships::table
        .filter(friendships::id.eq(friendship_id))
        .filter(friendships::user_id.eq(auth.id))
        .first::<Friendship>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Friendship not found".to_string()))?;

    let friend_id = friendship.friend_id;
    let current_user_id = auth.id;

    conn.build_transaction()
        .run(|conn| {
            async move {
                diesel::delete(friendships::table.filter(friendships::id.eq(friendship_id)))
                    .execute(conn)
                    .await?;

                let reciprocal_deleted = diesel::delete(
                    friendships::table
                        .filter(friendships::user_id.eq(friend_id))
                        .filter(friendships::friend_id.eq(current_user_id)),
                )
                .execute(conn)
                .await?;

                if reciprocal_deleted == 0 {
                    warn!(
                        "friendship {} had no reciprocal edge {} -> {}",
                        friendship_id, friend_id, current_user_id
                    );
                }

                Result::<_, diesel::result::Error>::Ok(())
            }
            .scope_boxed()
        })
        .await?;

    Ok(Json(json!({ "message": "Friend removed successfully" })))
}
