// Copyright (c) Plateful Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::friendships;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_ACCEPTED: &str = "accepted";

/// Model for a directed friendship edge. An accepted friendship is a pair of
/// rows, one per direction, both `accepted`; a pending request is a single
/// row from requester to target.
#[derive(Debug, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = friendships)]
pub struct Friendship {
    pub id: i32,
    pub user_id: i32,
    pub friend_id: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
}

/// DTO for creating a new friendship edge
#[derive(Debug, Insertable)]
#[diesel(table_name = friendships)]
pub struct NewFriendship {
    pub user_id: i32,
    pub friend_id: i32,
    pub status: String,
}

/// DTO for a friend-list entry joined with the peer's identity
#[derive(Debug, Queryable, Serialize, Deserialize)]
pub struct FriendDetail {
    /// Friendship row id, used to unfriend
    pub id: i32,
    pub friend_id: i32,
    pub username: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

/// DTO for an incoming pending request joined with the requester's identity
#[derive(Debug, Queryable, Serialize, Deserialize)]
pub struct FriendRequestDetail {
    /// Friendship row id, used to accept or decline
    pub id: i32,
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}
