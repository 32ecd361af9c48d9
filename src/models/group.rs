// Copyright (c) Plateful Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{group_members, groups};

pub const MEMBER_PENDING: &str = "pending";
pub const MEMBER_ACCEPTED: &str = "accepted";
pub const MEMBER_DECLINED: &str = "declined";

/// Model for a shared group list
#[derive(Debug, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = groups)]
pub struct Group {
    pub id: i32,
    pub name: String,
    pub created_by: i32,
    pub created_at: NaiveDateTime,
}

/// DTO for creating a new group
#[derive(Debug, Insertable)]
#[diesel(table_name = groups)]
pub struct NewGroup {
    pub name: String,
    pub created_by: i32,
}

/// Model for a membership row. There is exactly one row per (group, user);
/// a declined invite keeps its row and is reactivated in place on re-invite.
#[derive(Debug, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = group_members)]
pub struct GroupMember {
    pub id: i32,
    pub group_id: i32,
    pub user_id: i32,
    pub can_edit: bool,
    pub status: String,
    pub joined_at: NaiveDateTime,
}

/// DTO for creating a membership row
#[derive(Debug, Insertable)]
#[diesel(table_name = group_members)]
pub struct NewGroupMember {
    pub group_id: i32,
    pub user_id: i32,
    pub can_edit: bool,
    pub status: String,
}

/// DTO for the caller's group listing, joined with the creator's username
/// and the caller's own membership flags
#[derive(Debug, Serialize, Deserialize)]
pub struct GroupSummary {
    pub id: i32,
    pub name: String,
    pub created_by: i32,
    pub created_at: NaiveDateTime,
    pub creator_username: String,
    pub can_edit: bool,
    pub member_count: i64,
}

/// DTO for a roster entry joined with the member's identity
#[derive(Debug, Queryable, Serialize, Deserialize)]
pub struct MemberDetail {
    /// Membership row id, used by the creator to remove or re-permission
    pub id: i32,
    pub user_id: i32,
    pub can_edit: bool,
    pub status: String,
    pub joined_at: NaiveDateTime,
    pub username: String,
    pub email: String,
}

/// DTO for a pending invite joined with group name and creator username
#[derive(Debug, Queryable, Serialize, Deserialize)]
pub struct GroupInviteDetail {
    pub id: i32,
    pub group_id: i32,
    pub group_name: String,
    pub creator_username: String,
    pub joined_at: NaiveDateTime,
}
