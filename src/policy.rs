// Copyright (c) Plateful Team
// SPDX-License-Identifier: Apache-2.0

//! Authorization predicates consulted before every mutating operation:
//! is-owner, is-accepted-friend, is-accepted-member, is-creator, can-edit.
//! Handlers go through these instead of re-querying ad hoc, so the rules
//! cannot drift between operations.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::error::ApiError;
use crate::models::friendship::STATUS_ACCEPTED;
use crate::models::group::MEMBER_ACCEPTED;
use crate::models::{Group, GroupMember, Restaurant};
use crate::schema::{friendships, group_members, groups};

/// True if `user_id` holds an accepted edge towards `peer_id`.
pub async fn is_accepted_friend(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    peer_id: i32,
) -> Result<bool, ApiError> {
    let count: i64 = friendships::table
        .filter(friendships::user_id.eq(user_id))
        .filter(friendships::friend_id.eq(peer_id))
        .filter(friendships::status.eq(STATUS_ACCEPTED))
        .count()
        .get_result(conn)
        .await?;

    Ok(count > 0)
}

/// The membership row for (group, user) in any status, if one exists.
pub async fn membership(
    conn: &mut AsyncPgConnection,
    group_id: i32,
    user_id: i32,
) -> Result<Option<GroupMember>, ApiError> {
    let row = group_members::table
        .filter(group_members::group_id.eq(group_id))
        .filter(group_members::user_id.eq(user_id))
        .first::<GroupMember>(conn)
        .await
        .optional()?;

    Ok(row)
}

/// True if the user holds an `accepted` membership row for the group.
pub async fn is_accepted_member(
    conn: &mut AsyncPgConnection,
    group_id: i32,
    user_id: i32,
) -> Result<bool, ApiError> {
    Ok(membership(conn, group_id, user_id)
        .await?
        .map(|m| m.status == MEMBER_ACCEPTED)
        .unwrap_or(false))
}

/// Fetch a group or fail with `NotFound`.
pub async fn require_group(conn: &mut AsyncPgConnection, group_id: i32) -> Result<Group, ApiError> {
    groups::table
        .filter(groups::id.eq(group_id))
        .first::<Group>(conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))
}

/// Fetch a group and require the caller to be its creator.
pub async fn require_creator(
    conn: &mut AsyncPgConnection,
    group_id: i32,
    user_id: i32,
) -> Result<Group, ApiError> {
    let group = require_group(conn, group_id).await?;

    if group.created_by != user_id {
        return Err(ApiError::Forbidden(
            "Only the group creator can do this".to_string(),
        ));
    }

    Ok(group)
}

/// Require an `accepted` membership row for (group, user).
pub async fn require_accepted_member(
    conn: &mut AsyncPgConnection,
    group_id: i32,
    user_id: i32,
) -> Result<GroupMember, ApiError> {
    match membership(conn, group_id, user_id).await? {
        Some(member) if member.status == MEMBER_ACCEPTED => Ok(member),
        _ => Err(ApiError::Forbidden(
            "You are not a member of this group".to_string(),
        )),
    }
}

/// Require an `accepted` membership row with edit permission.
pub async fn require_member_can_edit(
    conn: &mut AsyncPgConnection,
    group_id: i32,
    user_id: i32,
) -> Result<GroupMember, ApiError> {
    let member = require_accepted_member(conn, group_id, user_id).await?;

    if !member.can_edit {
        return Err(ApiError::Forbidden(
            "You do not have permission to edit restaurants in this group".to_string(),
        ));
    }

    Ok(member)
}

/// True if the restaurant row belongs to the user.
pub fn is_owner(restaurant: &Restaurant, user_id: i32) -> bool {
    restaurant.owner_id == user_id
}

/// Visibility decision for a single restaurant, over facts already fetched.
/// Owner always sees the row. A group-scoped row is governed by membership
/// alone, superseding the hidden flag and friend visibility. A personal row
/// is visible to accepted friends unless hidden.
pub fn can_view_restaurant(
    restaurant: &Restaurant,
    viewer_id: i32,
    viewer_is_friend_of_owner: bool,
    viewer_is_accepted_member: bool,
) -> bool {
    if is_owner(restaurant, viewer_id) {
        return true;
    }

    if restaurant.group_id.is_some() {
        return viewer_is_accepted_member;
    }

    viewer_is_friend_of_owner && !restaurant.is_hidden
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn restaurant(owner_id: i32, group_id: Option<i32>, is_hidden: bool) -> Restaurant {
        Restaurant {
            id: 1,
            owner_id,
            group_id,
            name: "Noodle Bar".to_string(),
            cuisine: "Ramen".to_string(),
            location: "Shoreditch".to_string(),
            rating: 4,
            is_wishlist: false,
            is_hidden,
            created_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn owner_always_sees_own_rows_even_hidden() {
        let r = restaurant(1, None, true);
        assert!(can_view_restaurant(&r, 1, false, false));
    }

    #[test]
    fn friend_sees_visible_personal_rows_only() {
        let visible = restaurant(1, None, false);
        let hidden = restaurant(1, None, true);
        assert!(can_view_restaurant(&visible, 2, true, false));
        assert!(!can_view_restaurant(&hidden, 2, true, false));
    }

    #[test]
    fn stranger_sees_nothing_personal() {
        let visible = restaurant(1, None, false);
        assert!(!can_view_restaurant(&visible, 2, false, false));
    }

    #[test]
    fn group_rows_follow_membership_not_friendship() {
        let shared = restaurant(1, Some(9), true);
        // Hidden flag is irrelevant for group rows; membership decides
        assert!(can_view_restaurant(&shared, 2, false, true));
        // A friend who is not an accepted member is shut out
        assert!(!can_view_restaurant(&shared, 2, true, false));
    }
}
