// Copyright (c) Plateful Team
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::group::{MEMBER_ACCEPTED, MEMBER_DECLINED, MEMBER_PENDING};
use crate::models::restaurant::validate_rating;
use crate::models::{
    Group, GroupInviteDetail, GroupMember, GroupSummary, MemberDetail, NewGroup, NewGroupMember,
    NewRestaurant, Restaurant, RestaurantWithOwner,
};
use crate::policy;
use crate::schema::{group_members, groups, restaurants, users};

#[derive(Debug, Deserialize)]
pub struct GroupNameBody {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InviteBody {
    pub user_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct PermissionsBody {
    pub can_edit: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct GroupRestaurantBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub is_wishlist: bool,
}

#[derive(Debug, Deserialize)]
pub struct RatingBody {
    pub rating: Option<i32>,
}

/// Create a new group. The group row and the creator's membership row
/// (accepted, can_edit) are inserted in one transaction; a group with no
/// creator membership cannot exist.
pub async fn create_group(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Json(payload): Json<GroupNameBody>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload.name.unwrap_or_default().trim().to_string();

    if name.is_empty() {
        return Err(ApiError::Validation("Group name is required".to_string()));
    }

    let mut conn = db_pool.get().await?;
    let creator_id = auth.id;

    let group = conn
        .build_transaction()
        .run(|conn| {
            async move {
                let group: Group = diesel::insert_into(groups::table)
                    .values(&NewGroup {
                        name,
                        created_by: creator_id,
                    })
                    .get_result(conn)
                    .await?;

                diesel::insert_into(group_members::table)
                    .values(&NewGroupMember {
                        group_id: group.id,
                        user_id: creator_id,
                        can_edit: true,
                        status: MEMBER_ACCEPTED.to_string(),
                    })
                    .execute(conn)
                    .await?;

                Result::<_, diesel::result::Error>::Ok(group)
            }
            .scope_boxed()
        })
        .await?;

    debug!("Group {} created by {}", group.id, creator_id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Group created successfully",
            "group": group
        })),
    ))
}

/// Get all groups the caller is an accepted member of
pub async fn get_groups(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    let rows: Vec<(Group, bool, String)> = groups::table
        .inner_join(group_members::table.on(group_members::group_id.eq(groups::id)))
        .inner_join(users::table.on(users::id.eq(groups::created_by)))
        .filter(group_members::user_id.eq(auth.id))
        .filter(group_members::status.eq(MEMBER_ACCEPTED))
        .order_by(groups::created_at.desc())
        .select((
            Group::as_select(),
            group_members::can_edit,
            users::username,
        ))
        .load(&mut conn)
        .await?;

    let group_ids: Vec<i32> = rows.iter().map(|(group, _, _)| group.id).collect();

    let counts: HashMap<i32, i64> = group_members::table
        .filter(group_members::group_id.eq_any(&group_ids))
        .filter(group_members::status.eq(MEMBER_ACCEPTED))
        .group_by(group_members::group_id)
        .select((group_members::group_id, diesel::dsl::count_star()))
        .load::<(i32, i64)>(&mut conn)
        .await?
        .into_iter()
        .collect();

    let summaries: Vec<GroupSummary> = rows
        .into_iter()
        .map(|(group, can_edit, creator_username)| {
            let member_count = counts.get(&group.id).copied().unwrap_or(0);
            GroupSummary {
                id: group.id,
                name: group.name,
                created_by: group.created_by,
                created_at: group.created_at,
                creator_username,
                can_edit,
                member_count,
            }
        })
        .collect();

    Ok(Json(json!({ "groups": summaries })))
}

/// Get a single group with its accepted roster and restaurants. Only
/// accepted members may look inside; a pending or declined row is not
/// enough.
pub async fn get_group(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Path(group_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    let group = policy::require_group(&mut conn, group_id).await?;
    policy::require_accepted_member(&mut conn, group_id, auth.id).await?;

    let creator_username: String = users::table
        .filter(users::id.eq(group.created_by))
        .select(users::username)
        .first(&mut conn)
        .await?;

    let members: Vec<MemberDetail> = group_members::table
        .inner_join(users::table.on(users::id.eq(group_members::user_id)))
        .filter(group_members::group_id.eq(group_id))
        .filter(group_members::status.eq(MEMBER_ACCEPTED))
        .order_by(group_members::joined_at.asc())
        .select((
            group_members::id,
            group_members::user_id,
            group_members::can_edit,
            group_members::status,
            group_members::joined_at,
            users::username,
            users::email,
        ))
        .load(&mut conn)
        .await?;

    let shared: Vec<(Restaurant, String)> = restaurants::table
        .inner_join(users::table.on(users::id.eq(restaurants::owner_id)))
        .filter(restaurants::group_id.eq(group_id))
        .order_by(restaurants::created_at.desc())
        .select((Restaurant::as_select(), users::username))
        .load(&mut conn)
        .await?;

    let shared: Vec<RestaurantWithOwner> = shared
        .into_iter()
        .map(|(restaurant, owner_username)| RestaurantWithOwner::new(restaurant, owner_username))
        .collect();

    Ok(Json(json!({
        "group": {
            "id": group.id,
            "name": group.name,
            "created_by": group.created_by,
            "created_at": group.created_at,
            "creator_username": creator_username,
        },
        "members": members,
        "restaurants": shared
    })))
}

/// Rename a group; creator only
pub async fn update_group(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Path(group_id): Path<i32>,
    Json(payload): Json<GroupNameBody>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    policy::require_creator(&mut conn, group_id, auth.id).await?;

    let name = payload.name.unwrap_or_default().trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation("Group name is required".to_string()));
    }

    let group: Group = diesel::update(groups::table.filter(groups::id.eq(group_id)))
        .set(groups::name.eq(name))
        .get_result(&mut conn)
        .await?;

    Ok(Json(json!({
        "message": "Group updated successfully",
        "group": group
    })))
}

/// Delete a group; creator only. Memberships, group restaurants and the
/// group row go in one transaction, so a failure partway leaves the group
/// intact rather than half-emptied.
pub async fn delete_group(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Path(group_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    policy::require_creator(&mut conn, group_id, auth.id).await?;

    conn.build_transaction()
        .run(|conn| {
            async move {
                diesel::delete(
                    group_members::table.filter(group_members::group_id.eq(group_id)),
                )
                .execute(conn)
                .await?;

                diesel::delete(restaurants::table.filter(restaurants::group_id.eq(group_id)))
                    .execute(conn)
                    .await?;

                diesel::delete(groups::table.filter(groups::id.eq(group_id)))
                    .execute(conn)
                    .await?;

                Result::<_, diesel::result::Error>::Ok(())
            }
            .scope_boxed()
        })
        .await?;

    debug!("Group {} deleted by {}", group_id, auth.id);

    Ok(Json(json!({ "message": "Group deleted successfully" })))
}

/// Invite a user to the group; creator only. A pending or accepted row
/// blocks the invite; a declined row is reactivated in place, keeping one
/// membership row per (group, user).
pub async fn add_member(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Path(group_id): Path<i32>,
    Json(payload): Json<InviteBody>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    policy::require_creator(&mut conn, group_id, auth.id).await?;

    let target_id = payload
        .user_id
        .ok_or_else(|| ApiError::Validation("User ID is required".to_string()))?;

    let target_exists: i64 = users::table
        .filter(users::id.eq(target_id))
        .count()
        .get_result(&mut conn)
        .await?;

    if target_exists == 0 {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let member = match policy::membership(&mut conn, group_id, target_id).await? {
        Some(existing) if existing.status == MEMBER_PENDING => {
            return Err(ApiError::DuplicateInvite(
                "Invite already sent to this user".to_string(),
            ));
        }
        Some(existing) if existing.status == MEMBER_ACCEPTED => {
            return Err(ApiError::DuplicateInvite(
                "User is already a member of this group".to_string(),
            ));
        }
        Some(declined) => {
            // Re-invite after decline reuses the row
            diesel::update(group_members::table.filter(group_members::id.eq(declined.id)))
                .set((
                    group_members::status.eq(MEMBER_PENDING),
                    group_members::can_edit.eq(false),
                    group_members::joined_at.eq(diesel::dsl::now),
                ))
                .get_result::<GroupMember>(&mut conn)
                .await?
        }
        None => {
            diesel::insert_into(group_members::table)
                .values(&NewGroupMember {
                    group_id,
                    user_id: target_id,
                    can_edit: false,
                    status: MEMBER_PENDING.to_string(),
                })
                .get_result::<GroupMember>(&mut conn)
                .await?
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Invite sent successfully",
            "member": member
        })),
    ))
}

/// Accept a group invite
pub async fn accept_invite(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Path(group_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    transition_invite(&db_pool, group_id, auth.id, MEMBER_ACCEPTED).await?;
    Ok(Json(json!({ "message": "Group invite accepted" })))
}

/// Decline a group invite. The row is kept and marked declined rather than
/// deleted, unlike a declined friend request.
pub async fn decline_invite(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Path(group_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    transition_invite(&db_pool, group_id, auth.id, MEMBER_DECLINED).await?;
    Ok(Json(json!({ "message": "Group invite declined" })))
}

async fn transition_invite(
    db_pool: &DbPool,
    group_id: i32,
    user_id: i32,
    to_status: &str,
) -> Result<(), ApiError> {
    let mut conn = db_pool.get().await?;

    let updated = diesel::update(
        group_members::table
            .filter(group_members::group_id.eq(group_id))
            .filter(group_members::user_id.eq(user_id))
            .filter(group_members::status.eq(MEMBER_PENDING)),
    )
    .set(group_members::status.eq(to_status))
    .execute(&mut conn)
    .await?;

    if updated == 0 {
        return Err(ApiError::NotFound("Invite not found".to_string()));
    }

    Ok(())
}

/// Get all pending group invites for the caller
pub async fn get_invites(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    let invites: Vec<GroupInviteDetail> = group_members::table
        .inner_join(groups::table.on(groups::id.eq(group_members::group_id)))
        .inner_join(users::table.on(users::id.eq(groups::created_by)))
        .filter(group_members::user_id.eq(auth.id))
        .filter(group_members::status.eq(MEMBER_PENDING))
        .order_by(group_members::joined_at.desc())
        .select((
            group_members::id,
            group_members::group_id,
            groups::name,
            users::username,
            group_members::joined_at,
        ))
        .load(&mut conn)
        .await?;

    Ok(Json(json!({ "invites": invites })))
}

/// Remove a member from the group; creator only. The creator's own
/// membership row is not removable.
pub async fn remove_member(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Path((group_id, member_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    let group = policy::require_creator(&mut conn, group_id, auth.id).await?;

    let member = group_members::table
        .filter(group_members::id.eq(member_id))
        .filter(group_members::group_id.eq(group_id))
        .first::<GroupMember>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

    if member.user_id == group.created_by {
        return Err(ApiError::InvalidOperation(
            "The group creator cannot be removed".to_string(),
        ));
    }

    diesel::delete(group_members::table.filter(group_members::id.eq(member.id)))
        .execute(&mut conn)
        .await?;

    Ok(Json(json!({ "message": "Member removed successfully" })))
}

/// Toggle edit permission for a member; creator only. The creator's own
/// flag is not toggleable.
pub async fn update_member_permissions(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Path((group_id, member_id)): Path<(i32, i32)>,
    Json(payload): Json<PermissionsBody>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    let group = policy::require_creator(&mut conn, group_id, auth.id).await?;

    let can_edit = payload
        .can_edit
        .ok_or_else(|| ApiError::Validation("can_edit field is required".to_string()))?;

    let member = group_members::table
        .filter(group_members::id.eq(member_id))
        .filter(group_members::group_id.eq(group_id))
        .first::<GroupMember>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

    if member.user_id == group.created_by {
        return Err(ApiError::InvalidOperation(
            "The group creator's permissions cannot be changed".to_string(),
        ));
    }

    let member: GroupMember =
        diesel::update(group_members::table.filter(group_members::id.eq(member.id)))
            .set(group_members::can_edit.eq(can_edit))
            .get_result(&mut conn)
            .await?;

    Ok(Json(json!({
        "message": "Permissions updated successfully",
        "member": member
    })))
}

/// Add a restaurant to the group; requires accepted membership with edit
/// permission
pub async fn add_restaurant_to_group(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Path(group_id): Path<i32>,
    Json(payload): Json<GroupRestaurantBody>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    policy::require_member_can_edit(&mut conn, group_id, auth.id).await?;

    if payload.name.trim().is_empty()
        || payload.cuisine.trim().is_empty()
        || payload.location.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "Name, cuisine, and location are required".to_string(),
        ));
    }

    validate_rating(payload.rating)?;

    let restaurant: Restaurant = diesel::insert_into(restaurants::table)
        .values(&NewRestaurant {
            owner_id: auth.id,
            group_id: Some(group_id),
            name: payload.name,
            cuisine: payload.cuisine,
            location: payload.location,
            rating: payload.rating,
            is_wishlist: payload.is_wishlist,
            // Group rows are governed by membership, never hidden
            is_hidden: false,
        })
        .get_result(&mut conn)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Restaurant added to group",
            "restaurant": restaurant
        })),
    ))
}

/// Remove a restaurant from the group; requires accepted membership with
/// edit permission
pub async fn remove_restaurant_from_group(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Path((group_id, restaurant_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    policy::require_member_can_edit(&mut conn, group_id, auth.id).await?;

    let deleted = diesel::delete(
        restaurants::table
            .filter(restaurants::id.eq(restaurant_id))
            .filter(restaurants::group_id.eq(group_id)),
    )
    .execute(&mut conn)
    .await?;

    if deleted == 0 {
        return Err(ApiError::NotFound(
            "Restaurant not found in this group".to_string(),
        ));
    }

    Ok(Json(json!({ "message": "Restaurant removed from group" })))
}

/// Update the rating of a group restaurant. Any accepted member may rate;
/// edit permission is only required to add or remove.
pub async fn update_group_restaurant_rating(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Path((group_id, restaurant_id)): Path<(i32, i32)>,
    Json(payload): Json<RatingBody>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    policy::require_accepted_member(&mut conn, group_id, auth.id).await?;

    let rating = payload
        .rating
        .ok_or_else(|| ApiError::Validation("Rating must be between 0 and 5".to_string()))?;
    validate_rating(rating)?;

    let restaurant = diesel::update(
        restaurants::table
            .filter(restaurants::id.eq(restaurant_id))
            .filter(restaurants::group_id.eq(group_id)),
    )
    .set(restaurants::rating.eq(rating))
    .get_result::<Restaurant>(&mut conn)
    .await
    .optional()?
    .ok_or_else(|| ApiError::NotFound("Restaurant not found in this group".to_string()))?;

    Ok(Json(json!({
        "message": "Rating updated successfully",
        "restaurant": restaurant
    })))
}
