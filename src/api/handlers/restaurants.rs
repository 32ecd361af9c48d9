// Copyright (c) Plateful Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::friendship::STATUS_ACCEPTED;
use crate::models::restaurant::validate_rating;
use crate::models::{NewRestaurant, Restaurant, RestaurantWithOwner, UpdateRestaurant};
use crate::policy;
use crate::schema::{friendships, restaurants, users};

#[derive(Debug, Deserialize)]
pub struct CreateRestaurantBody {
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
    #[serde(default)]
    pub is_hidden: bool,
    pub group_id: Option<i32>,
}

/// Get all restaurants owned by the caller. Hidden rows are the owner's to
/// see; the hidden flag only affects friend visibility.
pub async fn get_restaurants(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    let owned: Vec<Restaurant> = restaurants::table
        .filter(restaurants::owner_id.eq(auth.id))
        .order_by(restaurants::created_at.desc())
        .load(&mut conn)
        .await?;

    Ok(Json(json!({ "restaurants": owned })))
}

/// Get a single restaurant, subject to visibility rules: the owner always,
/// accepted group members for group rows, accepted friends for non-hidden
/// personal rows.
pub async fn get_restaurant(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Path(restaurant_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    let restaurant = restaurants::table
        .filter(restaurants::id.eq(restaurant_id))
        .first::<Restaurant>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Restaurant not found".to_string()))?;

    let is_member = match restaurant.group_id {
        Some(group_id) if restaurant.owner_id != auth.id => {
            policy::is_accepted_member(&mut conn, group_id, auth.id).await?
        }
        _ => false,
    };

    let is_friend = if restaurant.group_id.is_none() && restaurant.owner_id != auth.id {
        policy::is_accepted_friend(&mut conn, auth.id, restaurant.owner_id).await?
    } else {
        false
    };

    if !policy::can_view_restaurant(&restaurant, auth.id, is_friend, is_member) {
        return Err(ApiError::Forbidden("Access denied".to_string()));
    }

    Ok(Json(json!({ "restaurant": restaurant })))
}

/// Create a new restaurant. A `group_id` makes it a group restaurant, which
/// requires accepted membership with edit permission in that group.
pub async fn create_restaurant(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Json(payload): Json<CreateRestaurantBody>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.name.trim().is_empty()
        || payload.cuisine.trim().is_empty()
        || payload.location.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "Please provide name, cuisine, and location".to_string(),
        ));
    }

    validate_rating(payload.rating)?;

    let mut conn = db_pool.get().await?;

    if let Some(group_id) = payload.group_id {
        policy::require_member_can_edit(&mut conn, group_id, auth.id).await?;
    }

    // The hidden flag only applies to personal rows
    let is_hidden = payload.group_id.is_none() && payload.is_hidden;

    let restaurant: Restaurant = diesel::insert_into(restaurants::table)
        .values(&NewRestaurant {
            owner_id: auth.id,
            group_id: payload.group_id,
            name: payload.name,
            cuisine: payload.cuisine,
            location: payload.location,
            rating: payload.rating,
            is_wishlist: payload.is_wishlist,
            is_hidden,
        })
        .get_result(&mut conn)
        .await?;

    debug!("Restaurant {} created by {}", restaurant.id, auth.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Restaurant created successfully",
            "restaurant": restaurant
        })),
    ))
}

/// Update a restaurant; owner only. Rating changes are re-validated against
/// the 0..5 bound.
pub async fn update_restaurant(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Path(restaurant_id): Path<i32>,
    Json(patch): Json<UpdateRestaurant>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    let restaurant = restaurants::table
        .filter(restaurants::id.eq(restaurant_id))
        .first::<Restaurant>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Restaurant not found".to_string()))?;

    if !policy::is_owner(&restaurant, auth.id) {
        return Err(ApiError::Forbidden(
            "You can only update your own restaurants".to_string(),
        ));
    }

    if patch.is_empty() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }

    if let Some(rating) = patch.rating {
        validate_rating(rating)?;
    }

    let restaurant: Restaurant =
        diesel::update(restaurants::table.filter(restaurants::id.eq(restaurant_id)))
            .set(&patch)
            .get_result(&mut conn)
            .await?;

    Ok(Json(json!({
        "message": "Restaurant updated successfully",
        "restaurant": restaurant
    })))
}

/// Delete a restaurant. Personal rows are owner-only; group rows require
/// accepted membership with edit permission, group rules superseding
/// personal ownership.
pub async fn delete_restaurant(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
    Path(restaurant_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    let restaurant = restaurants::table
        .filter(restaurants::id.eq(restaurant_id))
        .first::<Restaurant>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Restaurant not found".to_string()))?;

    match restaurant.group_id {
        Some(group_id) => {
            policy::require_member_can_edit(&mut conn, group_id, auth.id).await?;
        }
        None => {
            if !policy::is_owner(&restaurant, auth.id) {
                return Err(ApiError::Forbidden(
                    "You can only delete your own restaurants".to_string(),
                ));
            }
        }
    }

    diesel::delete(restaurants::table.filter(restaurants::id.eq(restaurant_id)))
        .execute(&mut conn)
        .await?;

    Ok(Json(json!({ "message": "Restaurant deleted successfully" })))
}

/// Get friends' restaurants: non-hidden personal rows owned by any accepted
/// friend, annotated with the owner's username. Group rows are excluded;
/// group visibility supersedes friend visibility.
pub async fn get_friends_restaurants(
    State(db_pool): State<DbPool>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = db_pool.get().await?;

    let friend_ids: Vec<i32> = friendships::table
        .filter(friendships::user_id.eq(auth.id))
        .filter(friendships::status.eq(STATUS_ACCEPTED))
        .select(friendships::friend_id)
        .load(&mut conn)
        .await?;

    if friend_ids.is_empty() {
        return Ok(Json(json!({ "restaurants": [] })));
    }

    let rows: Vec<(Restaurant, String)> = restaurants::table
        .inner_join(users::table.on(users::id.eq(restaurants::owner_id)))
        .filter(restaurants::owner_id.eq_any(&friend_ids))
        .filter(restaurants::is_hidden.eq(false))
        .filter(restaurants::group_id.is_null())
        .order_by(restaurants::created_at.desc())
        .select((Restaurant::as_select(), users::username))
        .load(&mut conn)
        .await?;

    let feed: Vec<RestaurantWithOwner> = rows
        .into_iter()
        .map(|(restaurant, owner_username)| RestaurantWithOwner::new(restaurant, owner_username))
        .collect();

    Ok(Json(json!({ "restaurants": feed })))
}
