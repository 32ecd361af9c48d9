// Copyright (c) Plateful Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::schema::restaurants;

pub const MIN_RATING: i32 = 0;
pub const MAX_RATING: i32 = 5;

/// Model for a restaurant record. `group_id` null means a personal
/// restaurant; non-null puts it under group visibility rules.
#[derive(Debug, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = restaurants)]
pub struct Restaurant {
    pub id: i32,
    pub owner_id: i32,
    pub group_id: Option<i32>,
    pub name: String,
    pub cuisine: String,
    pub location: String,
    pub rating: i32,
    pub is_wishlist: bool,
    pub is_hidden: bool,
    pub created_at: NaiveDateTime,
}

/// DTO for creating a new restaurant
#[derive(Debug, Insertable)]
#[diesel(table_name = restaurants)]
pub struct NewRestaurant {
    pub owner_id: i32,
    pub group_id: Option<i32>,
    pub name: String,
    pub cuisine: String,
    pub location: String,
    pub rating: i32,
    pub is_wishlist: bool,
    pub is_hidden: bool,
}

/// DTO for a partial owner update; absent fields are left untouched
#[derive(Debug, Default, AsChangeset, Deserialize)]
#[diesel(table_name = restaurants)]
pub struct UpdateRestaurant {
    pub name: Option<String>,
    pub cuisine: Option<String>,
    pub location: Option<String>,
    pub rating: Option<i32>,
    pub is_wishlist: Option<bool>,
    pub is_hidden: Option<bool>,
}

impl UpdateRestaurant {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cuisine.is_none()
            && self.location.is_none()
            && self.rating.is_none()
            && self.is_wishlist.is_none()
            && self.is_hidden.is_none()
    }
}

/// DTO for a restaurant annotated with its owner's username
#[derive(Debug, Serialize, Deserialize)]
pub struct RestaurantWithOwner {
    pub id: i32,
    pub owner_id: i32,
    pub group_id: Option<i32>,
    pub name: String,
    pub cuisine: String,
    pub location: String,
    pub rating: i32,
    pub is_wishlist: bool,
    pub is_hidden: bool,
    pub created_at: NaiveDateTime,
    pub owner_username: String,
}

impl RestaurantWithOwner {
    pub fn new(restaurant: Restaurant, owner_username: String) -> Self {
        RestaurantWithOwner {
            id: restaurant.id,
            owner_id: restaurant.owner_id,
            group_id: restaurant.group_id,
            name: restaurant.name,
            cuisine: restaurant.cuisine,
            location: restaurant.location,
            rating: restaurant.rating,
            is_wishlist: restaurant.is_wishlist,
            is_hidden: restaurant.is_hidden,
            created_at: restaurant.created_at,
            owner_username,
        }
    }
}

/// Check the rating bound shared by create, update and group rating.
pub fn validate_rating(rating: i32) -> Result<(), ApiError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ApiError::Validation(
            "Rating must be between 0 and 5".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        assert!(validate_rating(0).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(matches!(validate_rating(-1), Err(ApiError::Validation(_))));
        assert!(matches!(validate_rating(6), Err(ApiError::Validation(_))));
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(UpdateRestaurant::default().is_empty());
        let patch = UpdateRestaurant {
            rating: Some(3),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
