// Copyright (c) Plateful Team
// SPDX-License-Identifier: Apache-2.0

// Import diesel table macros
use diesel::{allow_tables_to_appear_in_same_query, joinable, table};

// Define users table
table! {
    users (id) {
        id -> Integer,
        username -> Varchar,
        email -> Varchar,
        password_hash -> Varchar,
        created_at -> Timestamp,
    }
}

// Directed friendship edges; an accepted friendship has one row per direction
table! {
    friendships (id) {
        id -> Integer,
        user_id -> Integer,
        friend_id -> Integer,
        status -> Varchar,
        created_at -> Timestamp,
    }
}

// Define groups table
table! {
    groups (id) {
        id -> Integer,
        name -> Varchar,
        created_by -> Integer,
        created_at -> Timestamp,
    }
}

// One membership row per (group, user)
table! {
    group_members (id) {
        id -> Integer,
        group_id -> Integer,
        user_id -> Integer,
        can_edit -> Bool,
        status -> Varchar,
        joined_at -> Timestamp,
    }
}

table! {
    restaurants (id) {
        id -> Integer,
        owner_id -> Integer,
        group_id -> Nullable<Integer>,
        name -> Varchar,
        cuisine -> Varchar,
        location -> Varchar,
        rating -> Integer,
        is_wishlist -> Bool,
        is_hidden -> Bool,
        created_at -> Timestamp,
    }
}

joinable!(group_members -> groups (group_id));
joinable!(group_members -> users (user_id));
joinable!(groups -> users (created_by));
joinable!(restaurants -> groups (group_id));
joinable!(restaurants -> users (owner_id));

// Allow joining the tables if needed
allow_tables_to_appear_in_same_query!(
    users,
    friendships,
    groups,
    group_members,
    restaurants,
);
