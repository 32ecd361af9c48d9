pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod policy;
pub mod schema;

#[macro_use]
extern crate diesel;
