// Copyright (c) Plateful Team
// SPDX-License-Identifier: Apache-2.0

use axum::{extract::Query, response::IntoResponse, Json};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;

// Restaurant category in the Foursquare taxonomy
const FOOD_CATEGORY: &str = "13000";

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

#[derive(Debug, Deserialize)]
pub struct PlacesQuery {
    pub query: Option<String>,
    pub location: Option<String>,
}

/// Search for restaurants through the places API. Used to pre-fill the
/// creation form; the results carry no authority over core records.
pub async fn search_places(
    _auth: AuthUser,
    Query(params): Query<PlacesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.query.unwrap_or_default();
    let query = query.trim();

    if query.is_empty() {
        return Err(ApiError::Validation(
            "Query parameter is required".to_string(),
        ));
    }

    let location = params
        .location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| "United States".to_string());

    let config = Config::get();

    debug!("Places search: query={}, near={}", query, location);

    let response = HTTP_CLIENT
        .get(&config.places.base_url)
        .query(&[
            ("query", query),
            ("near", location.as_str()),
            ("categories", FOOD_CATEGORY),
        ])
        .header(
            "Authorization",
            format!("Bearer {}", config.places.api_key),
        )
        .header("Accept", "application/json")
        .header("X-Places-Api-Version", &config.places.api_version)
        .send()
        .await?
        .error_for_status()?;

    let body: serde_json::Value = response.json().await?;
    let results = body.get("results").cloned().unwrap_or_else(|| json!([]));

    Ok(Json(json!({ "results": results })))
}
