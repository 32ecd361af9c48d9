// Copyright (c) Plateful Team
// SPDX-License-Identifier: Apache-2.0

pub mod handlers;

use crate::config::Config;
use crate::db::{Database, DbPool};
use anyhow::Result;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the application router over a connection pool.
pub fn router(pool: DbPool) -> Router {
    Router::new()
        // General routes
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        // Auth routes
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/me", get(handlers::auth::me))
        // Friend routes
        .route("/api/friends", get(handlers::friends::get_friends))
        .route("/api/friends/search", get(handlers::friends::search_users))
        .route(
            "/api/friends/requests",
            get(handlers::friends::get_pending_requests),
        )
        .route(
            "/api/friends/request",
            post(handlers::friends::send_friend_request),
        )
        .route(
            "/api/friends/accept/:id",
            put(handlers::friends::accept_friend_request),
        )
        .route(
            "/api/friends/decline/:id",
            axum::routing::delete(handlers::friends::decline_friend_request),
        )
        .route(
            "/api/friends/:id",
            axum::routing::delete(handlers::friends::unfriend_user),
        )
        // Group routes
        .route(
            "/api/groups",
            get(handlers::groups::get_groups).post(handlers::groups::create_group),
        )
        .route("/api/groups/invites", get(handlers::groups::get_invites))
        .route(
            "/api/groups/:id",
            get(handlers::groups::get_group)
                .put(handlers::groups::update_group)
                .delete(handlers::groups::delete_group),
        )
        .route("/api/groups/:id/members", post(handlers::groups::add_member))
        .route(
            "/api/groups/:id/members/accept",
            put(handlers::groups::accept_invite),
        )
        .route(
            "/api/groups/:id/members/decline",
            put(handlers::groups::decline_invite),
        )
        .route(
            "/api/groups/:id/members/:member_id",
            put(handlers::groups::update_member_permissions)
                .delete(handlers::groups::remove_member),
        )
        .route(
            "/api/groups/:id/restaurants",
            post(handlers::groups::add_restaurant_to_group),
        )
        .route(
            "/api/groups/:id/restaurants/:restaurant_id",
            put(handlers::groups::update_group_restaurant_rating)
                .delete(handlers::groups::remove_restaurant_from_group),
        )
        // Restaurant routes
        .route(
            "/api/restaurants",
            get(handlers::restaurants::get_restaurants)
                .post(handlers::restaurants::create_restaurant),
        )
        .route(
            "/api/restaurants/friends",
            get(handlers::restaurants::get_friends_restaurants),
        )
        .route(
            "/api/restaurants/:id",
            get(handlers::restaurants::get_restaurant)
                .put(handlers::restaurants::update_restaurant)
                .delete(handlers::restaurants::delete_restaurant),
        )
        // Places search proxy
        .route("/api/places/search", get(handlers::places::search_places))
        .with_state(pool)
}

/// Start the API server
pub async fn start_api_server(db: Arc<Database>) -> Result<()> {
    let config = Config::get();

    // Set up CORS
    let cors = if config.api.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::permissive()
    };

    let app = router(db.get_pool().clone())
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = format!("{}:{}", config.api.host, config.api.port).parse::<SocketAddr>()?;

    info!("Starting API server on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use diesel_async::pooled_connection::AsyncDieselConnectionManager;
    use diesel_async::AsyncPgConnection;
    use tower::ServiceExt;

    // Pool pointed at a closed port; connections are only attempted lazily,
    // so routes that never touch the database stay testable.
    fn test_pool() -> DbPool {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(
            "postgres://postgres@127.0.0.1:1/plateful_test",
        );
        DbPool::builder(manager).max_size(1).build().unwrap()
    }

    #[tokio::test]
    async fn root_returns_banner() {
        let app = router(test_pool());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let _ = Config::init();
        let app = router(test_pool());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/friends")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_routes_are_404() {
        let app = router(test_pool());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/unknown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test_log::test(tokio::test)]
    async fn health_reports_unhealthy_without_a_database() {
        let app = router(test_pool());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
