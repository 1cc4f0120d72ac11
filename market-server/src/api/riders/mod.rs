//! Rider API 模块

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/riders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        // Self-service routes must be before /{id} to avoid path conflicts
        .route(
            "/profile",
            get(handler::get_profile)
                .post(handler::create_profile)
                .put(handler::update_profile),
        )
        .route("/availability", put(handler::set_availability))
        .route("/location", put(handler::update_location))
        .route("/deliveries", get(handler::list_deliveries))
        .route("/analytics", get(handler::analytics))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/verify", put(handler::verify))
}
