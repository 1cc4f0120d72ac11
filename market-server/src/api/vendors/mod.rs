//! Vendor API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/vendors", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        // Profile routes must be before /{id} to avoid path conflicts
        .route(
            "/profile",
            get(handler::get_profile)
                .post(handler::create_profile)
                .put(handler::update_profile),
        )
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/riders", get(handler::list_riders))
        .route(
            "/{id}/riders/{rider_id}",
            post(handler::assign_rider).delete(handler::unassign_rider),
        )
        .route("/{id}/analytics", get(handler::analytics))
}
