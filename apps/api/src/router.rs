use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use availability_cell::router::availability_routes;
use availability_cell::AvailabilityService;

pub fn create_router(service: Arc<AvailabilityService>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic availability API is running!" }))
        .nest("/availability", availability_routes(service))
}
