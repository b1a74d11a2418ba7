use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::handlers;
use crate::services::AvailabilityService;

pub fn availability_routes(service: Arc<AvailabilityService>) -> Router {
    Router::new()
        .route("/departments/doctors", post(handlers::preload_department_doctors))
        .route("/departments/{department_id}/doctors", get(handlers::get_department_doctors))
        .route("/doctors/schedules", post(handlers::preload_doctor_schedules))
        .route("/doctors/{doctor_id}/schedules", get(handlers::get_doctor_schedules))
        .route("/doctors/dates", post(handlers::preload_doctor_dates))
        .route("/doctors/{doctor_id}/dates", get(handlers::get_doctor_dates))
        .route("/schedules/slots", post(handlers::preload_schedule_slots))
        .route("/schedules/{schedule_id}/slots", get(handlers::get_schedule_slots))
        .route("/loading", get(handlers::get_loading_ids))
        .route("/cache", delete(handlers::clear_cache))
        .with_state(service)
}
