use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{DepartmentId, DoctorId, ScheduleId};
use crate::services::{AvailabilityService, CacheKind};

/// Longest date window a caller may ask for.
pub const MAX_WINDOW_DAYS: u32 = 60;

#[derive(Debug, Deserialize)]
pub struct PreloadRequest<T> {
    pub ids: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct DatesPreloadRequest {
    pub ids: Vec<DoctorId>,
    pub window_days: Option<u32>,
}

fn require_ids<T>(ids: &[T]) -> Result<(), AppError> {
    if ids.is_empty() {
        return Err(AppError::BadRequest("ids must not be empty".to_string()));
    }
    Ok(())
}

/// Trims, drops blanks and dedupes, matching the keys the cache stores under.
fn normalize_ids(ids: &[String]) -> Result<Vec<String>, AppError> {
    let mut seen = HashSet::new();
    let ids: Vec<String> = ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty() && seen.insert(*id))
        .map(str::to_string)
        .collect();
    require_ids(&ids)?;
    Ok(ids)
}

// ==============================================================================
// DOCTORS
// ==============================================================================

#[axum::debug_handler]
pub async fn preload_department_doctors(
    State(service): State<Arc<AvailabilityService>>,
    Json(request): Json<PreloadRequest<DepartmentId>>,
) -> Result<Json<Value>, AppError> {
    service.ensure_active().await?;
    let department_ids = normalize_ids(&request.ids)?;

    service.preload_doctors_for_departments(&department_ids).await;

    let mut departments = Vec::with_capacity(department_ids.len());
    for department_id in &department_ids {
        departments.push(json!({
            "department_id": department_id,
            "status": service.status(CacheKind::DoctorsByDepartment, department_id).await,
            "doctors": service.doctors(department_id).await.unwrap_or_default(),
        }));
    }

    Ok(Json(json!({ "departments": departments })))
}

#[axum::debug_handler]
pub async fn get_department_doctors(
    State(service): State<Arc<AvailabilityService>>,
    Path(department_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctors = service
        .doctors(&department_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No doctors cached for department {}", department_id)))?;

    Ok(Json(json!({
        "department_id": department_id,
        "status": service.status(CacheKind::DoctorsByDepartment, &department_id).await,
        "doctors": doctors,
        "total": doctors.len(),
    })))
}

// ==============================================================================
// SCHEDULES
// ==============================================================================

#[axum::debug_handler]
pub async fn preload_doctor_schedules(
    State(service): State<Arc<AvailabilityService>>,
    Json(request): Json<PreloadRequest<DoctorId>>,
) -> Result<Json<Value>, AppError> {
    service.ensure_active().await?;
    let doctor_ids = normalize_ids(&request.ids)?;

    service.preload_schedules_for_doctors(&doctor_ids).await;

    let mut doctors = Vec::with_capacity(doctor_ids.len());
    for doctor_id in &doctor_ids {
        doctors.push(json!({
            "doctor_id": doctor_id,
            "status": service.status(CacheKind::SchedulesByDoctor, doctor_id).await,
            "schedules": service.schedules(doctor_id).await.unwrap_or_default(),
        }));
    }

    Ok(Json(json!({ "doctors": doctors })))
}

#[axum::debug_handler]
pub async fn get_doctor_schedules(
    State(service): State<Arc<AvailabilityService>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let schedules = service
        .schedules(&doctor_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No schedules cached for doctor {}", doctor_id)))?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "status": service.status(CacheKind::SchedulesByDoctor, &doctor_id).await,
        "schedules": schedules,
    })))
}

// ==============================================================================
// DATES
// ==============================================================================

#[axum::debug_handler]
pub async fn preload_doctor_dates(
    State(service): State<Arc<AvailabilityService>>,
    Json(request): Json<DatesPreloadRequest>,
) -> Result<Json<Value>, AppError> {
    service.ensure_active().await?;
    let doctor_ids = normalize_ids(&request.ids)?;

    let window_days = request.window_days.unwrap_or_else(|| service.default_window_days());
    if window_days == 0 || window_days > MAX_WINDOW_DAYS {
        return Err(AppError::BadRequest(format!(
            "window_days must be between 1 and {}",
            MAX_WINDOW_DAYS
        )));
    }

    service.preload_dates_for_doctors(&doctor_ids, window_days).await;

    let mut doctors = Vec::with_capacity(doctor_ids.len());
    for doctor_id in &doctor_ids {
        doctors.push(json!({
            "doctor_id": doctor_id,
            "dates": service.dates(doctor_id).await.unwrap_or_default(),
        }));
    }

    Ok(Json(json!({ "window_days": window_days, "doctors": doctors })))
}

#[axum::debug_handler]
pub async fn get_doctor_dates(
    State(service): State<Arc<AvailabilityService>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let dates = service
        .dates(&doctor_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No dates built for doctor {}", doctor_id)))?;

    Ok(Json(json!({ "doctor_id": doctor_id, "dates": dates })))
}

// ==============================================================================
// TIME SLOTS
// ==============================================================================

#[axum::debug_handler]
pub async fn preload_schedule_slots(
    State(service): State<Arc<AvailabilityService>>,
    Json(request): Json<PreloadRequest<ScheduleId>>,
) -> Result<Json<Value>, AppError> {
    service.ensure_active().await?;
    require_ids(&request.ids)?;

    service.preload_time_slots_for_schedules(&request.ids).await;

    let mut schedules = Vec::with_capacity(request.ids.len());
    for schedule_id in &request.ids {
        schedules.push(json!({
            "schedule_id": schedule_id,
            "status": service.status(CacheKind::TimeSlotsBySchedule, &schedule_id.to_string()).await,
            "slots": service.time_slots(*schedule_id).await.unwrap_or_default(),
        }));
    }

    Ok(Json(json!({ "schedules": schedules })))
}

#[axum::debug_handler]
pub async fn get_schedule_slots(
    State(service): State<Arc<AvailabilityService>>,
    Path(schedule_id): Path<ScheduleId>,
) -> Result<Json<Value>, AppError> {
    let slots = service
        .time_slots(schedule_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No slots projected for schedule {}", schedule_id)))?;

    Ok(Json(json!({
        "schedule_id": schedule_id,
        "status": service.status(CacheKind::TimeSlotsBySchedule, &schedule_id.to_string()).await,
        "slots": slots,
    })))
}

// ==============================================================================
// CACHE
// ==============================================================================

#[axum::debug_handler]
pub async fn get_loading_ids(
    State(service): State<Arc<AvailabilityService>>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(json!(service.loading_ids().await)))
}

#[axum::debug_handler]
pub async fn clear_cache(
    State(service): State<Arc<AvailabilityService>>,
) -> Result<Json<Value>, AppError> {
    service.ensure_active().await?;
    service.clear().await;
    Ok(Json(json!({ "cleared": true })))
}
