use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use shared_config::AppConfig;

use crate::error::AvailabilityError;
use crate::locale::Locale;
use crate::models::{
    DateOption, DepartmentId, Doctor, DoctorId, EntryStatus, LoadingIds, Schedule, ScheduleId, TimeSlot,
};
use crate::services::{
    cache::{AvailabilityCache, CacheKind},
    dates::DateAggregator,
    doctor::DoctorEnricher,
    retry::RetryPolicy,
    schedule::ScheduleEnricher,
    slots::SlotProjector,
    source::{AvailabilitySource, HospitalApiSource},
};

/// Owns one availability cache and every operation that reads or fills it.
///
/// Share it by `Arc`; all methods take `&self`.
pub struct AvailabilityService {
    cache: AvailabilityCache,
    doctors: DoctorEnricher,
    schedules: ScheduleEnricher,
    dates: DateAggregator,
    slots: SlotProjector,
    default_window_days: u32,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig, source: Arc<dyn AvailabilitySource>) -> Self {
        let cache = AvailabilityCache::new();
        let retry = RetryPolicy::from_config(config);
        let locale = Locale::from_tag(&config.display_locale);

        debug!(
            "Creating availability service (locale {:?}, {} attempt(s) per fetch)",
            locale, retry.max_attempts
        );

        Self {
            doctors: DoctorEnricher::new(source.clone(), cache.clone(), retry.clone(), locale),
            schedules: ScheduleEnricher::new(source, cache.clone(), retry),
            dates: DateAggregator::new(cache.clone(), locale),
            slots: SlotProjector::new(cache.clone(), config.slot_display_price.clone()),
            default_window_days: config.availability_window_days,
            cache,
        }
    }

    /// Service backed by the hospital REST API.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let source = HospitalApiSource::new(config)?;
        Ok(Self::new(config, Arc::new(source)))
    }

    pub fn cache(&self) -> &AvailabilityCache {
        &self.cache
    }

    pub fn default_window_days(&self) -> u32 {
        self.default_window_days
    }

    // ==============================================================================
    // PRELOAD OPERATIONS
    // ==============================================================================

    pub async fn preload_doctors_for_departments(&self, department_ids: &[DepartmentId]) {
        self.doctors.preload_doctors(department_ids).await;
    }

    pub async fn preload_schedules_for_doctors(&self, doctor_ids: &[DoctorId]) {
        self.schedules.preload_schedules(doctor_ids).await;
    }

    pub async fn preload_dates_for_doctors(&self, doctor_ids: &[DoctorId], window_days: u32) {
        self.dates.build_for_doctors(doctor_ids, window_days).await;
    }

    pub async fn build_date_options(&self, doctor_id: &DoctorId, window_days: u32) -> Vec<DateOption> {
        self.dates.build_date_options(doctor_id, window_days).await
    }

    pub async fn preload_time_slots_for_schedules(&self, schedule_ids: &[ScheduleId]) {
        self.slots.project_slots(schedule_ids).await;
    }

    // ==============================================================================
    // READ ACCESSORS
    // ==============================================================================

    pub async fn doctors_by_department(&self) -> HashMap<DepartmentId, Vec<Doctor>> {
        self.cache.doctors_by_department().await
    }

    pub async fn schedules_by_doctor(&self) -> HashMap<DoctorId, Vec<Schedule>> {
        self.cache.schedules_by_doctor().await
    }

    pub async fn dates_by_doctor(&self) -> HashMap<DoctorId, Vec<DateOption>> {
        self.cache.dates_by_doctor().await
    }

    pub async fn time_slots_by_schedule(&self) -> HashMap<ScheduleId, Vec<TimeSlot>> {
        self.cache.time_slots_by_schedule().await
    }

    pub async fn doctors(&self, department_id: &str) -> Option<Vec<Doctor>> {
        self.cache.doctors(department_id).await
    }

    pub async fn schedules(&self, doctor_id: &str) -> Option<Vec<Schedule>> {
        self.cache.schedules(doctor_id).await
    }

    pub async fn dates(&self, doctor_id: &str) -> Option<Vec<DateOption>> {
        self.cache.dates(doctor_id).await
    }

    pub async fn time_slots(&self, schedule_id: ScheduleId) -> Option<Vec<TimeSlot>> {
        self.cache.time_slots(schedule_id).await
    }

    pub async fn loading_department_ids(&self) -> Vec<DepartmentId> {
        self.cache.loading_ids().await.department_ids
    }

    pub async fn loading_doctor_ids(&self) -> Vec<DoctorId> {
        self.cache.loading_ids().await.doctor_ids
    }

    pub async fn loading_ids(&self) -> LoadingIds {
        self.cache.loading_ids().await
    }

    pub async fn status(&self, kind: CacheKind, key: &str) -> Option<EntryStatus> {
        self.cache.status(kind, key).await
    }

    // ==============================================================================
    // LIFECYCLE
    // ==============================================================================

    pub async fn clear(&self) {
        self.cache.clear().await;
    }

    pub async fn dispose(&self) {
        self.cache.dispose().await;
        info!("Availability service disposed");
    }

    pub async fn is_disposed(&self) -> bool {
        self.cache.is_disposed().await
    }

    pub async fn ensure_active(&self) -> Result<(), AvailabilityError> {
        if self.is_disposed().await {
            return Err(AvailabilityError::Disposed);
        }
        Ok(())
    }
}
