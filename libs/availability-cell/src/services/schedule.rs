use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::models::{DoctorId, EntryStatus, Schedule};
use crate::services::cache::{AvailabilityCache, Generation};
use crate::services::retry::RetryPolicy;
use crate::services::source::AvailabilitySource;

/// Two-phase loader: a doctor's schedule list, then the slots of each schedule.
pub struct ScheduleEnricher {
    source: Arc<dyn AvailabilitySource>,
    cache: AvailabilityCache,
    retry: RetryPolicy,
}

impl ScheduleEnricher {
    pub fn new(source: Arc<dyn AvailabilitySource>, cache: AvailabilityCache, retry: RetryPolicy) -> Self {
        Self { source, cache, retry }
    }

    #[instrument(skip(self))]
    pub async fn preload_schedules(&self, doctor_ids: &[DoctorId]) {
        let claim = self.cache.write().await.claim_doctors(doctor_ids);
        if claim.is_empty() {
            debug!("All requested doctors are cached or already loading");
            return;
        }

        info!("Fetching schedules for {} doctor(s)", claim.keys.len());
        join_all(
            claim
                .keys
                .iter()
                .map(|doctor_id| self.load_doctor(doctor_id, claim.generation)),
        )
        .await;

        self.cache.write().await.release_doctors(&claim);
    }

    async fn load_doctor(&self, doctor_id: &DoctorId, generation: Generation) {
        let operation = format!("schedules for doctor {}", doctor_id);
        let fetched = self
            .retry
            .run(&operation, || self.source.doctor_schedules(doctor_id))
            .await;

        let (schedules, status) = match fetched {
            Ok(raw) => {
                let schedules = join_all(
                    raw.into_iter()
                        .map(|schedule| self.attach_slots(Schedule::from_raw(schedule, doctor_id))),
                )
                .await;
                debug!("Doctor {} has {} schedule(s)", doctor_id, schedules.len());
                (schedules, EntryStatus::Ready)
            }
            Err(e) => {
                warn!("Giving up on {}: {}", operation, e);
                (Vec::new(), EntryStatus::failed(&e))
            }
        };

        let committed = self
            .cache
            .write()
            .await
            .commit_schedules(doctor_id, generation, schedules, status);
        if !committed {
            warn!("Dropping superseded schedule list for doctor {}", doctor_id);
        }
    }

    /// A failed slot fetch only empties this schedule's slots.
    async fn attach_slots(&self, mut schedule: Schedule) -> Schedule {
        let window = schedule.window();
        let operation = format!("slots for schedule {}", schedule.schedule_id);

        match self.retry.run(&operation, || self.source.schedule_slots(&window)).await {
            Ok(slots) => {
                schedule.slots = slots;
                schedule.slot_status = EntryStatus::Ready;
            }
            Err(e) => {
                warn!("Giving up on {}: {}", operation, e);
                schedule.slots = Vec::new();
                schedule.slot_status = EntryStatus::failed(&e);
            }
        }
        schedule
    }
}
