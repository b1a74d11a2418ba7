use std::collections::HashSet;

use chrono::{Local, NaiveDateTime};
use tracing::{debug, instrument};

use crate::models::{EntryStatus, Schedule, ScheduleId, TimeSlot};
use crate::services::cache::AvailabilityCache;

pub struct SlotProjector {
    cache: AvailabilityCache,
    display_price: String,
}

impl SlotProjector {
    pub fn new(cache: AvailabilityCache, display_price: String) -> Self {
        Self { cache, display_price }
    }

    /// Projects each schedule's raw slots into display slots. Ids that already
    /// have a slot list only get `is_past` refreshed.
    #[instrument(skip(self))]
    pub async fn project_slots(&self, schedule_ids: &[ScheduleId]) {
        let now = Local::now().naive_local();
        let mut cache = self.cache.write().await;
        let mut seen = HashSet::new();

        for &schedule_id in schedule_ids.iter().filter(|id| seen.insert(**id)) {
            if cache.refresh_time_slots(schedule_id, now) {
                continue;
            }

            // A schedule whose slot fetch failed projects to an empty list that keeps the failure.
            let projected = cache.find_schedule(schedule_id).map(|schedule| {
                (
                    project_schedule(schedule, now, &self.display_price),
                    schedule.slot_status.clone(),
                )
            });

            match projected {
                Some((slots, status)) => {
                    debug!("Projected {} slot(s) for schedule {}", slots.len(), schedule_id);
                    cache.store_time_slots(schedule_id, slots, status);
                }
                None => {
                    debug!("Schedule {} is not cached under any doctor", schedule_id);
                    cache.store_time_slots(schedule_id, Vec::new(), EntryStatus::Unresolved);
                }
            }
        }
    }
}

pub fn project_schedule(schedule: &Schedule, now: NaiveDateTime, price: &str) -> Vec<TimeSlot> {
    schedule
        .slots
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            let starts_at = schedule.work_date.and_time(slot.slot_start);
            TimeSlot {
                id: format!("{}-{}", schedule.schedule_id, index),
                time: format!("{} - {}", slot.slot_start.format("%H:%M"), slot.slot_end.format("%H:%M")),
                available: slot.available,
                price: price.to_string(),
                starts_at,
                is_past: starts_at < now,
                is_booked: !slot.available,
            }
        })
        .collect()
}
