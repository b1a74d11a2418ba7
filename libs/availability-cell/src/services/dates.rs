use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, Local, NaiveDate, Weekday};
use tracing::{debug, instrument};

use crate::locale::Locale;
use crate::models::{DateOption, DoctorId, Schedule};
use crate::services::cache::AvailabilityCache;

/// Builds the per-doctor date picker from schedules that are already cached.
pub struct DateAggregator {
    cache: AvailabilityCache,
    locale: Locale,
}

impl DateAggregator {
    pub fn new(cache: AvailabilityCache, locale: Locale) -> Self {
        Self { cache, locale }
    }

    /// Never fetches. Recomputed on every call because "today" moves.
    #[instrument(skip(self))]
    pub async fn build_date_options(&self, doctor_id: &DoctorId, window_days: u32) -> Vec<DateOption> {
        let today = Local::now().date_naive();
        let mut cache = self.cache.write().await;

        let dates = aggregate_dates(cache.schedules_for(doctor_id), today, window_days, self.locale);
        cache.store_dates(doctor_id, dates.clone());

        debug!(
            "Built {} date option(s) for doctor {} starting {}",
            dates.len(),
            doctor_id,
            today
        );
        dates
    }

    pub async fn build_for_doctors(&self, doctor_ids: &[DoctorId], window_days: u32) {
        let mut seen = HashSet::new();
        for doctor_id in doctor_ids.iter().filter(|id| seen.insert(id.as_str())) {
            self.build_date_options(doctor_id, window_days).await;
        }
    }
}

/// Projects `schedules` onto `window_days` consecutive days starting at `today`.
pub fn aggregate_dates(
    schedules: &[Schedule],
    today: NaiveDate,
    window_days: u32,
    locale: Locale,
) -> Vec<DateOption> {
    let window: Vec<NaiveDate> = today.iter_days().take(window_days as usize).collect();
    let Some(&last_day) = window.last() else {
        return Vec::new();
    };

    let mut by_date: BTreeMap<NaiveDate, Vec<&Schedule>> = BTreeMap::new();
    for schedule in schedules {
        if schedule.work_date >= today && schedule.work_date <= last_day {
            by_date.entry(schedule.work_date).or_default().push(schedule);
        }
    }

    window
        .into_iter()
        .enumerate()
        .map(|(offset, date)| {
            let on_day = by_date.get(&date).map(Vec::as_slice).unwrap_or(&[]);
            let label = match offset {
                0 => locale.today_label().to_string(),
                1 => locale.tomorrow_label().to_string(),
                _ => locale.weekday_label(date.weekday()).to_string(),
            };

            DateOption {
                id: date.format("%Y-%m-%d").to_string(),
                label,
                date_label: locale.date_label(date),
                disabled: date < today,
                available_slots_count: on_day.iter().map(|s| s.available_slot_count()).sum(),
                is_today: offset == 0,
                is_tomorrow: offset == 1,
                is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
                schedule_ids: on_day.iter().map(|s| s.schedule_id).collect(),
            }
        })
        .collect()
}
