#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveTime};
use tokio::sync::Semaphore;

use availability_cell::{
    AvailabilityError, AvailabilityService, AvailabilitySource, RawDoctor, RawId, RawSchedule, RawSlot,
    ScheduleId, ScheduleWindow,
};
use shared_utils::test_utils::TestConfig;

type Script<T> = Mutex<HashMap<String, VecDeque<Result<Vec<T>, String>>>>;

/// In-memory source with per-key scripted responses.
///
/// Each key replays its queue front to back and then repeats the last
/// response. Unscripted keys answer with an empty list. When gated, every
/// call is counted first and then parks until a permit is released.
#[derive(Default)]
pub struct ScriptedSource {
    doctors: Script<RawDoctor>,
    schedules: Script<RawSchedule>,
    slots: Script<RawSlot>,
    calls: Mutex<HashMap<String, usize>>,
    gate: Option<Semaphore>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn push_doctors(&self, department_id: &str, response: Result<Vec<RawDoctor>, &str>) {
        push(&self.doctors, department_id.to_string(), response);
    }

    pub fn push_schedules(&self, doctor_id: &str, response: Result<Vec<RawSchedule>, &str>) {
        push(&self.schedules, doctor_id.to_string(), response);
    }

    pub fn push_slots(&self, schedule_id: ScheduleId, response: Result<Vec<RawSlot>, &str>) {
        push(&self.slots, schedule_id.to_string(), response);
    }

    /// Lets `permits` parked calls through.
    pub fn release_all(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub fn calls(&self, key: &str) -> usize {
        self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn calls_with_prefix(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(_, count)| *count)
            .sum()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub async fn wait_for_calls(&self, total: usize) {
        while self.total_calls() < total {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    async fn answer<T: Clone>(&self, script: &Script<T>, kind: &str, key: String) -> Result<Vec<T>, AvailabilityError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(format!("{}:{}", kind, key))
            .or_default() += 1;

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let mut script = script.lock().unwrap();
        let response = match script.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        match response {
            Some(Ok(items)) => Ok(items),
            Some(Err(message)) => Err(AvailabilityError::Request(message)),
            None => Ok(Vec::new()),
        }
    }
}

fn push<T>(script: &Script<T>, key: String, response: Result<Vec<T>, &str>) {
    script
        .lock()
        .unwrap()
        .entry(key)
        .or_default()
        .push_back(response.map_err(str::to_string));
}

#[async_trait]
impl AvailabilitySource for ScriptedSource {
    async fn department_doctors(&self, department_id: &str) -> Result<Vec<RawDoctor>, AvailabilityError> {
        self.answer(&self.doctors, "doctors", department_id.to_string()).await
    }

    async fn doctor_schedules(&self, doctor_id: &str) -> Result<Vec<RawSchedule>, AvailabilityError> {
        self.answer(&self.schedules, "schedules", doctor_id.to_string()).await
    }

    async fn schedule_slots(&self, window: &ScheduleWindow) -> Result<Vec<RawSlot>, AvailabilityError> {
        self.answer(&self.slots, "slots", window.schedule_id.to_string()).await
    }
}

pub fn service_with(source: Arc<ScriptedSource>, attempts: u32) -> Arc<AvailabilityService> {
    let config = TestConfig {
        retry_max_attempts: attempts,
        ..TestConfig::default()
    }
    .to_app_config();
    Arc::new(AvailabilityService::new(&config, source))
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn day(offset: i64) -> NaiveDate {
    today() + chrono::Duration::days(offset)
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn raw_doctor(doctor_id: i64, full_name: &str) -> RawDoctor {
    RawDoctor {
        academic_degree: Some("BS".to_string()),
        consultation_fee: Some(200_000.0),
        ..RawDoctor::new(RawId::Number(doctor_id), full_name)
    }
}

pub fn raw_schedule(schedule_id: ScheduleId, doctor_id: i64, work_date: NaiveDate) -> RawSchedule {
    RawSchedule {
        schedule_id,
        doctor_id: Some(RawId::Number(doctor_id)),
        work_date,
        start_time: time(8, 0),
        end_time: time(11, 0),
        shift: Some("MORNING".to_string()),
        room_id: Some(3),
    }
}

/// `total` half-hour slots from 08:00; the first `available` are open.
pub fn raw_slots(total: usize, available: usize) -> Vec<RawSlot> {
    (0..total)
        .map(|index| {
            let start = time(8, 0) + chrono::Duration::minutes(30 * index as i64);
            RawSlot {
                slot_start: start,
                slot_end: start + chrono::Duration::minutes(30),
                available: index < available,
            }
        })
        .collect()
}
