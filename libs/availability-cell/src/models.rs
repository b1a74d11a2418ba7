use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::AvailabilityError;

pub type DepartmentId = String;
pub type DoctorId = String;
pub type ScheduleId = i64;

/// The hospital API sends some identifiers as numbers and some as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Number(id) => write!(f, "{}", id),
            RawId::Text(id) => write!(f, "{}", id),
        }
    }
}

// ==============================================================================
// HOSPITAL API PAYLOADS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDoctor {
    pub doctor_id: RawId,
    pub full_name: Option<String>,
    pub academic_degree: Option<String>,
    pub specialization: Option<String>,
    pub consultation_fee: Option<f64>,
    pub rating: Option<f32>,
    pub experience: Option<Value>,
    pub is_online: Option<bool>,
    pub join_date: Option<String>,
    pub status: Option<String>,
    pub avatar: Option<String>,
}

impl RawDoctor {
    pub fn new(doctor_id: RawId, full_name: &str) -> Self {
        Self {
            doctor_id,
            full_name: Some(full_name.to_string()),
            academic_degree: None,
            specialization: None,
            consultation_fee: None,
            rating: None,
            experience: None,
            is_online: None,
            join_date: None,
            status: None,
            avatar: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSchedule {
    pub schedule_id: ScheduleId,
    pub doctor_id: Option<RawId>,
    pub work_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub shift: Option<String>,
    pub room_id: Option<i64>,
}

/// A bookable slot as the server reports it. Only ever stored inside its [`Schedule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct RawSlot {
    pub slot_start: NaiveTime,
    pub slot_end: NaiveTime,
    pub available: bool,
}

/// Key of the slot endpoint: the schedule id plus its working hours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub schedule_id: ScheduleId,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

// ==============================================================================
// CACHED ENTITIES
// ==============================================================================

/// Outcome of the load that produced a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EntryStatus {
    Ready,
    Failed { attempts: u32, reason: String },
    /// A requested schedule id was not present anywhere in the cache.
    Unresolved,
}

impl EntryStatus {
    pub fn failed(error: &AvailabilityError) -> Self {
        EntryStatus::Failed {
            attempts: error.attempts(),
            reason: error.to_string(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, EntryStatus::Ready)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, EntryStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub name: String,
    pub specialty: String,
    pub department_id: DepartmentId,
    pub price: String,
    pub consultation_fee: f64,
    pub rating: f32,
    pub experience: Option<String>,
    pub is_online: bool,
    pub join_date: Option<String>,
    pub status: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub schedule_id: ScheduleId,
    pub doctor_id: DoctorId,
    pub work_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub shift: Option<String>,
    pub room_id: Option<i64>,
    pub slots: Vec<RawSlot>,
    pub slot_status: EntryStatus,
}

impl Schedule {
    /// Builds a schedule with no slots attached yet.
    pub fn from_raw(raw: RawSchedule, doctor_id: &str) -> Self {
        Self {
            schedule_id: raw.schedule_id,
            doctor_id: doctor_id.to_string(),
            work_date: raw.work_date,
            start_time: raw.start_time,
            end_time: raw.end_time,
            shift: raw.shift,
            room_id: raw.room_id,
            slots: Vec::new(),
            slot_status: EntryStatus::Ready,
        }
    }

    pub fn window(&self) -> ScheduleWindow {
        ScheduleWindow {
            schedule_id: self.schedule_id,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }

    pub fn available_slot_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.available).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateOption {
    /// ISO `YYYY-MM-DD`.
    pub id: String,
    pub label: String,
    pub date_label: String,
    pub disabled: bool,
    pub available_slots_count: usize,
    pub is_today: bool,
    pub is_tomorrow: bool,
    pub is_weekend: bool,
    pub schedule_ids: Vec<ScheduleId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: String,
    pub time: String,
    pub available: bool,
    pub price: String,
    pub starts_at: NaiveDateTime,
    pub is_past: bool,
    pub is_booked: bool,
}

impl TimeSlot {
    pub fn refresh_past(&mut self, now: NaiveDateTime) {
        self.is_past = self.starts_at < now;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingIds {
    pub department_ids: Vec<DepartmentId>,
    pub doctor_ids: Vec<DoctorId>,
}
