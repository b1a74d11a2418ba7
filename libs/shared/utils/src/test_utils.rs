use chrono::{Duration, NaiveDate, NaiveTime};
use serde_json::{json, Value};

use shared_config::AppConfig;

pub struct TestConfig {
    pub hospital_api_url: String,
    pub hospital_api_token: Option<String>,
    pub retry_max_attempts: u32,
    pub display_locale: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            hospital_api_url: "http://localhost:8080".to_string(),
            hospital_api_token: None,
            retry_max_attempts: 1,
            display_locale: "vi".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_api_url(url: &str) -> Self {
        Self {
            hospital_api_url: url.to_string(),
            ..Self::default()
        }
    }

    /// Test configs never sleep between retry attempts.
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            hospital_api_url: self.hospital_api_url.clone(),
            hospital_api_token: self.hospital_api_token.clone(),
            hospital_api_timeout_seconds: 5,
            retry_max_attempts: self.retry_max_attempts,
            retry_initial_backoff_ms: 0,
            retry_max_backoff_ms: 0,
            display_locale: self.display_locale.clone(),
            ..AppConfig::default()
        }
    }
}

pub struct MockHospitalResponses;

impl MockHospitalResponses {
    pub fn doctor_response(doctor_id: i64, full_name: &str, academic_degree: Option<&str>, fee: Option<f64>) -> Value {
        json!({
            "doctorId": doctor_id,
            "fullName": full_name,
            "academicDegree": academic_degree,
            "specialization": "Tim mạch",
            "consultationFee": fee,
            "rating": 4.5,
            "experience": "10 năm",
            "isOnline": true,
            "joinDate": "2021-03-01",
            "status": "active",
            "avatar": format!("https://cdn.example.com/doctors/{}.png", doctor_id),
        })
    }

    pub fn department_doctors(first_doctor_id: i64, count: usize) -> Value {
        let doctors: Vec<Value> = (0..count)
            .map(|offset| {
                let id = first_doctor_id + offset as i64;
                Self::doctor_response(id, &format!("Nguyễn Văn {}", id), Some("ThS"), Some(200_000.0))
            })
            .collect();
        Value::Array(doctors)
    }

    pub fn schedule_response(schedule_id: i64, doctor_id: i64, work_date: NaiveDate, start: &str, end: &str) -> Value {
        json!({
            "scheduleId": schedule_id,
            "doctorId": doctor_id,
            "workDate": work_date.format("%Y-%m-%d").to_string(),
            "startTime": start,
            "endTime": end,
            "shift": "MORNING",
            "roomId": 3,
            "createdAt": "2025-06-01T08:00:00",
        })
    }

    pub fn slot_response(start: &str, end: &str, available: bool) -> Value {
        json!({
            "slotStart": start,
            "slotEnd": end,
            "available": available,
        })
    }

    /// Consecutive 30-minute slots from `first_start`; the first `available` are open.
    pub fn slot_run(first_start: NaiveTime, total: usize, available: usize) -> Value {
        let slots: Vec<Value> = (0..total)
            .map(|index| {
                let start = first_start + Duration::minutes(30 * index as i64);
                let end = start + Duration::minutes(30);
                Self::slot_response(
                    &start.format("%H:%M:%S").to_string(),
                    &end.format("%H:%M:%S").to_string(),
                    index < available,
                )
            })
            .collect();
        Value::Array(slots)
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "error": {
                "message": message,
                "code": code
            }
        })
    }
}
