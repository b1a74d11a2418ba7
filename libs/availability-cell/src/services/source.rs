use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::HospitalApiClient;

use crate::error::AvailabilityError;
use crate::models::{RawDoctor, RawSchedule, RawSlot, ScheduleWindow};

/// Read endpoints of the hospital API that availability depends on.
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    async fn department_doctors(&self, department_id: &str) -> Result<Vec<RawDoctor>, AvailabilityError>;

    async fn doctor_schedules(&self, doctor_id: &str) -> Result<Vec<RawSchedule>, AvailabilityError>;

    async fn schedule_slots(&self, window: &ScheduleWindow) -> Result<Vec<RawSlot>, AvailabilityError>;
}

pub struct HospitalApiSource {
    client: HospitalApiClient,
}

impl HospitalApiSource {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: HospitalApiClient::new(config)?,
        })
    }

    pub fn with_client(client: HospitalApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AvailabilitySource for HospitalApiSource {
    async fn department_doctors(&self, department_id: &str) -> Result<Vec<RawDoctor>, AvailabilityError> {
        let path = format!("/doctors/departments/{}/doctors", department_id);
        let body: Value = self.client.get(&path).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn doctor_schedules(&self, doctor_id: &str) -> Result<Vec<RawSchedule>, AvailabilityError> {
        let path = format!("/doctors/{}/schedules", doctor_id);
        let body: Value = self.client.get(&path).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn schedule_slots(&self, window: &ScheduleWindow) -> Result<Vec<RawSlot>, AvailabilityError> {
        let path = format!("/appointments/schedule/{}/available-slots", window.schedule_id);
        let request = json!({
            "startTime": window.start_time.format("%H:%M:%S").to_string(),
            "endTime": window.end_time.format("%H:%M:%S").to_string(),
        });
        debug!("Requesting slots for schedule {}", window.schedule_id);

        let body: Value = self.client.post(&path, request).await?;
        Ok(serde_json::from_value(body)?)
    }
}
