use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::locale::Locale;
use crate::models::{DepartmentId, Doctor, EntryStatus, RawDoctor};
use crate::services::cache::{AvailabilityCache, Generation};
use crate::services::retry::RetryPolicy;
use crate::services::source::AvailabilitySource;

/// Loads and normalizes the doctor roster of each department.
pub struct DoctorEnricher {
    source: Arc<dyn AvailabilitySource>,
    cache: AvailabilityCache,
    retry: RetryPolicy,
    locale: Locale,
}

impl DoctorEnricher {
    pub fn new(
        source: Arc<dyn AvailabilitySource>,
        cache: AvailabilityCache,
        retry: RetryPolicy,
        locale: Locale,
    ) -> Self {
        Self { source, cache, retry, locale }
    }

    /// Fetches every department that is neither cached nor already in flight.
    /// Failures are recorded per department and never returned.
    #[instrument(skip(self))]
    pub async fn preload_doctors(&self, department_ids: &[DepartmentId]) {
        let claim = self.cache.write().await.claim_departments(department_ids);
        if claim.is_empty() {
            debug!("All requested departments are cached or already loading");
            return;
        }

        info!("Fetching doctors for {} department(s)", claim.keys.len());
        join_all(
            claim
                .keys
                .iter()
                .map(|department_id| self.load_department(department_id, claim.generation)),
        )
        .await;

        self.cache.write().await.release_departments(&claim);
    }

    async fn load_department(&self, department_id: &DepartmentId, generation: Generation) {
        let operation = format!("doctors for department {}", department_id);
        let fetched = self
            .retry
            .run(&operation, || self.source.department_doctors(department_id))
            .await;

        let (doctors, status) = match fetched {
            Ok(raw) => {
                let doctors: Vec<Doctor> = raw
                    .into_iter()
                    .map(|doctor| normalize_doctor(doctor, department_id, self.locale))
                    .collect();
                debug!("Department {} has {} doctor(s)", department_id, doctors.len());
                (doctors, EntryStatus::Ready)
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
            .commit_doctors(department_id, generation, doctors, status);
        if !committed {
            warn!("Dropping superseded doctor list for department {}", department_id);
        }
    }
}

pub fn normalize_doctor(raw: RawDoctor, department_id: &str, locale: Locale) -> Doctor {
    let fee = raw.consultation_fee.filter(|fee| fee.is_finite()).unwrap_or(0.0);
    let price = if fee != 0.0 {
        locale.format_vnd(fee)
    } else {
        locale.contact_for_price().to_string()
    };

    Doctor {
        id: raw.doctor_id.to_string(),
        name: display_name(raw.academic_degree.as_deref(), raw.full_name.as_deref(), locale),
        specialty: non_blank(raw.specialization)
            .unwrap_or_else(|| locale.general_specialty().to_string()),
        department_id: department_id.to_string(),
        price,
        consultation_fee: fee,
        rating: raw.rating.unwrap_or(0.0),
        experience: raw.experience.and_then(experience_text),
        is_online: raw.is_online.unwrap_or(false),
        join_date: non_blank(raw.join_date),
        status: non_blank(raw.status).unwrap_or_else(|| "active".to_string()),
        avatar: non_blank(raw.avatar),
    }
}

/// `"{degree}. {full name}"`, or the locale's placeholder when both are blank.
fn display_name(academic_degree: Option<&str>, full_name: Option<&str>, locale: Locale) -> String {
    let degree = academic_degree
        .map(str::trim)
        .filter(|degree| !degree.is_empty())
        .map(|degree| format!("{}.", degree));
    let name = full_name.map(str::trim).filter(|name| !name.is_empty());

    let joined = [degree.as_deref(), name]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() {
        locale.unnamed_doctor().to_string()
    } else {
        joined
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn experience_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text),
        Value::Number(years) => Some(years.to_string()),
        _ => None,
    }
}
