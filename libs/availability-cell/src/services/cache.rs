//! Shared in-memory store behind every availability operation.
//!
//! Each entity kind lives in its own [`KeyedStore`]. Stores that are filled by
//! network fetches also track in-flight keys, each stamped with the generation
//! of the call that claimed it; a write only lands while that claim is current.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::models::{
    DateOption, DepartmentId, Doctor, DoctorId, EntryStatus, LoadingIds, Schedule, ScheduleId,
    TimeSlot,
};

pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    DoctorsByDepartment,
    SchedulesByDoctor,
    DatesByDoctor,
    TimeSlotsBySchedule,
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CacheKind::DoctorsByDepartment => "doctors_by_department",
            CacheKind::SchedulesByDoctor => "schedules_by_doctor",
            CacheKind::DatesByDoctor => "dates_by_doctor",
            CacheKind::TimeSlotsBySchedule => "time_slots_by_schedule",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub status: EntryStatus,
    pub generation: Generation,
    pub updated_at: DateTime<Utc>,
}

/// Keys handed to one preload call, all sharing the call's generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim<K> {
    pub generation: Generation,
    pub keys: Vec<K>,
}

impl<K> Claim<K> {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[derive(Debug)]
pub struct KeyedStore<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    in_flight: HashMap<K, Generation>,
}

impl<K, V> Default for KeyedStore<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            in_flight: HashMap::new(),
        }
    }
}

impl<K, V> KeyedStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    pub fn entry(&self, key: &K) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unconditional write, used by the projections that never leave the lock.
    pub fn set(&mut self, key: K, value: V, status: EntryStatus, generation: Generation) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                status,
                generation,
                updated_at: Utc::now(),
            },
        );
    }

    pub fn is_loading(&self, key: &K) -> bool {
        self.in_flight.contains_key(key)
    }

    /// Marks every key that is neither cached nor already in flight as loading
    /// under `generation`, and returns those keys in request order.
    pub fn claim<I>(&mut self, keys: I, generation: Generation) -> Vec<K>
    where
        I: IntoIterator<Item = K>,
    {
        let mut claimed = Vec::new();
        for key in keys {
            if self.entries.contains_key(&key) || self.in_flight.contains_key(&key) {
                continue;
            }
            self.in_flight.insert(key.clone(), generation);
            claimed.push(key);
        }
        claimed
    }

    /// Writes `value` only while `generation` still owns the key's in-flight slot.
    pub fn commit(&mut self, key: &K, generation: Generation, value: V, status: EntryStatus) -> bool {
        if self.in_flight.get(key) != Some(&generation) {
            return false;
        }
        self.set(key.clone(), value, status, generation);
        true
    }

    pub fn clear_loading(&mut self, keys: &[K], generation: Generation) {
        for key in keys {
            if self.in_flight.get(key) == Some(&generation) {
                self.in_flight.remove(key);
            }
        }
    }

    pub fn loading_keys(&self) -> Vec<K> {
        self.in_flight.keys().cloned().collect()
    }

    pub fn snapshot(&self) -> HashMap<K, V> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key).map(|entry| &mut entry.value)
    }

    pub fn remove(&mut self, key: &K) -> Option<CacheEntry<V>> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.in_flight.clear();
    }
}

/// All four entity stores plus the schedule-id index.
#[derive(Debug, Default)]
pub struct EntityCache {
    doctors: KeyedStore<DepartmentId, Vec<Doctor>>,
    schedules: KeyedStore<DoctorId, Vec<Schedule>>,
    dates: KeyedStore<DoctorId, Vec<DateOption>>,
    time_slots: KeyedStore<ScheduleId, Vec<TimeSlot>>,
    schedule_index: HashMap<ScheduleId, DoctorId>,
    last_generation: Generation,
    disposed: bool,
}

impl EntityCache {
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn next_generation(&mut self) -> Generation {
        self.last_generation += 1;
        self.last_generation
    }

    pub fn doctors(&self) -> &KeyedStore<DepartmentId, Vec<Doctor>> {
        &self.doctors
    }

    pub fn schedules(&self) -> &KeyedStore<DoctorId, Vec<Schedule>> {
        &self.schedules
    }

    pub fn dates(&self) -> &KeyedStore<DoctorId, Vec<DateOption>> {
        &self.dates
    }

    pub fn time_slots(&self) -> &KeyedStore<ScheduleId, Vec<TimeSlot>> {
        &self.time_slots
    }

    pub fn claim_departments(&mut self, department_ids: &[DepartmentId]) -> Claim<DepartmentId> {
        let generation = self.next_generation();
        let keys = if self.disposed {
            Vec::new()
        } else {
            self.doctors.claim(unique_non_empty(department_ids), generation)
        };
        Claim { generation, keys }
    }

    pub fn claim_doctors(&mut self, doctor_ids: &[DoctorId]) -> Claim<DoctorId> {
        let generation = self.next_generation();
        let keys = if self.disposed {
            Vec::new()
        } else {
            self.schedules.claim(unique_non_empty(doctor_ids), generation)
        };
        Claim { generation, keys }
    }

    pub fn commit_doctors(
        &mut self,
        department_id: &DepartmentId,
        generation: Generation,
        doctors: Vec<Doctor>,
        status: EntryStatus,
    ) -> bool {
        !self.disposed && self.doctors.commit(department_id, generation, doctors, status)
    }

    /// Also indexes every schedule id under `doctor_id`. Slot lists that were
    /// cached as unresolved for those ids are dropped so the next projection
    /// can resolve them.
    pub fn commit_schedules(
        &mut self,
        doctor_id: &DoctorId,
        generation: Generation,
        schedules: Vec<Schedule>,
        status: EntryStatus,
    ) -> bool {
        if self.disposed {
            return false;
        }

        let schedule_ids: Vec<ScheduleId> = schedules.iter().map(|s| s.schedule_id).collect();
        if !self.schedules.commit(doctor_id, generation, schedules, status) {
            return false;
        }

        for schedule_id in schedule_ids {
            self.schedule_index.insert(schedule_id, doctor_id.clone());
            let unresolved = self
                .time_slots
                .entry(&schedule_id)
                .is_some_and(|entry| entry.status == EntryStatus::Unresolved);
            if unresolved {
                debug!("Schedule {} is now cached, dropping its unresolved slot list", schedule_id);
                self.time_slots.remove(&schedule_id);
            }
        }
        true
    }

    pub fn release_departments(&mut self, claim: &Claim<DepartmentId>) {
        self.doctors.clear_loading(&claim.keys, claim.generation);
    }

    pub fn release_doctors(&mut self, claim: &Claim<DoctorId>) {
        self.schedules.clear_loading(&claim.keys, claim.generation);
    }

    pub fn store_dates(&mut self, doctor_id: &DoctorId, dates: Vec<DateOption>) {
        if self.disposed {
            return;
        }
        let generation = self.next_generation();
        self.dates.set(doctor_id.clone(), dates, EntryStatus::Ready, generation);
    }

    pub fn store_time_slots(&mut self, schedule_id: ScheduleId, slots: Vec<TimeSlot>, status: EntryStatus) {
        if self.disposed {
            return;
        }
        let generation = self.next_generation();
        self.time_slots.set(schedule_id, slots, status, generation);
    }

    /// Re-derives `is_past` on a cached slot list. Returns false when nothing is cached.
    pub fn refresh_time_slots(&mut self, schedule_id: ScheduleId, now: NaiveDateTime) -> bool {
        match self.time_slots.get_mut(&schedule_id) {
            Some(slots) => {
                slots.iter_mut().for_each(|slot| slot.refresh_past(now));
                true
            }
            None => false,
        }
    }

    pub fn schedules_for(&self, doctor_id: &DoctorId) -> &[Schedule] {
        self.schedules.get(doctor_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// O(1) lookup through the schedule index.
    pub fn find_schedule(&self, schedule_id: ScheduleId) -> Option<&Schedule> {
        let doctor_id = self.schedule_index.get(&schedule_id)?;
        self.schedules
            .get(doctor_id)?
            .iter()
            .find(|schedule| schedule.schedule_id == schedule_id)
    }

    pub fn owner_of(&self, schedule_id: ScheduleId) -> Option<&DoctorId> {
        self.schedule_index.get(&schedule_id)
    }

    pub fn is_loading(&self, kind: CacheKind, key: &str) -> bool {
        match kind {
            CacheKind::DoctorsByDepartment => self.doctors.is_loading(&key.to_string()),
            CacheKind::SchedulesByDoctor => self.schedules.is_loading(&key.to_string()),
            CacheKind::DatesByDoctor | CacheKind::TimeSlotsBySchedule => false,
        }
    }

    pub fn status(&self, kind: CacheKind, key: &str) -> Option<EntryStatus> {
        match kind {
            CacheKind::DoctorsByDepartment => self.doctors.entry(&key.to_string()).map(|e| e.status.clone()),
            CacheKind::SchedulesByDoctor => self.schedules.entry(&key.to_string()).map(|e| e.status.clone()),
            CacheKind::DatesByDoctor => self.dates.entry(&key.to_string()).map(|e| e.status.clone()),
            CacheKind::TimeSlotsBySchedule => {
                let schedule_id: ScheduleId = key.parse().ok()?;
                self.time_slots.entry(&schedule_id).map(|e| e.status.clone())
            }
        }
    }

    pub fn loading_ids(&self) -> LoadingIds {
        let mut department_ids = self.doctors.loading_keys();
        let mut doctor_ids = self.schedules.loading_keys();
        department_ids.sort();
        doctor_ids.sort();
        LoadingIds { department_ids, doctor_ids }
    }

    /// Drops every entry and in-flight marker. The generation counter keeps
    /// counting, so callbacks from calls started before the clear cannot write.
    pub fn clear(&mut self) {
        self.doctors.clear();
        self.schedules.clear();
        self.dates.clear();
        self.time_slots.clear();
        self.schedule_index.clear();
    }

    pub fn dispose(&mut self) {
        self.clear();
        self.disposed = true;
    }
}

fn unique_non_empty(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect()
}

/// Cloneable handle to the shared [`EntityCache`].
#[derive(Clone, Default)]
pub struct AvailabilityCache {
    inner: Arc<RwLock<EntityCache>>,
}

impl AvailabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, EntityCache> {
        self.inner.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, EntityCache> {
        self.inner.write().await
    }

    pub async fn doctors(&self, department_id: &str) -> Option<Vec<Doctor>> {
        self.read().await.doctors.get(&department_id.to_string()).cloned()
    }

    pub async fn schedules(&self, doctor_id: &str) -> Option<Vec<Schedule>> {
        self.read().await.schedules.get(&doctor_id.to_string()).cloned()
    }

    pub async fn dates(&self, doctor_id: &str) -> Option<Vec<DateOption>> {
        self.read().await.dates.get(&doctor_id.to_string()).cloned()
    }

    pub async fn time_slots(&self, schedule_id: ScheduleId) -> Option<Vec<TimeSlot>> {
        self.read().await.time_slots.get(&schedule_id).cloned()
    }

    pub async fn doctors_by_department(&self) -> HashMap<DepartmentId, Vec<Doctor>> {
        self.read().await.doctors.snapshot()
    }

    pub async fn schedules_by_doctor(&self) -> HashMap<DoctorId, Vec<Schedule>> {
        self.read().await.schedules.snapshot()
    }

    pub async fn dates_by_doctor(&self) -> HashMap<DoctorId, Vec<DateOption>> {
        self.read().await.dates.snapshot()
    }

    pub async fn time_slots_by_schedule(&self) -> HashMap<ScheduleId, Vec<TimeSlot>> {
        self.read().await.time_slots.snapshot()
    }

    pub async fn loading_ids(&self) -> LoadingIds {
        self.read().await.loading_ids()
    }

    pub async fn is_loading(&self, kind: CacheKind, key: &str) -> bool {
        self.read().await.is_loading(kind, key)
    }

    pub async fn status(&self, kind: CacheKind, key: &str) -> Option<EntryStatus> {
        self.read().await.status(kind, key)
    }

    pub async fn is_disposed(&self) -> bool {
        self.read().await.is_disposed()
    }

    pub async fn clear(&self) {
        self.write().await.clear();
        info!("Availability cache cleared");
    }

    pub async fn dispose(&self) {
        self.write().await.dispose();
        info!("Availability cache disposed");
    }
}
