pub mod availability;
pub mod cache;
pub mod dates;
pub mod doctor;
pub mod retry;
pub mod schedule;
pub mod slots;
pub mod source;

pub use availability::AvailabilityService;
pub use cache::{AvailabilityCache, CacheKind, EntityCache};
pub use dates::DateAggregator;
pub use doctor::DoctorEnricher;
pub use retry::RetryPolicy;
pub use schedule::ScheduleEnricher;
pub use slots::SlotProjector;
pub use source::{AvailabilitySource, HospitalApiSource};
