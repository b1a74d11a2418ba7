pub mod error;
pub mod handlers;
pub mod locale;
pub mod models;
pub mod router;
pub mod services;

pub use error::AvailabilityError;
pub use locale::Locale;
pub use models::*;
pub use services::*;
