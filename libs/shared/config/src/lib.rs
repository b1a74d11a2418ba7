use std::env;
use std::fmt::Display;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub hospital_api_url: String,
    pub hospital_api_token: Option<String>,
    pub hospital_api_timeout_seconds: u64,
    pub retry_max_attempts: u32,
    pub retry_initial_backoff_ms: u64,
    pub retry_max_backoff_ms: u64,
    pub availability_window_days: u32,
    pub slot_display_price: String,
    pub display_locale: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hospital_api_url: String::new(),
            hospital_api_token: None,
            hospital_api_timeout_seconds: 10,
            retry_max_attempts: 3,
            retry_initial_backoff_ms: 200,
            retry_max_backoff_ms: 2000,
            availability_window_days: 7,
            slot_display_price: "150.000 VND".to_string(),
            display_locale: "vi".to_string(),
            port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            hospital_api_url: env::var("HOSPITAL_API_URL")
                .unwrap_or_else(|_| {
                    warn!("HOSPITAL_API_URL not set, using empty value");
                    String::new()
                }),
            hospital_api_token: env::var("HOSPITAL_API_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            hospital_api_timeout_seconds: parsed_or(
                "HOSPITAL_API_TIMEOUT_SECONDS",
                defaults.hospital_api_timeout_seconds,
            ),
            retry_max_attempts: parsed_or(
                "AVAILABILITY_RETRY_MAX_ATTEMPTS",
                defaults.retry_max_attempts,
            ),
            retry_initial_backoff_ms: parsed_or(
                "AVAILABILITY_RETRY_INITIAL_BACKOFF_MS",
                defaults.retry_initial_backoff_ms,
            ),
            retry_max_backoff_ms: parsed_or(
                "AVAILABILITY_RETRY_MAX_BACKOFF_MS",
                defaults.retry_max_backoff_ms,
            ),
            availability_window_days: parsed_or(
                "AVAILABILITY_WINDOW_DAYS",
                defaults.availability_window_days,
            ),
            slot_display_price: env::var("SLOT_DISPLAY_PRICE")
                .unwrap_or(defaults.slot_display_price),
            display_locale: env::var("DISPLAY_LOCALE")
                .unwrap_or(defaults.display_locale),
            port: parsed_or("PORT", defaults.port),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.hospital_api_url.is_empty()
    }
}

fn parsed_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
