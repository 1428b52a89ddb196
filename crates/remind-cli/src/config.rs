use chrono_tz::Tz;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use remind_core::calendar::Locale;
use remind_core::geocoding::{GeocoderConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use remind_core::models::UserId;
use remind_core::notify::{
    NotificationPreferences, PollerConfig, DEFAULT_GEOFENCING_RADIUS_KM,
    DEFAULT_LOCATION_POLL_INTERVAL, DEFAULT_POLL_INTERVAL,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

pub const CONFIG_FILE: &str = "remind.toml";
pub const ENV_PREFIX: &str = "REMIND_";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: String,
    /// Acting user when `--user` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserId>,
    /// Zone used to read and render instants (IANA format)
    pub display_timezone: String,
    pub notifications: NotificationsConfig,
    pub geocoding: GeocodingConfig,
    pub calendar: CalendarConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub enabled: bool,
    pub poll_interval_secs: u64,
    pub location_poll_interval_secs: u64,
    pub geofencing_radius_km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub base_url: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub locale: Locale,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "remind.db".to_string(),
            user: None,
            display_timezone: detect_system_timezone(),
            notifications: NotificationsConfig::default(),
            geocoding: GeocodingConfig::default(),
            calendar: CalendarConfig::default(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            location_poll_interval_secs: DEFAULT_LOCATION_POLL_INTERVAL.as_secs(),
            geofencing_radius_km: DEFAULT_GEOFENCING_RADIUS_KM,
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Defaults, then `remind.toml`, then `REMIND_*` variables.
    pub fn new() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn display_tz(&self) -> Result<Tz, String> {
        validate_timezone(&self.display_timezone)
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            poll_interval: Duration::from_secs(self.notifications.poll_interval_secs.max(1)),
            location_poll_interval: Duration::from_secs(
                self.notifications.location_poll_interval_secs.max(1),
            ),
            ..PollerConfig::default()
        }
    }

    pub fn preferences(&self) -> NotificationPreferences {
        NotificationPreferences::new(
            self.notifications.enabled,
            self.notifications.geofencing_radius_km,
        )
    }

    pub fn geocoder_config(&self) -> GeocoderConfig {
        GeocoderConfig {
            base_url: self.geocoding.base_url.clone(),
            user_agent: self.geocoding.user_agent.clone(),
        }
    }
}

/// Validates that a timezone string is a valid IANA timezone name
pub fn validate_timezone(timezone: &str) -> Result<Tz, String> {
    Tz::from_str(timezone).map_err(|_| {
        format!(
            "Invalid timezone: '{}'. Use IANA timezone names like 'Europe/Madrid'",
            timezone
        )
    })
}

/// Detects the system timezone, falling back to UTC if detection fails
pub fn detect_system_timezone() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        if validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(tz) = std::fs::read_to_string("/etc/timezone") {
            let tz = tz.trim();
            if validate_timezone(tz).is_ok() {
                return tz.to_string();
            }
        }
    }

    if let Ok(local_tz) = iana_time_zone::get_timezone() {
        if validate_timezone(&local_tz).is_ok() {
            return local_tz;
        }
    }

    "UTC".to_string()
}
