use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub business_timezone: Tz,
    pub slot_granularity_minutes: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            business_timezone: chrono_tz::UTC,
            slot_granularity_minutes: 15,
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            business_timezone: self.business_timezone,
            slot_granularity_minutes: self.slot_granularity_minutes,
            store_timeout_seconds: 2,
            notification_base_delay_ms: 1,
            notification_max_delay_ms: 5,
            ..AppConfig::default()
        }
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid test instant")
}
