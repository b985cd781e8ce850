use std::env;
use std::str::FromStr;

use chrono_tz::Tz;
use tracing::warn;

pub const DEFAULT_BUSINESS_TIMEZONE: Tz = chrono_tz::America::Sao_Paulo;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub business_timezone: Tz,
    pub slot_granularity_minutes: u32,
    pub store_timeout_seconds: u64,
    pub notification_webhook_url: Option<String>,
    pub notification_max_retries: u32,
    pub notification_base_delay_ms: u64,
    pub notification_max_delay_ms: u64,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            business_timezone: DEFAULT_BUSINESS_TIMEZONE,
            slot_granularity_minutes: 15,
            store_timeout_seconds: 10,
            notification_webhook_url: None,
            notification_max_retries: 3,
            notification_base_delay_ms: 500,
            notification_max_delay_ms: 30_000,
            port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            business_timezone: env::var("BUSINESS_TIMEZONE")
                .ok()
                .and_then(|name| match Tz::from_str(&name) {
                    Ok(tz) => Some(tz),
                    Err(_) => {
                        warn!("BUSINESS_TIMEZONE '{}' is not a valid IANA zone, using default", name);
                        None
                    }
                })
                .unwrap_or(defaults.business_timezone),
            slot_granularity_minutes: parse_var("SLOT_GRANULARITY_MINUTES", defaults.slot_granularity_minutes)
                .max(1),
            store_timeout_seconds: parse_var("STORE_TIMEOUT_SECONDS", defaults.store_timeout_seconds),
            notification_webhook_url: env::var("NOTIFICATION_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            notification_max_retries: parse_var("NOTIFICATION_MAX_RETRIES", defaults.notification_max_retries),
            notification_base_delay_ms: parse_var("NOTIFICATION_BASE_DELAY_MS", defaults.notification_base_delay_ms),
            notification_max_delay_ms: parse_var("NOTIFICATION_MAX_DELAY_MS", defaults.notification_max_delay_ms),
            port: parse_var("PORT", defaults.port),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing Supabase environment variables");
        }

        if config.notification_webhook_url.is_none() {
            warn!("NOTIFICATION_WEBHOOK_URL not set, notifications will only be logged");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }
}

fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_not_configured() {
        let config = AppConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.slot_granularity_minutes, 15);
        assert_eq!(config.business_timezone, chrono_tz::America::Sao_Paulo);
    }

    #[test]
    fn test_configured_when_supabase_values_present() {
        let config = AppConfig {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "service-key".to_string(),
            ..AppConfig::default()
        };
        assert!(config.is_configured());
    }
}
