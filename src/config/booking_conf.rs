use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

/// Booking rules applied before an appointment is requested
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Shortest rental, in days
    pub min_days: u32,
    /// Longest rental, in days
    pub max_days: u32,
}

impl BookingConfig {
    /// Load booking rules from environment variables
    ///
    /// - BOOKING_MIN_DAYS: shortest rental (defaults to 1)
    /// - BOOKING_MAX_DAYS: longest rental (defaults to 90)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading booking configuration from environment variables");

        let min_days = Self::parse_days("BOOKING_MIN_DAYS", 1)?;
        let max_days = Self::parse_days("BOOKING_MAX_DAYS", 90)?;
        debug!("Booking window: {}..={} days", min_days, max_days);

        let config = BookingConfig { min_days, max_days };
        config.validate()?;
        info!("Booking configuration loaded successfully");
        Ok(config)
    }

    fn parse_days(var: &str, default: u32) -> Result<u32, ConfigError> {
        match env::var(var) {
            Ok(raw) => raw.trim().parse::<u32>().map_err(|_| {
                error!("Invalid {} value: {}", var, raw);
                ConfigError::ParseError(format!("Invalid {} value: {}", var, raw))
            }),
            Err(_) => {
                warn!("{} not set, using default: {}", var, default);
                Ok(default)
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_days == 0 {
            error!("BOOKING_MAX_DAYS is 0");
            return Err(ConfigError::ValidationError("Maximum rental days must be greater than 0".to_string()));
        }
        if self.min_days > self.max_days {
            error!("BOOKING_MIN_DAYS is greater than BOOKING_MAX_DAYS");
            return Err(ConfigError::ValidationError(format!(
                "Minimum rental days ({}) cannot exceed maximum ({})",
                self.min_days, self.max_days
            )));
        }
        Ok(())
    }

    pub fn allows(&self, days: u32) -> bool {
        (self.min_days..=self.max_days).contains(&days)
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        BookingConfig { min_days: 1, max_days: 90 }
    }
}
