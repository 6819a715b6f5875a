//! Application configuration loaded from environment variables.

use common::Money;
use domain::DiscountConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — PostgreSQL connection string; unset runs in-memory
/// - `ONLINE_DISCOUNT_PCT` — online payment discount percentage (default: `0`)
/// - `FREE_GIFT_THRESHOLD_CENTS` — minimum paid subtotal for free-gift lines
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub online_discount_pct: f64,
    pub free_gift_threshold_cents: i64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            online_discount_pct: std::env::var("ONLINE_DISCOUNT_PCT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(0.0),
            free_gift_threshold_cents: std::env::var("FREE_GIFT_THRESHOLD_CENTS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(0),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the discount configuration the checkout engine uses.
    pub fn discounts(&self) -> DiscountConfig {
        DiscountConfig {
            online_payment_discount_pct: self.online_discount_pct,
            free_gift_threshold: Money::from_cents(self.free_gift_threshold_cents),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            online_discount_pct: 0.0,
            free_gift_threshold_cents: 0,
        }
    }
}
