use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub ledger_url: String,
    pub ledger_retry_attempts: u32,
    pub ledger_retry_delay: Duration,
    pub log_level: String,
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(3000),
            ledger_url: env::var("LEDGER_URL")
                .unwrap_or_else(|_| "https://s.altnet.rippletest.net:51234".to_string()),
            ledger_retry_attempts: env::var("LEDGER_RETRY_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            ledger_retry_delay: Duration::from_millis(
                env::var("LEDGER_RETRY_DELAY_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(500),
            ),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

// Read once at startup; services receive their tunables explicitly.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
