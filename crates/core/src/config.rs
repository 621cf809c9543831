use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub monitor: MonitorConfig,
    pub price_feed: PriceFeedConfig,
    pub intake: IntakeConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://TradeExecution.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Delay between monitoring cycles.
    pub poll_interval_secs: u64,
    /// Position reports are emitted on minutes divisible by this value.
    pub report_every_minutes: u32,
    /// Upper bound on each store call made by the loop; `0` disables it.
    pub call_timeout_ms: u64,
    /// Use conditional `OPEN -> terminal` updates instead of blind overwrites.
    pub guarded_updates: bool,
    /// Buffer size of the status-change broadcast channel.
    pub event_capacity: usize,
}

impl MonitorConfig {
    /// Never zero; a zero setting is read as one second.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(at_least_one(self.poll_interval_secs))
    }

    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            report_every_minutes: 5,
            call_timeout_ms: 2_000,
            guarded_updates: true,
            event_capacity: 256,
        }
    }
}

const fn at_least_one(secs: u64) -> u64 {
    if secs == 0 {
        1
    } else {
        secs
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceFeedConfig {
    pub tick_interval_secs: u64,
    /// Largest absolute move applied to a price in one tick.
    pub max_step: f64,
    /// Symbols tracked from startup and their opening prices.
    pub seeds: BTreeMap<String, f64>,
    /// Fixed RNG seed for reproducible runs; entropy when unset.
    pub rng_seed: Option<u64>,
}

impl PriceFeedConfig {
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_secs(at_least_one(self.tick_interval_secs))
    }
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 5,
            max_step: 50.0,
            seeds: BTreeMap::from([("BTCUSD".to_string(), 68_000.0)]),
            rng_seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Signals buffered between the HTTP layer and intake.
    pub queue_capacity: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1_024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}
