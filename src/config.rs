use std::time::Duration;

use crate::args::ServiceArguments;
use crate::cache::DEFAULT_TTL;
use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 6379;
const DEFAULT_BIND: &str = "127.0.0.1";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind: String,
    pub default_ttl: Duration,
    pub sweep_interval: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            default_ttl: DEFAULT_TTL,
            sweep_interval: None,
        }
    }
}

impl Config {
    pub fn from_args(args: &ServiceArguments) -> Result<Config, ConfigError> {
        let default_ttl = match args.default_ttl_ms {
            Some(0) => return Err(ConfigError::ZeroDefaultTtl),
            Some(ms) => Duration::from_millis(ms),
            None => DEFAULT_TTL,
        };

        let sweep_interval = match args.sweep_interval_ms {
            Some(0) => return Err(ConfigError::ZeroSweepInterval),
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        };

        Ok(Config {
            port: args.port.unwrap_or(DEFAULT_PORT),
            bind: args.bind.clone().unwrap_or_else(|| DEFAULT_BIND.to_string()),
            default_ttl,
            sweep_interval,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn get(&self, config_name: &str) -> Option<String> {
        match config_name {
            "port" => Some(self.port.to_string()),
            "bind" => Some(self.bind.clone()),
            "default-ttl-ms" => Some(self.default_ttl.as_millis().to_string()),
            "sweep-interval-ms" => self.sweep_interval.map(|d| d.as_millis().to_string()),
            _ => None,
        }
    }
}
