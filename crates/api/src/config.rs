use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// Startup configuration errors. The binary treats all of them as fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid {expected}: {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// HTTP and WebSocket settings for the fleetwatch server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Origins allowed to call the API and open subscriber sockets.
    pub cors_origins: Vec<String>,
    pub request_timeout: Duration,
    /// Upper bound on the monitor drain after the listener stops.
    pub shutdown_timeout: Duration,
    /// Keep-alive ping period for subscriber sockets.
    pub ping_interval: Duration,
    /// Events queued per subscriber before new ones are dropped for it.
    pub subscriber_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            cors_origins: vec!["http://localhost:5173".to_string()],
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(30),
            ping_interval: Duration::from_secs(30),
            subscriber_buffer: 256,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                  | Default                 |
    /// |--------------------------|-------------------------|
    /// | `HOST`                   | `0.0.0.0`               |
    /// | `PORT`                   | `3000`                  |
    /// | `CORS_ORIGINS`           | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`  | `30`                    |
    /// | `WS_PING_INTERVAL_SECS`  | `30`                    |
    /// | `WS_SUBSCRIBER_BUFFER`   | `256`                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration from any key lookup. Unset keys take defaults;
    /// set but unparseable or zero values are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host: IpAddr = parse(&lookup, "HOST", "IP address")?.unwrap_or(defaults.bind_addr.ip());
        let port: u16 = parse(&lookup, "PORT", "port")?.unwrap_or(defaults.bind_addr.port());

        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.cors_origins,
        };

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            cors_origins,
            request_timeout: secs(&lookup, "REQUEST_TIMEOUT_SECS")?
                .unwrap_or(defaults.request_timeout),
            shutdown_timeout: secs(&lookup, "SHUTDOWN_TIMEOUT_SECS")?
                .unwrap_or(defaults.shutdown_timeout),
            ping_interval: secs(&lookup, "WS_PING_INTERVAL_SECS")?
                .unwrap_or(defaults.ping_interval),
            subscriber_buffer: positive(&lookup, "WS_SUBSCRIBER_BUFFER")?
                .unwrap_or(defaults.subscriber_buffer),
        })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(var)
        .map(|value| {
            value.trim().parse().map_err(|_| ConfigError::Invalid {
                var,
                expected,
                value,
            })
        })
        .transpose()
}

fn positive(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<usize>, ConfigError> {
    match parse::<usize>(lookup, var, "positive integer")? {
        Some(0) => Err(ConfigError::Zero(var)),
        other => Ok(other),
    }
}

fn secs(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    Ok(positive(lookup, var)?.map(|n| Duration::from_secs(n as u64)))
}
