use std::env;
use std::net::{IpAddr, SocketAddr};

use cartonizer_core::Parameters;
use tracing::warn;

/// Service configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    /// Tenant defaults applied when a request omits `parameters`
    pub parameters: Parameters,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            parameters: parameters_from_env(),
        }
    }
}

/// Bind address of the HTTP server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: IpAddr = IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED);
    const DEFAULT_PORT: u16 = 3000;

    fn from_env() -> Self {
        let bind_ip = match env_string("CARTONIZER_API_HOST") {
            Some(raw) => raw.parse::<IpAddr>().unwrap_or_else(|err| {
                warn!(
                    "Could not parse CARTONIZER_API_HOST ('{}'): {}. Using {}.",
                    raw,
                    err,
                    Self::DEFAULT_HOST
                );
                Self::DEFAULT_HOST
            }),
            None => Self::DEFAULT_HOST,
        };

        let port = match env_string("CARTONIZER_API_PORT") {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                _ => {
                    warn!(
                        "CARTONIZER_API_PORT ('{}') is not a valid port. Using {}.",
                        raw,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self { bind_ip, port }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }
}

fn parameters_from_env() -> Parameters {
    let defaults = Parameters::default();

    Parameters {
        fill_rate_threshold: load_f64(
            "CARTONIZER_FILL_RATE_THRESHOLD",
            defaults.fill_rate_threshold,
            |v| (0.0..=100.0).contains(&v),
            "must be between 0 and 100",
        ),
        packing_efficiency: load_f64(
            "CARTONIZER_PACKING_EFFICIENCY",
            defaults.packing_efficiency,
            |v| v > 0.0 && v <= 100.0,
            "must be greater than 0 and at most 100",
        ),
        dimensional_weight_factor: load_f64(
            "CARTONIZER_DIM_WEIGHT_FACTOR",
            defaults.dimensional_weight_factor,
            |v| v > 0.0,
            "must be greater than 0",
        ),
        max_package_weight: load_f64(
            "CARTONIZER_MAX_PACKAGE_WEIGHT",
            defaults.max_package_weight,
            |v| v > 0.0,
            "must be greater than 0",
        ),
        allow_partial_fill: env_string("CARTONIZER_ALLOW_PARTIAL_FILL")
            .and_then(|raw| parse_bool(&raw, "CARTONIZER_ALLOW_PARTIAL_FILL"))
            .unwrap_or(defaults.allow_partial_fill),
        ..defaults
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!("Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            warn!(
                "Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}

fn load_f64(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
) -> f64 {
    let Some(raw) = env_string(var_name) else {
        return default;
    };

    match raw.parse::<f64>() {
        Ok(value) if validator(value) => value,
        Ok(_) => {
            warn!(
                "{} contains invalid value '{}': {}. Using {}.",
                var_name, raw, invalid_hint, default
            );
            default
        }
        Err(err) => {
            warn!(
                "Could not parse {} ('{}') as number: {}. Using {}.",
                var_name, raw, err, default
            );
            default
        }
    }
}
