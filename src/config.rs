// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup; invalid values abort the process before it binds.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_SECRET` | HMAC key for signing access tokens | Required |
//! | `JWT_EXPIRATION_SECS` | Access token lifetime in seconds | `86400` |
//! | `BCRYPT_COST` | bcrypt work factor for stored secrets | `10` |
//! | `DATA_DIR` | Root directory for the identity store | unset (in-memory) |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` | PEM certificate chain, enables HTTPS | unset |
//! | `TLS_KEY_PATH` | PEM private key, enables HTTPS | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::auth::password::DEFAULT_BCRYPT_COST;
use crate::auth::token::TokenConfig;

/// Environment variable holding the token signing key.
///
/// Every running instance must share the same key, otherwise tokens issued
/// by one are rejected by the others.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

/// Environment variable for the token lifetime, in seconds.
pub const JWT_EXPIRATION_ENV: &str = "JWT_EXPIRATION_SECS";

pub const BCRYPT_COST_ENV: &str = "BCRYPT_COST";

/// Environment variable name for the identity store directory.
///
/// When unset, identities live in memory and vanish on restart.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default token lifetime: one day.
pub const DEFAULT_JWT_EXPIRATION_SECS: u64 = 86_400;
pub const DEFAULT_PORT: u16 = 8080;

/// Default `RUST_LOG` filter when the variable is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// bcrypt accepts work factors in this range.
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// Configuration errors, all fatal at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::invalid(
                LOG_FORMAT_ENV,
                format!("expected `json` or `pretty`, got `{other}`"),
            )),
        }
    }
}

/// Certificate and key files for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub token: TokenConfig,
    pub bcrypt_cost: u32,
    pub data_dir: Option<PathBuf>,
    pub bind_addr: SocketAddr,
    pub tls: Option<TlsPaths>,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let secret = var(JWT_SECRET_ENV).ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;
        let lifetime_secs = parse_or(
            var(JWT_EXPIRATION_ENV),
            JWT_EXPIRATION_ENV,
            DEFAULT_JWT_EXPIRATION_SECS,
        )?;
        let token = TokenConfig::new(secret, Duration::from_secs(lifetime_secs))?;

        let bcrypt_cost = parse_or(var(BCRYPT_COST_ENV), BCRYPT_COST_ENV, DEFAULT_BCRYPT_COST)?;
        if !BCRYPT_COST_RANGE.contains(&bcrypt_cost) {
            return Err(ConfigError::invalid(
                BCRYPT_COST_ENV,
                format!(
                    "must be between {} and {}",
                    BCRYPT_COST_RANGE.start(),
                    BCRYPT_COST_RANGE.end()
                ),
            ));
        }

        let host = parse_or(var(HOST_ENV), HOST_ENV, IpAddr::V4(Ipv4Addr::UNSPECIFIED))?;
        let port = parse_or(var(PORT_ENV), PORT_ENV, DEFAULT_PORT)?;

        let tls = match (var(TLS_CERT_PATH_ENV), var(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::invalid(
                    TLS_KEY_PATH_ENV,
                    format!("must be set together with {TLS_CERT_PATH_ENV}"),
                ))
            }
            (None, Some(_)) => {
                return Err(ConfigError::invalid(
                    TLS_CERT_PATH_ENV,
                    format!("must be set together with {TLS_KEY_PATH_ENV}"),
                ))
            }
        };

        Ok(Self {
            token,
            bcrypt_cost,
            data_dir: var(DATA_DIR_ENV).map(PathBuf::from),
            bind_addr: SocketAddr::new(host, port),
            tls,
        })
    }
}

/// Log format from the process environment.
///
/// Read separately from [`AppConfig`] so logging is up before the rest of
/// the configuration is validated.
pub fn log_format_from_env() -> Result<LogFormat, ConfigError> {
    std::env::var(LOG_FORMAT_ENV)
        .ok()
        .map(|v| v.parse())
        .transpose()
        .map(Option::unwrap_or_default)
}

fn parse_or<T>(raw: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid(var, format!("`{raw}`: {e}"))),
        None => Ok(default),
    }
}
