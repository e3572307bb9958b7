//! Server settings loaded from environment variables.
//!
//! The `.env` file is read by `main` before this runs, so values may come
//! from either the real environment or that file.

use crate::errors::{Error, Result};
use std::net::SocketAddr;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_CONFIG_PATH: &str = "config.toml";
const MIN_SECRET_LEN: usize = 32;

/// Runtime settings for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to
    pub bind_addr: SocketAddr,
    /// HMAC secret used to verify bearer tokens
    pub jwt_secret: String,
    /// Path of the optional seed file
    pub seed_path: String,
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `JWT_SECRET` and `CANTEEN_CONFIG`.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if `JWT_SECRET` is missing or shorter than
    /// 32 characters, or if `BIND_ADDR` is not a socket address.
    pub fn from_env() -> Result<Self> {
        let bind_raw =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| Error::Config {
            message: "JWT_SECRET must be set".to_string(),
        })?;
        let seed_path =
            std::env::var("CANTEEN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        Self::new(&bind_raw, jwt_secret, seed_path)
    }

    /// Builds and validates a config from raw values.
    pub fn new(bind_addr: &str, jwt_secret: String, seed_path: String) -> Result<Self> {
        let bind_addr = bind_addr.parse().map_err(|e| Error::Config {
            message: format!("Invalid BIND_ADDR '{bind_addr}': {e}"),
        })?;

        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(Error::Config {
                message: format!("JWT_SECRET must be at least {MIN_SECRET_LEN} characters long"),
            });
        }

        Ok(Self {
            bind_addr,
            jwt_secret,
            seed_path,
        })
    }
}
