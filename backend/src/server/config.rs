//! Server configuration loaded from the environment.
//!
//! A missing `DATABASE_URL` is fatal: the process refuses to start rather
//! than run without its store.

use std::env;
use std::net::SocketAddr;

use actix_web::cookie::Key;
use tracing::warn;

/// Runtime configuration for the HTTP server.
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cookie_secure: bool,
    pub session_key: Key,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// - `DATABASE_URL` (required) — PostgreSQL connection string.
    /// - `BIND_ADDR` (default `0.0.0.0:8080`).
    /// - `SESSION_COOKIE_SECURE` (default on; set `0` to disable).
    /// - `SESSION_KEY_FILE` (default `/var/run/secrets/session_key`); when
    ///   unreadable, debug builds and `SESSION_ALLOW_EPHEMERAL=1` fall back
    ///   to a temporary key.
    pub fn from_env() -> std::io::Result<Self> {
        let database_url = env::var("DATABASE_URL").map_err(|_| {
            std::io::Error::other(
                "DATABASE_URL is not set; refusing to start without a configured store",
            )
        })?;

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_owned())
            .parse()
            .map_err(|err| std::io::Error::other(format!("invalid BIND_ADDR: {err}")))?;

        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .map(|v| v != "0")
            .unwrap_or(true);

        let key_path = env::var("SESSION_KEY_FILE")
            .unwrap_or_else(|_| "/var/run/secrets/session_key".to_owned());
        let session_key = match std::fs::read(&key_path) {
            Ok(bytes) => Key::derive_from(&bytes),
            Err(err) => {
                let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
                if cfg!(debug_assertions) || allow_dev {
                    warn!(path = %key_path, error = %err, "using temporary session key (dev only)");
                    Key::generate()
                } else {
                    return Err(std::io::Error::other(format!(
                        "failed to read session key at {key_path}: {err}"
                    )));
                }
            }
        };

        Ok(Self {
            database_url,
            bind_addr,
            cookie_secure,
            session_key,
        })
    }
}
