use std::path::PathBuf;

use anyhow::{Context, Result};

/// Server settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub db_path: PathBuf,
    /// Built frontend bundle (`index.html`, hashed js/wasm).
    pub dist_dir: PathBuf,
    /// Unhashed static files served under `/static`.
    pub assets_dir: PathBuf,
    /// User granted the admin role at startup, if set.
    pub bootstrap_admin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match get("PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got {port:?}"))?,
            None => 3000,
        };

        Ok(Config {
            port,
            db_path: get("DB_PATH")
                .unwrap_or_else(|| "data/relief.redb".to_string())
                .into(),
            dist_dir: get("DIST_DIR").unwrap_or_else(|| "dist".to_string()).into(),
            assets_dir: get("ASSETS_DIR")
                .unwrap_or_else(|| "assets".to_string())
                .into(),
            bootstrap_admin: get("BOOTSTRAP_ADMIN")
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
        })
    }
}
