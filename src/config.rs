//! We can have a little hard-coded config, [as a
//! snack](https://knowyourmeme.com/memes/cats-can-have-a-little-salami).
//! Everything that changes between deployments comes from the environment.

use anyhow::{bail, Context, Result};
use std::net::SocketAddr;

/// Every note lives under this key prefix in the store.
pub const NOTE_PREFIX: &str = "note:";

/// How long a toast stays on screen before it removes itself.
pub const TOAST_DURATION_MS: u64 = 2000;

/// The app does a single store call per request, so a handful of connections
/// is plenty.
pub const PG_MAX_CONNECTIONS: u32 = 5;

const DEFAULT_ADDR: &str = "127.0.0.1:8000";

#[derive(Clone, Debug, PartialEq)]
pub enum StoreConfig {
    Memory,
    Postgres { url: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub addr: SocketAddr,
    pub store: StoreConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr: SocketAddr = lookup("NOTES_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.to_string())
            .parse()
            .context("NOTES_ADDR must be a socket address like 127.0.0.1:8000")?;

        let store = match lookup("NOTES_STORE").as_deref() {
            None | Some("postgres") => StoreConfig::Postgres {
                url: postgres_url(&lookup)?,
            },
            Some("memory") => StoreConfig::Memory,
            Some(other) => bail!(
                "NOTES_STORE must be `postgres` or `memory`, got `{other}`"
            ),
        };

        Ok(Config { addr, store })
    }
}

fn postgres_url<F>(lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &str| {
        lookup(key).with_context(|| {
            format!("{key} must be defined in the environment")
        })
    };
    let pg_usr = required("POSTGRES_USER")?;
    let pg_pw = required("POSTGRES_PASSWORD")?;
    let pg_db = required("POSTGRES_DB")?;
    let pg_host =
        lookup("POSTGRES_HOST").unwrap_or_else(|| "localhost".to_string());

    Ok(format!("postgres://{pg_usr}:{pg_pw}@{pg_host}:5432/{pg_db}"))
}
