use std::{env, fmt::Display, str::FromStr};

use crate::constants::{DEFAULT_STEP_MINUTES, SUGGESTION_DEBOUNCE_MS, SUGGESTION_LIMIT};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: Option<String>,
    pub session_secret: String,
    pub suggestion_debounce_ms: u64,
    pub suggestion_limit: i64,
    pub step_minutes: u32,
}

impl Config {
    pub fn load() -> Self {
        Self {
            database_url: try_load("DATABASE_URL", String::from("postgres://localhost/coctelera")),
            database_max_connections: try_load("DATABASE_MAX_CONNECTIONS", 5),
            redis_url: var("REDIS_URL").ok(),
            session_secret: try_load("SESSION_SECRET", String::from("secret")),
            suggestion_debounce_ms: try_load("SUGGESTION_DEBOUNCE_MS", SUGGESTION_DEBOUNCE_MS),
            suggestion_limit: try_load("SUGGESTION_LIMIT", SUGGESTION_LIMIT),
            step_minutes: try_load("STEP_MINUTES", DEFAULT_STEP_MINUTES),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::from("postgres://localhost/coctelera"),
            database_max_connections: 5,
            redis_url: None,
            session_secret: String::from("secret"),
            suggestion_debounce_ms: SUGGESTION_DEBOUNCE_MS,
            suggestion_limit: SUGGESTION_LIMIT,
            step_minutes: DEFAULT_STEP_MINUTES,
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        log::debug!("Environment variable {key} not found");
    })
}

fn try_load<T: FromStr + Display>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match var(key) {
        Ok(value) => parse_or(key, &value, default),
        Err(_) => {
            log::info!("{key} not set, using default: {default}");
            default
        }
    }
}

/// Parses `value`, falling back to `default` when it is malformed.
fn parse_or<T: FromStr + Display>(key: &str, value: &str, default: T) -> T
where
    T::Err: Display,
{
    match value.trim().parse() {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Invalid {key} value: {e}, using default: {default}");
            default
        }
    }
}
