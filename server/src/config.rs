use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub cors_allowed_origins: Vec<String>,
    /// Per-request budget for store calls; `None` disables it.
    pub store_timeout: Option<Duration>,
    pub skip_seed: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let store_timeout = match std::env::var("STORE_TIMEOUT_MS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => Some(Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS)),
        };

        let cors_allowed_origins = parse_origins(
            &std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.into()),
        );

        let skip_seed = std::env::var("SKIP_SEED")
            .ok()
            .map(|val| flag(&val))
            .unwrap_or(false);

        Ok(Self {
            cors_allowed_origins,
            store_timeout,
            skip_seed,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cors_allowed_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            store_timeout: Some(Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS)),
            skip_seed: false,
        }
    }
}

fn parse_timeout(raw: &str) -> Result<Option<Duration>> {
    let millis: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid STORE_TIMEOUT_MS `{raw}`"))?;
    Ok((millis > 0).then(|| Duration::from_millis(millis)))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn flag(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "1" | "true" | "yes")
}
