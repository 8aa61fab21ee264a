use neighborly_errors::AppError;
use std::str::FromStr;
use std::time::Duration;

/// Runtime settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Postgres URL. `None` selects the in-memory backend.
    pub database_url: Option<String>,
    pub refresh_interval: Duration,
    pub allow_dev_login: bool,
    pub writes_per_minute: u32,
    pub writes_per_hour: u32,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`. Only
    /// safe behind a proxy that overwrites those headers.
    pub trust_forwarded_for: bool,
    /// Display names that `dev-login` signs in as admins, so a fresh
    /// deployment has someone who can assign roles.
    pub admin_names: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            refresh_interval: Duration::from_secs(30),
            allow_dev_login: false,
            writes_per_minute: 20,
            writes_per_hour: 200,
            trust_forwarded_for: false,
            admin_names: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();
        let refresh_secs = parse_or(&lookup, "REFRESH_INTERVAL_SECS", defaults.refresh_interval.as_secs())?;
        if refresh_secs == 0 {
            return Err(AppError::invalid("REFRESH_INTERVAL_SECS must be at least 1"));
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            refresh_interval: Duration::from_secs(refresh_secs),
            allow_dev_login: parse_or(&lookup, "ALLOW_DEV_LOGIN", defaults.allow_dev_login)?,
            writes_per_minute: parse_or(&lookup, "WRITES_PER_MINUTE", defaults.writes_per_minute)?,
            writes_per_hour: parse_or(&lookup, "WRITES_PER_HOUR", defaults.writes_per_hour)?,
            trust_forwarded_for: parse_or(&lookup, "TRUST_FORWARDED_FOR", defaults.trust_forwarded_for)?,
            admin_names: lookup("ADMIN_NAMES")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError> {
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| AppError::invalid(format!("{key} has an invalid value: {raw}"))),
        _ => Ok(default),
    }
}
