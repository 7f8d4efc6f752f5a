use crate::auth::jwt::JwtConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("{0} must be set when APP_ENV=production")]
    MissingSecret(&'static str),
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In production,
/// override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Whether `APP_ENV` is `production`.
    pub production: bool,
    /// How often expired refresh-token records are purged (default: `3600`).
    pub refresh_sweep_interval_secs: u64,
    /// JWT token configuration (secrets, lifetimes).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, applying defaults.
    ///
    /// | Env Var                       | Default                    |
    /// |-------------------------------|----------------------------|
    /// | `HOST`                        | `0.0.0.0`                  |
    /// | `PORT`                        | `3000`                     |
    /// | `CORS_ORIGINS`                | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                       |
    /// | `APP_ENV`                     | `development`              |
    /// | `REFRESH_SWEEP_INTERVAL_SECS` | `3600`                     |
    ///
    /// JWT variables are documented on [`JwtConfig::from_lookup`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_var(&lookup, "PORT", 3000u16)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 30u64)?;
        let refresh_sweep_interval_secs =
            parse_var(&lookup, "REFRESH_SWEEP_INTERVAL_SECS", 3600u64)?;
        if refresh_sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "REFRESH_SWEEP_INTERVAL_SECS",
                reason: "must be greater than zero".into(),
            });
        }

        let production = lookup("APP_ENV")
            .is_some_and(|env| env.trim().eq_ignore_ascii_case("production"));

        let jwt = JwtConfig::from_lookup(&lookup, production)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            production,
            refresh_sweep_interval_secs,
            jwt,
        })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
    }
}

/// Longest accepted token lifetime (100 years), so expiry arithmetic cannot overflow.
const MAX_LIFETIME_SECS: i64 = 100 * 365 * 86_400;

/// Parse a lifetime such as `15m`, `7d`, `12h`, `30s` or bare seconds.
pub fn parse_duration_secs(var: &'static str, raw: &str) -> Result<i64, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        var,
        reason: format!("{reason}: {raw:?}"),
    };

    let raw = raw.trim();
    let (digits, multiplier) = match raw.chars().last() {
        Some('s') => (&raw[..raw.len() - 1], 1),
        Some('m') => (&raw[..raw.len() - 1], 60),
        Some('h') => (&raw[..raw.len() - 1], 3600),
        Some('d') => (&raw[..raw.len() - 1], 86_400),
        Some(c) if c.is_ascii_digit() => (raw, 1),
        _ => return Err(invalid("expected <number>[s|m|h|d]")),
    };

    let value: i64 = digits
        .trim()
        .parse()
        .map_err(|_| invalid("expected <number>[s|m|h|d]"))?;
    if value <= 0 {
        return Err(invalid("lifetime must be positive"));
    }
    value
        .checked_mul(multiplier)
        .filter(|secs| *secs <= MAX_LIFETIME_SECS)
        .ok_or_else(|| invalid("lifetime too long"))
}
