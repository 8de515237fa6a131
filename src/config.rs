use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    /// Lifetime of an issued code.
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub otp: OtpConfig,
    pub smtp: Option<SmtpConfig>,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

const OTP_TTL_MAX_MINUTES: i64 = 24 * 60;

/// Code lifetime in minutes. Unset means 5; anything outside
/// `1..=1440` or not an integer is rejected at startup.
fn parse_otp_ttl(raw: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(5);
    };
    let minutes: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("OTP_TTL_MINUTES {raw:?} is not an integer"))?;
    if !(1..=OTP_TTL_MAX_MINUTES).contains(&minutes) {
        anyhow::bail!("OTP_TTL_MINUTES must be between 1 and {OTP_TTL_MAX_MINUTES}, got {minutes}");
    }
    Ok(minutes)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match std::env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("postgres") | Err(_) => StoreBackend::Postgres,
            Ok(other) => anyhow::bail!("unknown STORE_BACKEND {other:?}"),
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set for the postgres backend");
        }

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "notepass".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "notepass-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
        };

        let otp = OtpConfig {
            ttl_minutes: parse_otp_ttl(std::env::var("OTP_TTL_MINUTES").ok().as_deref())?,
        };

        let smtp = match std::env::var("SMTP_HOST") {
            Ok(host) => Some(SmtpConfig {
                host,
                port: env_parse("SMTP_PORT", 587),
                username: std::env::var("SMTP_USERNAME").ok(),
                password: std::env::var("SMTP_PASSWORD").ok(),
                from: std::env::var("SMTP_FROM").context("SMTP_FROM is required with SMTP_HOST")?,
            }),
            Err(_) => None,
        };

        Ok(Self {
            backend,
            database_url,
            jwt,
            otp,
            smtp,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: None,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
            otp: OtpConfig { ttl_minutes: 5 },
            smtp: None,
        }
    }
}
