use anyhow::Context;
use serde::Deserialize;

/// Upper bound for `JWT_TTL_MINUTES` (one year).
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "titlevote".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "titlevote-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|v| (1..=MAX_TTL_MINUTES).contains(v))
                .unwrap_or(60),
        };
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        Ok(Self {
            database_url,
            max_connections,
            jwt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the env mutations below never race each other.
    #[test]
    fn from_env_applies_defaults_and_requires_secrets() {
        std::env::remove_var("JWT_SECRET");
        std::env::set_var("DATABASE_URL", "postgres://localhost/titlevote");
        let err = AppConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));

        std::env::set_var("JWT_SECRET", "s3cret");
        std::env::set_var("JWT_TTL_MINUTES", "not-a-number");
        std::env::remove_var("JWT_ISSUER");
        std::env::remove_var("DATABASE_MAX_CONNECTIONS");
        let cfg = AppConfig::from_env().expect("config loads");
        assert_eq!(cfg.jwt.secret, "s3cret");
        assert_eq!(cfg.jwt.issuer, "titlevote");
        assert_eq!(cfg.jwt.ttl_minutes, 60);
        assert_eq!(cfg.max_connections, 10);

        std::env::set_var("JWT_TTL_MINUTES", "15");
        let cfg = AppConfig::from_env().expect("config loads");
        assert_eq!(cfg.jwt.ttl_minutes, 15);

        let max = i64::MAX.to_string();
        for out_of_range in ["0", "-5", "1000000000000", max.as_str()] {
            std::env::set_var("JWT_TTL_MINUTES", out_of_range);
            let cfg = AppConfig::from_env().expect("config loads");
            assert_eq!(cfg.jwt.ttl_minutes, 60, "{out_of_range}");
        }

        std::env::remove_var("JWT_TTL_MINUTES");
        std::env::remove_var("JWT_SECRET");
        std::env::remove_var("DATABASE_URL");
    }
}
