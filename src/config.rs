use std::str::FromStr;

use anyhow::Context;
use jsonwebtoken::Algorithm;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let database_max_connections = env_parse("DATABASE_MAX_CONNECTIONS").unwrap_or(10);
        let algorithm = match std::env::var("JWT_ALGORITHM") {
            Ok(raw) => parse_hmac_algorithm(&raw)?,
            Err(_) => Algorithm::HS256,
        };
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            algorithm,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "agenda".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "agenda-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES").unwrap_or(60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES").unwrap_or(60 * 24 * 14),
        };
        Ok(Self {
            database_url,
            database_max_connections,
            jwt,
        })
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

/// Tokens are signed with the shared secret, so only the HMAC family is accepted.
fn parse_hmac_algorithm(raw: &str) -> anyhow::Result<Algorithm> {
    let alg = Algorithm::from_str(raw.trim())
        .map_err(|e| anyhow::anyhow!("invalid JWT_ALGORITHM {raw:?}: {e}"))?;
    match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(alg),
        other => anyhow::bail!("JWT_ALGORITHM {other:?} is not supported with a shared secret"),
    }
}
