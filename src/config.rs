use std::fmt;

use serde::Deserialize;

#[derive(Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let secret = lookup("SECRET_KEY").unwrap_or_default();
        if secret.trim().is_empty() {
            anyhow::bail!("SECRET_KEY must be set to a non-empty value");
        }

        let jwt = JwtConfig {
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "moviereviews".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "moviereviews-users".into()),
            ttl_minutes: lookup("JWT_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(60),
        };

        let port = match lookup("PORT") {
            Some(v) => v
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("invalid PORT {:?}: {}", v, e))?,
            None => 3000,
        };

        Ok(Self {
            database_url,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            jwt,
        })
    }
}
