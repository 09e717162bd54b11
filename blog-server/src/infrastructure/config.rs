use anyhow::{anyhow, Context, Result};

/// Server settings read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub session_cookie_secure: bool,
    pub http_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{} must be set", key))
        };

        let database_url = required("DATABASE_URL")?;
        let session_secret = required("SESSION_SECRET")?;

        let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS is not a number: {}", v))?,
            None => 5,
        };

        let session_ttl_hours = match lookup("SESSION_TTL_HOURS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("SESSION_TTL_HOURS is not a number: {}", v))?,
            None => 24,
        };
        if session_ttl_hours <= 0 {
            return Err(anyhow!("SESSION_TTL_HOURS must be positive"));
        }

        let session_cookie_secure = lookup("SESSION_COOKIE_SECURE")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let http_port = match lookup("HTTP_PORT") {
            Some(v) => v
                .parse()
                .with_context(|| format!("HTTP_PORT is not a valid port: {}", v))?,
            None => 3000,
        };

        Ok(Self {
            database_url,
            database_max_connections,
            session_secret,
            session_ttl_hours,
            session_cookie_secure,
            http_port,
        })
    }

    pub fn http_addr(&self) -> String {
        format!("0.0.0.0:{}", self.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/blog"),
            ("SESSION_SECRET", "s3cr3t"),
        ]))
        .unwrap();

        assert_eq!(config.http_port, 3000);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.session_ttl_hours, 24);
        assert!(!config.session_cookie_secure);
        assert_eq!(config.http_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn missing_required_value_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")]))
            .unwrap_err();
        assert!(err.to_string().contains("SESSION_SECRET"));
    }

    #[test]
    fn invalid_port_is_an_error() {
        let result = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("SESSION_SECRET", "s"),
            ("HTTP_PORT", "eighty"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn reads_process_environment() {
        std::env::set_var("DATABASE_URL", "postgres://env/blog");
        std::env::set_var("SESSION_SECRET", "from-env");
        std::env::set_var("SESSION_COOKIE_SECURE", "true");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.database_url, "postgres://env/blog");
        assert!(config.session_cookie_secure);

        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("SESSION_SECRET");
        std::env::remove_var("SESSION_COOKIE_SECURE");
    }
}
