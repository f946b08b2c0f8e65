use crate::shared::AppError;

/// Startup configuration, read once in `main` and passed down explicitly.
/// Every required value must be present or the process refuses to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub session_expiration_days: i64,
    pub backend_url: String,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an injected lookup so tests don't have
    /// to mutate process-wide environment variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    AppError::Config(format!("missing required environment variable {}", key))
                })
        };

        let username = require("SMTP_USERNAME")?;
        let from_address = lookup("SMTP_FROM")
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| username.clone());

        Ok(Self {
            listen_addr: lookup("LISTEN_ADDR")
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            database_url: require("DATABASE_URL")?,
            jwt_secret: require("JWT_SECRET")?,
            session_expiration_days: lookup("SESSION_EXPIRATION_DAYS")
                .and_then(|value| value.parse().ok())
                .unwrap_or(7),
            backend_url: require("BACKEND_URL")?,
            smtp: SmtpConfig {
                host: require("SMTP_HOST")?,
                username,
                password: require("SMTP_PASSWORD")?,
                from_address,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/userauth"),
            ("JWT_SECRET", "top-secret"),
            ("BACKEND_URL", "https://auth.example.com"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USERNAME", "mailer@example.com"),
            ("SMTP_PASSWORD", "app-password"),
        ])
    }

    fn lookup_in<'a>(env: &'a HashMap<&'static str, &'static str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| env.get(key).map(|value| value.to_string())
    }

    #[test]
    fn test_complete_environment_loads() {
        let env = full_env();
        let config = AppConfig::from_lookup(lookup_in(&env)).unwrap();

        assert_eq!(config.database_url, "postgres://localhost/userauth");
        assert_eq!(config.jwt_secret, "top-secret");
        assert_eq!(config.backend_url, "https://auth.example.com");
        assert_eq!(config.smtp.host, "smtp.example.com");
    }

    #[test]
    fn test_defaults_applied() {
        let env = full_env();
        let config = AppConfig::from_lookup(lookup_in(&env)).unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:3000");
        assert_eq!(config.session_expiration_days, 7);
        // From address falls back to the SMTP username
        assert_eq!(config.smtp.from_address, "mailer@example.com");
    }

    #[test]
    fn test_missing_required_variable_is_named() {
        let mut env = full_env();
        env.remove("JWT_SECRET");

        let result = AppConfig::from_lookup(lookup_in(&env));
        match result {
            Err(AppError::Config(msg)) => assert!(msg.contains("JWT_SECRET")),
            other => panic!("expected Config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut env = full_env();
        env.insert("DATABASE_URL", "");

        let result = AppConfig::from_lookup(lookup_in(&env));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_overrides_respected() {
        let mut env = full_env();
        env.insert("LISTEN_ADDR", "127.0.0.1:8080");
        env.insert("SESSION_EXPIRATION_DAYS", "30");
        env.insert("SMTP_FROM", "no-reply@example.com");

        let config = AppConfig::from_lookup(lookup_in(&env)).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.session_expiration_days, 30);
        assert_eq!(config.smtp.from_address, "no-reply@example.com");
    }
}
