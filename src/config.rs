use std::env;
use std::str::FromStr;

/// Cookie name used by the user authentication service
pub const SERVICE_SESSION_COOKIE: &str = "session_id";

const DEFAULT_SESSION_NAME: &str = "_my_session_id";
const DEFAULT_EXCLUDED_PATHS: [&str; 4] = [
    "/api/v1/status/",
    "/api/v1/unauthorized/",
    "/api/v1/forbidden/",
    "/api/v1/auth_session/login/",
];

/// Authentication strategy guarding the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    /// No gate at all
    Disabled,
    /// Gate every non-excluded path, resolve nobody
    Auth,
    Basic,
    Session,
}

impl FromStr for AuthType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Ok(Self::Disabled),
            "auth" => Ok(Self::Auth),
            "basic_auth" => Ok(Self::Basic),
            "session_auth" => Ok(Self::Session),
            other => Err(ConfigError::InvalidValue(format!("AUTH_TYPE={other}"))),
        }
    }
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Bind address
    pub bind_addr: String,
    /// SQLite database URL
    pub database_url: String,
    pub auth_type: AuthType,
    /// Cookie carrying the API session id
    pub session_name: String,
    /// Paths reachable without authentication, each ending in a slash
    pub excluded_paths: Vec<String>,
    /// CORS allowed origins (comma-separated in env var, `*` for any)
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            port: env::var("API_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            bind_addr: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://auth.db".to_string()),
            auth_type: env::var("AUTH_TYPE")
                .map(|v| v.parse::<AuthType>())
                .unwrap_or(Ok(AuthType::Disabled))?,
            session_name: env::var("SESSION_NAME")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string()),
            excluded_paths: env::var("EXCLUDED_PATHS")
                .map(|s| split_list(&s))
                .unwrap_or_else(|_| DEFAULT_EXCLUDED_PATHS.iter().map(|p| p.to_string()).collect()),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|s| split_list(&s))
                .unwrap_or_else(|_| vec!["*".to_string()]),
        })
    }

    /// Get the full bind address (addr:port)
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            bind_addr: "0.0.0.0".to_string(),
            database_url: "sqlite://auth.db".to_string(),
            auth_type: AuthType::Disabled,
            session_name: DEFAULT_SESSION_NAME.to_string(),
            excluded_paths: DEFAULT_EXCLUDED_PATHS.iter().map(|p| p.to_string()).collect(),
            cors_origins: vec!["*".to_string()],
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 7] = [
        "API_PORT",
        "API_HOST",
        "DATABASE_URL",
        "AUTH_TYPE",
        "SESSION_NAME",
        "EXCLUDED_PATHS",
        "CORS_ORIGINS",
    ];

    #[test]
    fn test_defaults() {
        temp_env::with_vars_unset(VARS, || {
            let config = ServerConfig::from_env().unwrap();
            assert_eq!(config.port, 5000);
            assert_eq!(config.bind_address(), "0.0.0.0:5000");
            assert_eq!(config.auth_type, AuthType::Disabled);
            assert_eq!(config.session_name, "_my_session_id");
            assert_eq!(config.excluded_paths.len(), 4);
            assert!(config.excluded_paths.contains(&"/api/v1/status/".to_string()));
            assert_eq!(config.cors_origins, vec!["*".to_string()]);
        });
    }

    #[test]
    fn test_from_env_values() {
        temp_env::with_vars(
            [
                ("API_PORT", Some("8080")),
                ("API_HOST", Some("127.0.0.1")),
                ("AUTH_TYPE", Some("session_auth")),
                ("SESSION_NAME", Some("sid")),
                ("EXCLUDED_PATHS", Some("/a/, /b/ ,")),
            ],
            || {
                let config = ServerConfig::from_env().unwrap();
                assert_eq!(config.bind_address(), "127.0.0.1:8080");
                assert_eq!(config.auth_type, AuthType::Session);
                assert_eq!(config.session_name, "sid");
                assert_eq!(config.excluded_paths, vec!["/a/".to_string(), "/b/".to_string()]);
            },
        );
    }

    #[test]
    fn test_invalid_values() {
        temp_env::with_var("API_PORT", Some("not-a-port"), || {
            assert!(matches!(ServerConfig::from_env(), Err(ConfigError::InvalidPort)));
        });
        temp_env::with_vars(
            [("API_PORT", None), ("AUTH_TYPE", Some("oauth"))],
            || {
                assert!(matches!(
                    ServerConfig::from_env(),
                    Err(ConfigError::InvalidValue(_))
                ));
            },
        );
    }

    #[test]
    fn test_parse_auth_type() {
        assert_eq!("auth".parse::<AuthType>().unwrap(), AuthType::Auth);
        assert_eq!("basic_auth".parse::<AuthType>().unwrap(), AuthType::Basic);
        assert_eq!("".parse::<AuthType>().unwrap(), AuthType::Disabled);
        assert!("digest".parse::<AuthType>().is_err());
    }
}
