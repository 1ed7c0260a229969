use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokensmith_auth::config::AuthConfig;
use tokensmith_auth_postgres::PostgresConfig;
use tokensmith_notifications::NotificationsConfig;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Token issuance and rotation
    #[serde(default)]
    pub auth: AuthConfig,
    /// Anomaly notifications
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.storage.backend == StorageBackend::Postgres && self.storage.postgres.url.is_empty()
        {
            return Err("storage.backend = \"postgres\" requires storage.postgres.url".into());
        }
        if self.storage.postgres.pool_size == 0 {
            return Err("storage.postgres.pool_size must be > 0".into());
        }
        self.auth.validate().map_err(|e| format!("auth: {e}"))?;
        self.notifications
            .validate()
            .map_err(|e| format!("notifications: {e}"))?;
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Where refresh credential records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local map; records are lost on restart
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub postgres: PostgresConfig,
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_PATH: &str = "tokensmith.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., TOKENSMITH__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("TOKENSMITH")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokensmith_notifications::SinkKind;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn valid() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.auth.tokens.signing_secret = SECRET.into();
        cfg
    }

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(cfg.addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn default_config_needs_signing_secret() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(err.contains("signing_secret"), "{err}");
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn postgres_backend_needs_url() {
        let mut cfg = valid();
        cfg.storage.backend = StorageBackend::Postgres;
        assert!(cfg.validate().is_err());
        cfg.storage.postgres.url = "postgres://localhost/tokensmith".into();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut cfg = valid();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parses_toml() {
        let cfg: AppConfig = toml::from_str(&format!(
            r#"
            [server]
            port = 9090

            [storage]
            backend = "postgres"

            [storage.postgres]
            url = "postgres://app:secret@db/tokensmith"
            pool_size = 4

            [auth.tokens]
            signing_secret = "{SECRET}"
            access_token_lifetime = "5m"
            refresh_token_lifetime = "30days"

            [auth.client_ip]
            trust_forwarded_headers = true

            [notifications]
            sink = "webhook"

            [notifications.webhook]
            url = "https://alerts.example.com/hook"
            "#
        ))
        .unwrap();

        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.storage.backend, StorageBackend::Postgres);
        assert_eq!(cfg.storage.postgres.pool_size, 4);
        assert_eq!(
            cfg.auth.tokens.access_token_lifetime,
            Duration::from_secs(300)
        );
        assert_eq!(
            cfg.auth.tokens.refresh_token_lifetime,
            Duration::from_secs(30 * 86_400)
        );
        assert!(cfg.auth.client_ip.trust_forwarded_headers);
        assert!(cfg.auth.cookies.secure);
        assert_eq!(cfg.notifications.sink, SinkKind::Webhook);
        assert!(cfg.validate().is_ok());
    }
}
