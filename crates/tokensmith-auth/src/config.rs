//! Configuration for credential issuance and rotation.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth.tokens]
//! signing_secret = "a-random-value-of-at-least-32-bytes!!"
//! access_token_lifetime = "15m"
//! refresh_token_lifetime = "7d"
//!
//! [auth.hashing]
//! memory_kib = 19456
//! iterations = 2
//! parallelism = 1
//!
//! [auth.cookies]
//! secure = true
//! same_site = "strict"
//!
//! [auth.client_ip]
//! trust_forwarded_headers = false
//! ```

use std::fmt;
use std::time::Duration;

use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

/// Minimum length of the HMAC signing secret in bytes.
pub const MIN_SIGNING_SECRET_LEN: usize = 32;

/// Top-level auth configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    pub tokens: TokenConfig,
    pub hashing: HashingConfig,
    pub cookies: CookieConfig,
    pub client_ip: ClientIpConfig,
}

/// Token signing and lifetime settings.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Symmetric key for HS512 access credentials.
    pub signing_secret: String,

    /// Access credential lifetime.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Refresh credential lifetime, measured from issuance.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            signing_secret: String::new(),
            access_token_lifetime: Duration::from_secs(15 * 60),
            refresh_token_lifetime: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("signing_secret", &"[REDACTED]")
            .field("access_token_lifetime", &self.access_token_lifetime)
            .field("refresh_token_lifetime", &self.refresh_token_lifetime)
            .finish()
    }
}

/// Argon2id cost parameters for refresh secret digests.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct HashingConfig {
    /// Memory cost in KiB.
    pub memory_kib: u32,

    /// Number of passes.
    pub iterations: u32,

    /// Degree of parallelism (lanes).
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

impl HashingConfig {
    /// Builds the Argon2 parameter set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if Argon2 rejects the combination.
    pub fn params(&self) -> Result<argon2::Params, ConfigError> {
        argon2::Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| ConfigError::InvalidValue(format!("hashing parameters: {}", e)))
    }
}

/// `SameSite` attribute for credential cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    #[default]
    Strict,
    Lax,
    None,
}

impl From<SameSitePolicy> for SameSite {
    fn from(policy: SameSitePolicy) -> Self {
        match policy {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::None => SameSite::None,
        }
    }
}

/// Cookie transport settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie carrying the access credential.
    pub access_name: String,

    /// Cookie carrying the refresh secret.
    pub refresh_name: String,

    /// Set the `Secure` attribute.
    pub secure: bool,

    /// Set the `HttpOnly` attribute.
    pub http_only: bool,

    pub same_site: SameSitePolicy,

    pub path: String,

    pub domain: Option<String>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            access_name: "access_token".to_string(),
            refresh_name: "refresh_token".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSitePolicy::Strict,
            path: "/".to_string(),
            domain: None,
        }
    }
}

impl CookieConfig {
    /// Builds a credential cookie whose `Max-Age` equals `max_age`.
    #[must_use]
    pub fn build_cookie(&self, name: &str, value: String, max_age: Duration) -> Cookie<'static> {
        let max_age =
            time::Duration::seconds(i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX));

        let mut builder = Cookie::build((name.to_string(), value))
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(self.same_site.into())
            .path(self.path.clone())
            .max_age(max_age);

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }

        builder.build()
    }
}

/// Client origin resolution settings.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientIpConfig {
    /// Prefer `X-Forwarded-For` / `X-Real-IP` over the TCP peer address.
    ///
    /// Enable only behind a proxy that overwrites these headers.
    pub trust_forwarded_headers: bool,
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the signing secret is empty, and
    /// `ConfigError::InvalidValue` if:
    /// - The signing secret is shorter than 32 bytes
    /// - A token lifetime is zero
    /// - Argon2 rejects the hashing parameters
    /// - A cookie name is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tokens.signing_secret.is_empty() {
            return Err(ConfigError::Missing(
                "auth.tokens.signing_secret".to_string(),
            ));
        }
        if self.tokens.signing_secret.len() < MIN_SIGNING_SECRET_LEN {
            return Err(ConfigError::InvalidValue(format!(
                "auth.tokens.signing_secret must be at least {} bytes",
                MIN_SIGNING_SECRET_LEN
            )));
        }

        if self.tokens.access_token_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "access_token_lifetime must be > 0".to_string(),
            ));
        }
        if self.tokens.refresh_token_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "refresh_token_lifetime must be > 0".to_string(),
            ));
        }

        self.hashing.params()?;

        if self.cookies.access_name.is_empty() || self.cookies.refresh_name.is_empty() {
            return Err(ConfigError::InvalidValue(
                "cookie names cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AuthConfig {
        let mut config = AuthConfig::default();
        config.tokens.signing_secret = "0123456789abcdef0123456789abcdef".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.tokens.access_token_lifetime, Duration::from_secs(900));
        assert_eq!(
            config.tokens.refresh_token_lifetime,
            Duration::from_secs(604_800)
        );
        assert_eq!(config.hashing.memory_kib, 19 * 1024);
        assert_eq!(config.hashing.iterations, 2);
        assert_eq!(config.hashing.parallelism, 1);
        assert!(!config.client_ip.trust_forwarded_headers);
    }

    #[test]
    fn test_missing_signing_secret() {
        let err = AuthConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_short_signing_secret() {
        let mut config = valid_config();
        config.tokens.signing_secret = "too-short".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_zero_lifetime_rejected() {
        let mut config = valid_config();
        config.tokens.refresh_token_lifetime = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_hashing_params_rejected() {
        let mut config = valid_config();
        config.hashing.parallelism = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_humantime_durations() {
        let config: AuthConfig = serde_json::from_str(
            r#"{"tokens": {"signing_secret": "x", "access_token_lifetime": "5m", "refresh_token_lifetime": "2days"}}"#,
        )
        .unwrap();
        assert_eq!(config.tokens.access_token_lifetime, Duration::from_secs(300));
        assert_eq!(
            config.tokens.refresh_token_lifetime,
            Duration::from_secs(2 * 86_400)
        );
    }

    #[test]
    fn test_debug_redacts_signing_secret() {
        let config = valid_config();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("0123456789abcdef"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_cookie_config_build_cookie() {
        let config = CookieConfig::default();

        let cookie = config
            .build_cookie("refresh_token", "my_token_value".to_string(), Duration::from_secs(3600))
            .to_string();
        assert!(cookie.contains("refresh_token=my_token_value"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn test_cookie_config_insecure_with_domain() {
        let config = CookieConfig {
            secure: false,
            same_site: SameSitePolicy::Lax,
            domain: Some("example.com".to_string()),
            ..CookieConfig::default()
        };

        let cookie = config
            .build_cookie("access_token", "v".to_string(), Duration::from_secs(60))
            .to_string();
        assert!(!cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Domain=example.com"));
    }
}
