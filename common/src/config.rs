// common/src/config.rs
use config::{Config as ConfigFile, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Central configuration for the gateway process
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Directory served without authentication (favicon etc.)
    pub public_dir: PathBuf,

    pub auth: AuthConfig,
    pub upstream: UpstreamConfig,

    /// Application mounts, evaluated in order (first match wins)
    pub apps: Vec<AppConfig>,
}

/// Demo-mode single-user credential gate
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    pub cookie_name: String,
}

/// Fixed upstream origin the agent API prefix is forwarded to
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub origin: String,
    pub prefix: String,
    /// Whether the forwarded prefix sits behind the auth gate. The source
    /// system dispatched its proxy before the gate; keeping the prefix
    /// reachable without a login is now an explicit choice instead of a
    /// side effect of registration order.
    pub require_auth: bool,
    pub timeout_secs: u64,
}

/// One single-page application bundle mounted under a URL prefix
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub prefix: String,
    /// Build output directory holding the bundle and its entry document
    pub dir: PathBuf,
    /// Asset subdirectories mounted explicitly under the prefix
    #[serde(default)]
    pub asset_dirs: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            public_dir: PathBuf::from("public"),
            auth: AuthConfig::default(),
            upstream: UpstreamConfig::default(),
            apps: vec![
                AppConfig {
                    name: "AeroSole".to_string(),
                    prefix: "/aerosole".to_string(),
                    dir: PathBuf::from("AeroSole/dist"),
                    asset_dirs: vec!["assets".to_string()],
                },
                AppConfig {
                    name: "Express".to_string(),
                    prefix: "/express".to_string(),
                    dir: PathBuf::from("Express/dist"),
                    asset_dirs: vec![
                        "assets".to_string(),
                        "images".to_string(),
                        "videos".to_string(),
                    ],
                },
                AppConfig {
                    name: "AT&T".to_string(),
                    prefix: "/at-t".to_string(),
                    dir: PathBuf::from("AT-T/build"),
                    asset_dirs: vec![],
                },
            ],
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "demo@1digitals.com".to_string(),
            password: "1Digitals@123".to_string(),
            cookie_name: "gateway_session".to_string(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: "http://127.0.0.1:8000".to_string(),
            prefix: "/api/invoke_agent".to_string(),
            require_auth: false,
            timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        // Get the run mode, defaulting to "development"
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        // Locate the config directory
        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Check if we're in the project root or a subcrate
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            });

        tracing::info!("Loading configuration from {}", config_dir.display());
        tracing::info!("Using run mode: {}", run_mode);

        let config = ConfigFile::builder()
            // Start with defaults
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add environment specific config
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            // Add a local config file for local overrides
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Add environment variables with prefix "APP"
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load from environment variables directly (backward compatibility)
    pub fn from_env() -> Self {
        // Try to load from file first
        match Self::load() {
            Ok(config) => {
                tracing::info!("Configuration loaded from files and environment");
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to environment variables only");

                let mut config = Self::default();

                // PORT is the knob deployments expect
                if let Ok(port) = env::var("PORT") {
                    if port.parse::<u16>().is_ok() {
                        config.bind_addr = format!("0.0.0.0:{}", port);
                    } else {
                        tracing::warn!("Ignoring unparseable PORT value: {}", port);
                    }
                }

                if let Ok(origin) = env::var("AGENT_UPSTREAM_ORIGIN") {
                    config.upstream.origin = origin;
                }

                if let Ok(dir) = env::var("PUBLIC_DIR") {
                    config.public_dir = PathBuf::from(dir);
                }

                if let Ok(username) = env::var("GATEWAY_USERNAME") {
                    config.auth.username = username;
                }

                if let Ok(password) = env::var("GATEWAY_PASSWORD") {
                    config.auth.password = password;
                }

                config
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_mounts_three_apps_in_order() {
        let config = GatewayConfig::default();
        let prefixes: Vec<&str> = config.apps.iter().map(|a| a.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["/aerosole", "/express", "/at-t"]);
    }

    #[test]
    fn default_upstream_is_exempt_from_auth() {
        let config = GatewayConfig::default();
        assert_eq!(config.upstream.prefix, "/api/invoke_agent");
        assert!(!config.upstream.require_auth);
    }

    #[test]
    fn default_credentials_match_demo_pair() {
        let auth = AuthConfig::default();
        assert_eq!(auth.username, "demo@1digitals.com");
        assert_eq!(auth.password, "1Digitals@123");
    }
}
