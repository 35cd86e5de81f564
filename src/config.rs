use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_DB_PATH: &str = "./portal.db";
pub(crate) const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Parent,
    Admin,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub role: Role,
    pub timeout: Duration,
    pub download_timeout: Duration,
    pub db_path: PathBuf,
    pub download_dir: PathBuf,
    pub output: Option<PathBuf>,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("PORTAL_API_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("PORTAL_API_URL"))?;
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "PORTAL_API_URL",
                value: api_url,
            });
        }

        let role = match lookup("PORTAL_ROLE").as_deref().map(str::trim) {
            None | Some("") => Role::Parent,
            Some(value) if value.eq_ignore_ascii_case("parent") => Role::Parent,
            Some(value) if value.eq_ignore_ascii_case("admin") => Role::Admin,
            Some(value) => {
                return Err(ConfigError::Invalid {
                    name: "PORTAL_ROLE",
                    value: value.to_string(),
                })
            }
        };

        let secs = |name: &'static str, default: u64| -> Result<Duration, ConfigError> {
            match lookup(name) {
                None => Ok(Duration::from_secs(default)),
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .ok_or(ConfigError::Invalid { name, value }),
            }
        };

        Ok(Self {
            api_url,
            token: lookup("PORTAL_TOKEN").filter(|token| !token.is_empty()),
            role,
            timeout: secs("PORTAL_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            download_timeout: secs("PORTAL_DOWNLOAD_TIMEOUT_SECS", DEFAULT_DOWNLOAD_TIMEOUT_SECS)?,
            db_path: lookup("PORTAL_DB_PATH")
                .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
                .into(),
            download_dir: lookup("PORTAL_DOWNLOAD_DIR")
                .unwrap_or_else(|| DEFAULT_DOWNLOAD_DIR.to_string())
                .into(),
            output: lookup("PORTAL_OUTPUT").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<PortalConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PortalConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_url_is_set() {
        let config = config(&[("PORTAL_API_URL", "https://school.example/api")]).unwrap();
        assert_eq!(config.role, Role::Parent);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.download_timeout, Duration::from_secs(120));
        assert_eq!(config.db_path, PathBuf::from("./portal.db"));
        assert!(config.token.is_none());
    }

    #[test]
    fn missing_url_is_rejected() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::Missing("PORTAL_API_URL"));
    }

    #[test]
    fn bad_values_are_named() {
        let err = config(&[
            ("PORTAL_API_URL", "https://school.example"),
            ("PORTAL_TIMEOUT_SECS", "soon"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORTAL_TIMEOUT_SECS", .. }));

        let err = config(&[
            ("PORTAL_API_URL", "https://school.example"),
            ("PORTAL_ROLE", "teacher"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORTAL_ROLE", .. }));
    }

    #[test]
    fn admin_role_is_case_insensitive() {
        let config = config(&[
            ("PORTAL_API_URL", "http://localhost:5000"),
            ("PORTAL_ROLE", "ADMIN"),
        ])
        .unwrap();
        assert_eq!(config.role, Role::Admin);
    }
}
