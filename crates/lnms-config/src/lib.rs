//! Configuration profiles for LibreNMS reconciliation.
//!
//! TOML profiles merged with `LNMS_`-prefixed environment variables, API
//! token resolution (env var, then plaintext), and translation to
//! `lnms_reconcile::ConnectionConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lnms_reconcile::{ConnectionConfig, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no profile named '{profile}'")]
    ProfileNotFound { profile: String },

    #[error("no API token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named LibreNMS instances.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `None`.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|profile| (name, profile))
            .ok_or_else(|| ConfigError::ProfileNotFound {
                profile: name.into(),
            })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// A named LibreNMS instance.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Install URL (e.g., "https://librenms.example.net").
    pub host: String,

    /// API token (plaintext; prefer `token_env`).
    pub token: Option<String>,

    /// Environment variable holding the API token.
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override the global insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override the global timeout, in seconds.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("net", "lnms", "lnms").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("lnms");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Nested keys come from double underscores: `LNMS_DEFAULTS__TIMEOUT`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LNMS_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

/// Resolve the API token: `token_env`'s variable first, then the
/// plaintext `token`.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(val) = profile
        .token_env
        .as_deref()
        .and_then(|env_name| std::env::var(env_name).ok())
    {
        return Ok(SecretString::from(val));
    }

    if let Some(ref token) = profile.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Build a `ConnectionConfig` from a profile, falling back to `defaults`
/// for TLS and timeout.
pub fn profile_to_connection_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ConnectionConfig, ConfigError> {
    let url: url::Url = profile.host.parse().map_err(|_| ConfigError::Validation {
        field: "host".into(),
        reason: format!("invalid URL: {}", profile.host),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }

    let timeout = profile.timeout.unwrap_or(defaults.timeout);
    if timeout == 0 {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least one second".into(),
        });
    }

    let token = resolve_token(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(ConnectionConfig {
        url,
        token: Some(token),
        tls,
        timeout: Duration::from_secs(timeout),
    })
}

/// Load the config and resolve `profile` (or the default) in one step.
pub fn load_connection(profile: Option<&str>) -> Result<ConnectionConfig, ConfigError> {
    let config = load_config()?;
    let (name, selected) = config.profile(profile)?;
    profile_to_connection_config(selected, name, &config.defaults)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const UNSET_VAR: &str = "LNMS_CONFIG_TEST_TOKEN_NEVER_SET";

    fn profile(host: &str) -> Profile {
        Profile {
            host: host.into(),
            token: Some("abc123".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("default"));
        assert_eq!(config.defaults.timeout, 30);
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn loads_profiles_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "lab"

[defaults]
timeout = 10

[profiles.lab]
host = "https://nms.lab.example.net"
token_env = "LAB_TOKEN"
insecure = true
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        let (name, lab) = config.profile(None).unwrap();
        assert_eq!(name, "lab");
        assert_eq!(lab.host, "https://nms.lab.example.net");
        assert_eq!(lab.token_env.as_deref(), Some("LAB_TOKEN"));
        assert_eq!(lab.insecure, Some(true));
        assert_eq!(config.defaults.timeout, 10);
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config
            .profiles
            .insert("default".into(), profile("https://nms.example.net"));
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let (_, default) = loaded.profile(None).unwrap();
        assert_eq!(default.host, "https://nms.example.net");
        assert_eq!(default.token.as_deref(), Some("abc123"));
    }

    #[test]
    fn unknown_profile_is_reported() {
        let config = Config::default();
        let err = config.profile(Some("prod")).unwrap_err();
        assert!(matches!(err, ConfigError::ProfileNotFound { ref profile } if profile == "prod"));
    }

    #[test]
    fn token_env_falls_back_to_plaintext() {
        let p = Profile {
            token_env: Some(UNSET_VAR.into()),
            ..profile("https://nms.example.net")
        };
        let token = resolve_token(&p, "default").unwrap();
        assert_eq!(token.expose_secret(), "abc123");

        let none = Profile {
            token: None,
            ..p
        };
        assert!(matches!(
            resolve_token(&none, "default"),
            Err(ConfigError::NoCredentials { .. })
        ));
    }

    #[test]
    fn profile_maps_to_connection_config() {
        let defaults = Defaults::default();

        let strict = profile_to_connection_config(&profile("https://nms.example.net"), "default", &defaults)
            .unwrap();
        assert_eq!(strict.tls, TlsVerification::SystemDefaults);
        assert_eq!(strict.timeout, Duration::from_secs(30));
        assert_eq!(strict.url.as_str(), "https://nms.example.net/");

        let custom = Profile {
            ca_cert: Some("/etc/ssl/lnms-ca.pem".into()),
            timeout: Some(5),
            ..profile("https://nms.example.net")
        };
        let config = profile_to_connection_config(&custom, "default", &defaults).unwrap();
        assert_eq!(
            config.tls,
            TlsVerification::CustomCa("/etc/ssl/lnms-ca.pem".into())
        );
        assert_eq!(config.timeout, Duration::from_secs(5));

        let insecure = Defaults {
            insecure: true,
            ..Defaults::default()
        };
        let config = profile_to_connection_config(&custom, "default", &insecure).unwrap();
        assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn invalid_host_and_timeout_are_rejected() {
        let defaults = Defaults::default();
        for host in ["not a url", "ftp://nms.example.net"] {
            let err = profile_to_connection_config(&profile(host), "default", &defaults).unwrap_err();
            assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "host"));
        }

        let zero = Profile {
            timeout: Some(0),
            ..profile("https://nms.example.net")
        };
        let err = profile_to_connection_config(&zero, "default", &defaults).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "timeout"));
    }
}
