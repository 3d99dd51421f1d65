//! Sectioned connector settings.
//!
//! Settings live in a TOML file (default `~/.config/nuorder.toml`, overridable
//! via `NUORDER_CONFIG`) with one table per environment:
//!
//! ```toml
//! [sandbox]
//! hostname = "wholesale.sandbox1.nuorder.com"
//! consumer_key = "..."
//! consumer_secret = "..."
//! oauth_token = "..."
//! oauth_token_secret = "..."
//! app_name = "My app"
//! ```
//!
//! Resolution order per field: explicit override (CLI flag) > `NUORDER_*`
//! environment variable > file section > default.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::oauth::OauthCredentials;

pub const DEFAULT_SECTION: &str = "sandbox";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{0}` missing, and no default provided")]
    KeyMissing(&'static str),
    #[error("config file '{path}' is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid hostname '{0}'")]
    InvalidHostname(String),
    #[error("failed to write config file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The settings record the form edits and every connector call reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorSettings {
    pub hostname: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub oauth_token: String,
    pub oauth_token_secret: String,
    pub app_name: Option<String>,
    pub verify_ssl: bool,
    pub request_timeout_secs: u64,
    pub catalog_path: Option<PathBuf>,
    pub sync_log_path: Option<PathBuf>,
}

impl ConnectorSettings {
    pub fn credentials(&self) -> OauthCredentials {
        OauthCredentials {
            consumer_key: self.consumer_key.clone(),
            consumer_secret: self.consumer_secret.clone(),
            oauth_token: self.oauth_token.clone(),
            oauth_token_secret: self.oauth_token_secret.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Field-by-field overrides, typically sourced from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub hostname: Option<String>,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub oauth_token: Option<String>,
    pub oauth_token_secret: Option<String>,
    pub app_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SectionValues {
    hostname: Option<String>,
    consumer_key: Option<String>,
    consumer_secret: Option<String>,
    oauth_token: Option<String>,
    oauth_token_secret: Option<String>,
    app_name: Option<String>,
    verify_ssl: Option<bool>,
    request_timeout_secs: Option<u64>,
    catalog_path: Option<PathBuf>,
    sync_log_path: Option<PathBuf>,
}

pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("NUORDER_CONFIG") {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nuorder.toml")
}

fn read_section(path: &Path, section: &str) -> Result<SectionValues, ConfigError> {
    let Ok(raw) = fs::read_to_string(path) else {
        return Ok(SectionValues::default());
    };
    let file: BTreeMap<String, SectionValues> =
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(file.get(section).cloned().unwrap_or_default())
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn resolve(
    override_value: Option<String>,
    env_name: &str,
    file_value: Option<String>,
) -> Option<String> {
    override_value
        .or_else(|| env_override(env_name))
        .or(file_value)
}

fn required(
    key: &'static str,
    value: Option<String>,
) -> Result<String, ConfigError> {
    value.ok_or(ConfigError::KeyMissing(key))
}

/// Strips a redundant `https://` prefix and trailing slashes. A non-default
/// scheme (plain `http://` for local testing) is kept verbatim; the client
/// prepends `https://` to bare hostnames itself.
pub fn normalize_hostname(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidHostname(raw.to_string()));
    }
    let candidate = trimmed.strip_prefix("https://").unwrap_or(trimmed).to_string();
    let probe = if candidate.contains("://") {
        candidate.clone()
    } else {
        format!("https://{candidate}")
    };
    Url::parse(&probe).map_err(|_| ConfigError::InvalidHostname(raw.to_string()))?;
    Ok(candidate)
}

fn load(
    path: Option<&Path>,
    section: &str,
    overrides: &SettingsOverrides,
    require_tokens: bool,
) -> Result<ConnectorSettings, ConfigError> {
    let default_path = default_config_path();
    let path = path.unwrap_or(&default_path);
    let values = read_section(path, section)?;

    let hostname = required(
        "hostname",
        resolve(overrides.hostname.clone(), "NUORDER_HOSTNAME", values.hostname),
    )?;
    let hostname = normalize_hostname(&hostname)?;

    let consumer_key = required(
        "consumer_key",
        resolve(
            overrides.consumer_key.clone(),
            "NUORDER_CONSUMER_KEY",
            values.consumer_key,
        ),
    )?;
    let consumer_secret = required(
        "consumer_secret",
        resolve(
            overrides.consumer_secret.clone(),
            "NUORDER_CONSUMER_SECRET",
            values.consumer_secret,
        ),
    )?;

    let oauth_token = resolve(
        overrides.oauth_token.clone(),
        "NUORDER_OAUTH_TOKEN",
        values.oauth_token,
    );
    let oauth_token_secret = resolve(
        overrides.oauth_token_secret.clone(),
        "NUORDER_OAUTH_TOKEN_SECRET",
        values.oauth_token_secret,
    );
    let (oauth_token, oauth_token_secret) = if require_tokens {
        (
            required("oauth_token", oauth_token)?,
            required("oauth_token_secret", oauth_token_secret)?,
        )
    } else {
        (
            oauth_token.unwrap_or_default(),
            oauth_token_secret.unwrap_or_default(),
        )
    };

    let app_name = resolve(overrides.app_name.clone(), "NUORDER_APP_NAME", values.app_name);

    Ok(ConnectorSettings {
        hostname,
        consumer_key,
        consumer_secret,
        oauth_token,
        oauth_token_secret,
        app_name,
        verify_ssl: values.verify_ssl.unwrap_or(true),
        request_timeout_secs: values.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        catalog_path: values.catalog_path,
        sync_log_path: values.sync_log_path,
    })
}

pub fn load_settings(
    path: Option<&Path>,
    section: &str,
    overrides: &SettingsOverrides,
) -> Result<ConnectorSettings, ConfigError> {
    load(path, section, overrides, true)
}

/// Like [`load_settings`] but tolerates absent oauth tokens: the `initiate`
/// bootstrap runs before any token exists.
pub fn load_bootstrap_settings(
    path: Option<&Path>,
    section: &str,
    overrides: &SettingsOverrides,
) -> Result<ConnectorSettings, ConfigError> {
    load(path, section, overrides, false)
}

/// Rewrites one section of the config file, leaving other sections untouched.
pub fn save_settings(
    path: &Path,
    section: &str,
    settings: &ConnectorSettings,
) -> Result<(), ConfigError> {
    let mut file: BTreeMap<String, toml::Value> = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?,
        Err(_) => BTreeMap::new(),
    };

    let mut table = toml::value::Table::new();
    table.insert("hostname".into(), settings.hostname.clone().into());
    table.insert("consumer_key".into(), settings.consumer_key.clone().into());
    table.insert(
        "consumer_secret".into(),
        settings.consumer_secret.clone().into(),
    );
    table.insert("oauth_token".into(), settings.oauth_token.clone().into());
    table.insert(
        "oauth_token_secret".into(),
        settings.oauth_token_secret.clone().into(),
    );
    if let Some(app_name) = &settings.app_name {
        table.insert("app_name".into(), app_name.clone().into());
    }
    table.insert("verify_ssl".into(), settings.verify_ssl.into());
    table.insert(
        "request_timeout_secs".into(),
        (settings.request_timeout_secs as i64).into(),
    );
    if let Some(catalog_path) = &settings.catalog_path {
        table.insert(
            "catalog_path".into(),
            catalog_path.to_string_lossy().into_owned().into(),
        );
    }
    if let Some(sync_log_path) = &settings.sync_log_path {
        table.insert(
            "sync_log_path".into(),
            sync_log_path.to_string_lossy().into_owned().into(),
        );
    }
    file.insert(section.to_string(), toml::Value::Table(table));

    let rendered = toml::to_string_pretty(&file).map_err(|err| ConfigError::Write {
        path: path.to_path_buf(),
        source: std::io::Error::other(err),
    })?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }
    fs::write(path, rendered).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn temp_config(contents: &str) -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("nuorder_config_test_{suffix}.toml"));
        fs::write(&path, contents).expect("write temp config");
        path
    }

    const SAMPLE: &str = r#"
[sandbox]
hostname = "wholesale.sandbox1.nuorder.com"
consumer_key = "sandbox-key"
consumer_secret = "sandbox-secret"
oauth_token = "sandbox-token"
oauth_token_secret = "sandbox-token-secret"
verify_ssl = false

[production]
hostname = "wholesale.nuorder.com"
consumer_key = "prod-key"
consumer_secret = "prod-secret"
oauth_token = "prod-token"
oauth_token_secret = "prod-token-secret"
request_timeout_secs = 10
"#;

    #[test]
    fn selects_the_requested_section() {
        let path = temp_config(SAMPLE);
        let settings =
            load_settings(Some(&path), "production", &SettingsOverrides::default())
                .expect("load production");
        assert_eq!(settings.hostname, "wholesale.nuorder.com");
        assert_eq!(settings.request_timeout_secs, 10);
        assert!(settings.verify_ssl);

        let sandbox = load_settings(Some(&path), DEFAULT_SECTION, &SettingsOverrides::default())
            .expect("load sandbox");
        assert_eq!(sandbox.consumer_key, "sandbox-key");
        assert!(!sandbox.verify_ssl);
        assert_eq!(sandbox.request_timeout_secs, DEFAULT_TIMEOUT_SECS);

        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn explicit_overrides_win_over_file_values() {
        let path = temp_config(SAMPLE);
        let overrides = SettingsOverrides {
            hostname: Some("example.test".to_string()),
            ..SettingsOverrides::default()
        };
        let settings =
            load_settings(Some(&path), DEFAULT_SECTION, &overrides).expect("load with override");
        assert_eq!(settings.hostname, "example.test");
        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn missing_key_error_names_the_key() {
        let path = temp_config("[sandbox]\nhostname = \"example.test\"\n");
        let err = load_settings(Some(&path), DEFAULT_SECTION, &SettingsOverrides::default())
            .expect_err("consumer_key is missing");
        assert!(matches!(err, ConfigError::KeyMissing("consumer_key")));
        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn bootstrap_load_tolerates_absent_tokens() {
        let path = temp_config(
            "[sandbox]\nhostname = \"example.test\"\nconsumer_key = \"k\"\nconsumer_secret = \"s\"\n",
        );
        let settings =
            load_bootstrap_settings(Some(&path), DEFAULT_SECTION, &SettingsOverrides::default())
                .expect("bootstrap load");
        assert_eq!(settings.oauth_token, "");
        assert_eq!(settings.oauth_token_secret, "");
        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn normalizes_hostnames() {
        assert_eq!(
            normalize_hostname("https://wholesale.nuorder.com/").expect("strip scheme"),
            "wholesale.nuorder.com"
        );
        assert_eq!(
            normalize_hostname("wholesale.nuorder.com").expect("bare host"),
            "wholesale.nuorder.com"
        );
        assert_eq!(
            normalize_hostname("http://127.0.0.1:8080").expect("explicit http kept"),
            "http://127.0.0.1:8080"
        );
        assert!(normalize_hostname("   ").is_err());
    }

    #[test]
    fn save_preserves_other_sections() {
        let path = temp_config(SAMPLE);
        let mut settings = load_settings(Some(&path), DEFAULT_SECTION, &SettingsOverrides::default())
            .expect("load sandbox");
        settings.consumer_key = "rotated-key".to_string();
        save_settings(&path, DEFAULT_SECTION, &settings).expect("save");

        let reloaded = load_settings(Some(&path), DEFAULT_SECTION, &SettingsOverrides::default())
            .expect("reload sandbox");
        assert_eq!(reloaded.consumer_key, "rotated-key");
        let production = load_settings(Some(&path), "production", &SettingsOverrides::default())
            .expect("reload production");
        assert_eq!(production.consumer_key, "prod-key");
        fs::remove_file(path).expect("cleanup");
    }
}
