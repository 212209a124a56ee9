//! Config-file loading and layered resolution.
//!
//! # Design
//! - Layers resolve in order: built-in defaults, config file, command line.
//! - A config file that is absent or not readable by the caller is skipped;
//!   any other read failure or a malformed document is an error.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use amrest_telemetry::DEFAULT_LOG_LEVEL;
use tracing::debug;
use url::Url;

use crate::defaults::{
    DEFAULT_CONFIG_PATH, DEFAULT_LOGIN_REALM, DEFAULT_LOGIN_USER, DEFAULT_REALM,
    DEFAULT_TIMEOUT_SECS, DEFAULT_URL,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{ConfigFile, Overrides, Settings};

/// Pick the configuration file location, falling back to the built-in path.
#[must_use]
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), Path::to_path_buf)
}

/// Read the optional JSON configuration file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the file exists but cannot be read for a
/// reason other than missing permissions, and [`ConfigError::Parse`] when its
/// contents are not a valid settings document.
pub fn load_config_file(path: &Path) -> ConfigResult<Option<ConfigFile>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
            debug!(path = %path.display(), error = %err, "skipping configuration file");
            return Ok(None);
        }
        Err(source) => {
            return Err(ConfigError::Io {
                operation: "config_file.read",
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Read a password file; the first line is the credential.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the file cannot be read.
pub fn read_password_file(path: &Path) -> ConfigResult<String> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "password_file.read",
        path: path.to_path_buf(),
        source,
    })?;
    let first = contents.split('\n').next().unwrap_or_default();
    Ok(first.strip_suffix('\r').unwrap_or(first).to_string())
}

/// Merge the config file and command-line overrides over the defaults.
///
/// # Errors
///
/// Returns an error when the resulting URL is unusable, the timeout is zero,
/// or a referenced password file cannot be read.
pub fn resolve(file: Option<ConfigFile>, overrides: Overrides) -> ConfigResult<Settings> {
    let file = file.unwrap_or_default();

    let raw_url = overrides
        .url
        .or(file.url)
        .unwrap_or_else(|| DEFAULT_URL.to_string());
    let url = parse_server_url(&raw_url)?;

    let timeout_secs = overrides
        .timeout_secs
        .or(file.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(ConfigError::InvalidField {
            field: "timeout_secs",
            value: timeout_secs.to_string(),
            reason: "timeout must be at least one second".to_string(),
        });
    }

    let login_password = resolve_password(
        [
            (overrides.login_password_file, overrides.login_password),
            (file.login_password_file, file.login_password),
        ]
        .into_iter(),
    )?;

    Ok(Settings {
        url,
        realm: overrides
            .realm
            .or(file.realm)
            .unwrap_or_else(|| DEFAULT_REALM.to_string()),
        login_realm: overrides
            .login_realm
            .or(file.login_realm)
            .unwrap_or_else(|| DEFAULT_LOGIN_REALM.to_string()),
        login_user: overrides
            .login_user
            .or(file.login_user)
            .unwrap_or_else(|| DEFAULT_LOGIN_USER.to_string()),
        login_password,
        timeout: Duration::from_secs(timeout_secs),
        accept_invalid_certs: overrides.accept_invalid_certs
            || file.accept_invalid_certs.unwrap_or(false),
        log_level: overrides
            .log_level
            .or(file.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        log_format: overrides.log_format.or(file.log_format),
    })
}

// Within a layer the password file beats the literal password.
fn resolve_password(
    layers: impl Iterator<Item = (Option<PathBuf>, Option<String>)>,
) -> ConfigResult<Option<String>> {
    for (password_file, password) in layers {
        if let Some(path) = password_file {
            return read_password_file(&path).map(Some);
        }
        if password.is_some() {
            return Ok(password);
        }
    }
    Ok(None)
}

fn parse_server_url(raw: &str) -> ConfigResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|err| ConfigError::InvalidField {
        field: "url",
        value: raw.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::InvalidField {
            field: "url",
            value: raw.to_string(),
            reason: "server URL must be an absolute http or https URL".to_string(),
        });
    }
    Ok(url)
}
