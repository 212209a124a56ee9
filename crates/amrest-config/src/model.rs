//! Configuration layers and the resolved settings they produce.

use std::fmt::{self, Debug, Formatter};
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Optional JSON configuration file. Every key is optional; present keys
/// replace built-in defaults and are in turn replaced by command-line flags.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Server root URL.
    pub url: Option<String>,
    /// Realm resource operations are scoped to.
    pub realm: Option<String>,
    /// Realm used for authentication.
    pub login_realm: Option<String>,
    /// Account used for authentication.
    pub login_user: Option<String>,
    /// Literal password.
    pub login_password: Option<String>,
    /// File whose first line is the password.
    pub login_password_file: Option<PathBuf>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Skip TLS certificate verification.
    pub accept_invalid_certs: Option<bool>,
    /// Log level directive.
    pub log_level: Option<String>,
    /// Log format name (`pretty` or `json`).
    pub log_format: Option<String>,
}

/// Values supplied on the command line; `None` defers to lower layers.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Server root URL.
    pub url: Option<String>,
    /// Realm resource operations are scoped to.
    pub realm: Option<String>,
    /// Realm used for authentication.
    pub login_realm: Option<String>,
    /// Account used for authentication.
    pub login_user: Option<String>,
    /// Literal password.
    pub login_password: Option<String>,
    /// File whose first line is the password.
    pub login_password_file: Option<PathBuf>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Skip TLS certificate verification when set.
    pub accept_invalid_certs: bool,
    /// Log level directive.
    pub log_level: Option<String>,
    /// Log format name.
    pub log_format: Option<String>,
}

/// Fully resolved settings for one invocation.
#[derive(Clone)]
pub struct Settings {
    /// Server root URL.
    pub url: Url,
    /// Realm resource operations are scoped to.
    pub realm: String,
    /// Realm used for authentication.
    pub login_realm: String,
    /// Account used for authentication.
    pub login_user: String,
    /// Password, or `None` when no layer supplied one.
    pub login_password: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Skip TLS certificate verification.
    pub accept_invalid_certs: bool,
    /// Log level directive.
    pub log_level: String,
    /// Log format name, if configured.
    pub log_format: Option<String>,
}

impl Debug for Settings {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Settings")
            .field("url", &self.url.as_str())
            .field("realm", &self.realm)
            .field("login_realm", &self.login_realm)
            .field("login_user", &self.login_user)
            .field(
                "login_password",
                &self.login_password.as_ref().map(|_| "<redacted>"),
            )
            .field("timeout", &self.timeout)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}
