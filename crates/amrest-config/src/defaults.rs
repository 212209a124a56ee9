//! Built-in values used when neither the config file nor the command line
//! provide a setting.

/// Server root used when nothing else is configured.
pub const DEFAULT_URL: &str = "http://localhost:8080/openam";
/// Realm resource operations are scoped to.
pub const DEFAULT_REALM: &str = "/";
/// Realm the administrator authenticates against.
pub const DEFAULT_LOGIN_REALM: &str = "/";
/// Administrator account name.
pub const DEFAULT_LOGIN_USER: &str = "amadmin";
/// Per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Location of the optional JSON configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/amrest/amrest.json";
