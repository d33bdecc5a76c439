//! Configuration sources for OpenManage tools.
//!
//! TOML profiles under the platform config dir, `OPENMANAGE_*` environment
//! overrides, credential resolution, the CA-bundle environment fallback,
//! and the Ansible binary-module args file. Everything here resolves to an
//! `openmanage_core::ModuleParams`; the core never reads disk or env.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use openmanage_core::ModuleParams;

/// Environment variables consulted, in order, for a CA bundle.
pub const CA_BUNDLE_ENV: [&str; 3] = ["REQUESTS_CA_BUNDLE", "CURL_CA_BUNDLE", "OMAM_CA_BUNDLE"];

pub const PASSWORD_ENV: &str = "OPENMANAGE_PASSWORD";
pub const AUTH_TOKEN_ENV: &str = "OPENMANAGE_AUTH_TOKEN";

const MODULE_ARGS_KEY: &str = "ANSIBLE_MODULE_ARGS";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in {}", .path.display())]
    ProfileNotFound { name: String, path: PathBuf },

    #[error("invalid module args: {reason}")]
    ModuleArgs { reason: String },

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
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
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

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_validate_certs")]
    pub validate_certs: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            validate_certs: default_validate_certs(),
        }
    }
}

fn default_output() -> String {
    "json".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_validate_certs() -> bool {
    true
}

/// A named device profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// iDRAC, OME or OMEVV host: name, IPv4 or IPv6 literal.
    pub hostname: String,

    pub port: Option<u16>,

    pub username: Option<String>,

    /// Plaintext password. `OPENMANAGE_PASSWORD` takes precedence.
    pub password: Option<String>,

    /// Pre-issued session token. `OPENMANAGE_AUTH_TOKEN` takes precedence.
    pub auth_token: Option<String>,

    pub validate_certs: Option<bool>,

    pub ca_path: Option<PathBuf>,

    pub timeout: Option<u64>,

    /// vCenter identifier for OMEVV profiles.
    pub vcenter_uuid: Option<String>,
}

impl Config {
    /// Look up `name`, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, p)| (k.as_str(), p))
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.into(),
                path: config_path(),
            })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "dell", "openmanage").map_or_else(
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
    p.push("openmanage");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Nested keys in the environment use a double underscore:
/// `OPENMANAGE_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("OPENMANAGE_").split("__"));

    Ok(figment.extract()?)
}

// ── Credential resolution ───────────────────────────────────────────

/// Password chain: environment variable, then profile plaintext.
pub fn resolve_password(
    profile: &Profile,
    env: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    env(PASSWORD_ENV)
        .or_else(|| profile.password.clone())
        .map(SecretString::from)
}

/// Token chain: environment variable, then profile plaintext.
pub fn resolve_auth_token(
    profile: &Profile,
    env: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    env(AUTH_TOKEN_ENV)
        .or_else(|| profile.auth_token.clone())
        .map(SecretString::from)
}

/// First non-empty CA bundle path named by [`CA_BUNDLE_ENV`].
pub fn ca_bundle_from_env(env: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    CA_BUNDLE_ENV
        .iter()
        .filter_map(|name| env(name))
        .find(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

/// Fill `ca_path` from the environment when certificates are validated
/// and no explicit path was given.
pub fn apply_ca_fallback(params: &mut ModuleParams, env: impl Fn(&str) -> Option<String>) {
    if params.validate_certs && params.ca_path.is_none() {
        params.ca_path = ca_bundle_from_env(env);
    }
}

/// Lookup function backed by the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

// ── Profile → params ────────────────────────────────────────────────

/// Translate a profile into connection options. CLI flags are layered on
/// top by the caller.
pub fn profile_params(
    profile: &Profile,
    defaults: &Defaults,
    env: impl Fn(&str) -> Option<String> + Copy,
) -> Result<ModuleParams, ConfigError> {
    if profile.hostname.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "hostname".into(),
            reason: "must not be empty".into(),
        });
    }

    let mut params = ModuleParams::new(profile.hostname.clone());
    if let Some(port) = profile.port {
        params.port = port;
    }
    params.username.clone_from(&profile.username);
    params.password = resolve_password(profile, env);
    params.auth_token = resolve_auth_token(profile, env);
    params.validate_certs = profile.validate_certs.unwrap_or(defaults.validate_certs);
    params.ca_path.clone_from(&profile.ca_path);
    params.timeout = profile.timeout.unwrap_or(defaults.timeout);
    params.vcenter_uuid.clone_from(&profile.vcenter_uuid);
    Ok(params)
}

// ── Ansible module args ─────────────────────────────────────────────

/// Parsed `{"ANSIBLE_MODULE_ARGS": {...}}` document.
#[derive(Debug, Clone)]
pub struct ModuleArgs {
    pub params: ModuleParams,
    args: Map<String, Value>,
}

impl ModuleArgs {
    /// Parse the args document. Connection options are extracted here;
    /// operation-specific options stay available through [`Self::operation`].
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let doc: Value = serde_json::from_str(raw).map_err(|e| ConfigError::ModuleArgs {
            reason: e.to_string(),
        })?;
        let args = match doc {
            Value::Object(mut top) => match top.remove(MODULE_ARGS_KEY) {
                Some(Value::Object(args)) => args,
                _ => {
                    return Err(ConfigError::ModuleArgs {
                        reason: format!("expected an object under '{MODULE_ARGS_KEY}'"),
                    });
                }
            },
            _ => {
                return Err(ConfigError::ModuleArgs {
                    reason: "expected a JSON object".into(),
                });
            }
        };
        let params = Self::deserialize_args(&args)?;
        Ok(Self { params, args })
    }

    /// Deserialize the module's own options from the same document.
    pub fn operation<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        Self::deserialize_args(&self.args)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.args.get(key).filter(|v| !v.is_null())
    }

    fn deserialize_args<T: DeserializeOwned>(args: &Map<String, Value>) -> Result<T, ConfigError> {
        serde_json::from_value(Value::Object(args.clone())).map_err(|e| ConfigError::ModuleArgs {
            reason: e.to_string(),
        })
    }
}

/// Read and parse a module args file.
pub fn read_module_args(path: &Path) -> Result<ModuleArgs, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    ModuleArgs::parse(&raw)
}
