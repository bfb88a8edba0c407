//! Shared configuration for the simmer CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `simmer_api` credential types. The core crates
//! never read storage themselves -- everything flows through here.

use std::collections::HashMap;
use std::path::PathBuf;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use simmer_api::auth::{DEFAULT_CLIENT_ID, DEFAULT_REGION};
use simmer_api::{Credentials, DEFAULT_API_BASE, DEFAULT_MODEL_ID};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
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
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
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

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    20
}

/// A named account profile.
///
/// Auth is either `email` (+ resolved password) for a cloud login, or
/// `access_token` for a captured bearer; when both are present the
/// account login wins, since it can renew itself.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Account email for cloud login.
    pub email: Option<String>,

    /// Password (plaintext -- prefer keyring or env).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Captured bearer token (plaintext -- prefer keyring or env).
    pub access_token: Option<String>,

    /// Environment variable name containing the captured token.
    pub access_token_env: Option<String>,

    /// Device id to command; discovered via `simmer devices` when unset.
    pub device_id: Option<String>,

    /// Cooking-module index on the device.
    #[serde(default)]
    pub module_idx: u32,

    /// Appliance model id.
    pub model_id: Option<String>,

    /// Cognito app client id.
    pub client_id: Option<String>,

    /// Cognito region.
    pub region: Option<String>,

    /// Cloud API base URL override.
    pub api_url: Option<String>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

impl Profile {
    pub fn model_id(&self) -> &str {
        self.model_id.as_deref().unwrap_or(DEFAULT_MODEL_ID)
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_BASE)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "simmer", "simmer").map_or_else(
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
    p.push("simmer");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit path (tests point this at a temp dir).
pub fn load_config_from(path: &std::path::Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SIMMER_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &std::path::Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a secret for `kind` ("password" or "access-token") through
/// the chain: profile's env-var pointer, then system keyring, then
/// plaintext config value.
fn resolve_secret(
    profile_name: &str,
    env_pointer: Option<&str>,
    kind: &str,
    plaintext: Option<&str>,
) -> Option<SecretString> {
    if let Some(env_name) = env_pointer {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    if let Ok(entry) = keyring::Entry::new("simmer", &format!("{profile_name}/{kind}")) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    plaintext.map(|s| SecretString::from(s.to_owned()))
}

/// Store a secret in the system keyring.
pub fn store_secret(profile_name: &str, kind: &str, secret: &str) -> Result<(), ConfigError> {
    keyring::Entry::new("simmer", &format!("{profile_name}/{kind}"))
        .and_then(|entry| entry.set_password(secret))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

/// Resolve a profile's credentials into the API credential type.
///
/// Account login (email + password) is preferred when configured, since
/// it can renew its own tokens; a captured token is the fallback.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Credentials, ConfigError> {
    if let Some(ref email) = profile.email {
        let password = resolve_secret(
            profile_name,
            profile.password_env.as_deref(),
            "password",
            profile.password.as_deref(),
        )
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

        return Ok(Credentials::Account {
            email: email.clone(),
            password,
            client_id: profile
                .client_id
                .clone()
                .unwrap_or_else(|| DEFAULT_CLIENT_ID.into()),
            region: profile
                .region
                .clone()
                .unwrap_or_else(|| DEFAULT_REGION.into()),
        });
    }

    if let Some(token) = resolve_secret(
        profile_name,
        profile.access_token_env.as_deref(),
        "access-token",
        profile.access_token.as_deref(),
    ) {
        return Ok(Credentials::CapturedToken { token });
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.output, "table");
        assert_eq!(cfg.defaults.timeout, 20);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn roundtrips_through_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "kitchen".into(),
            Profile {
                email: Some("cook@example.com".into()),
                device_id: Some("dev-1".into()),
                module_idx: 1,
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).expect("saves");

        let loaded = load_config_from(&path).expect("loads");
        let profile = &loaded.profiles["kitchen"];
        assert_eq!(profile.email.as_deref(), Some("cook@example.com"));
        assert_eq!(profile.device_id.as_deref(), Some("dev-1"));
        assert_eq!(profile.module_idx, 1);
        assert_eq!(profile.model_id(), DEFAULT_MODEL_ID);
        assert_eq!(profile.api_url(), DEFAULT_API_BASE);
    }

    #[test]
    fn env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    default_profile = "kitchen"

                    [defaults]
                    timeout = 45
                "#,
            )?;
            jail.set_env("SIMMER_DEFAULTS_TIMEOUT", "5");

            let cfg = load_config_from(std::path::Path::new("config.toml")).expect("loads");
            assert_eq!(cfg.default_profile.as_deref(), Some("kitchen"));
            assert_eq!(cfg.defaults.timeout, 5);
            Ok(())
        });
    }

    #[test]
    fn env_pointer_wins_over_plaintext_password() {
        use secrecy::ExposeSecret;

        figment::Jail::expect_with(|jail| {
            jail.set_env("SIMMER_TEST_KITCHEN_PASSWORD", "from-env");
            let profile = Profile {
                email: Some("cook@example.com".into()),
                password: Some("plaintext".into()),
                password_env: Some("SIMMER_TEST_KITCHEN_PASSWORD".into()),
                ..Profile::default()
            };
            let creds = resolve_credentials(&profile, "kitchen").expect("resolves");
            match creds {
                Credentials::Account { password, .. } => {
                    assert_eq!(password.expose_secret(), "from-env");
                }
                Credentials::CapturedToken { .. } => panic!("expected account credentials"),
            }
            Ok(())
        });
    }

    #[test]
    fn account_profile_resolves_to_account_credentials() {
        let profile = Profile {
            email: Some("cook@example.com".into()),
            password: Some("hunter2".into()),
            ..Profile::default()
        };
        let creds = resolve_credentials(&profile, "kitchen").expect("resolves");
        match creds {
            Credentials::Account {
                email,
                client_id,
                region,
                ..
            } => {
                assert_eq!(email, "cook@example.com");
                assert_eq!(client_id, DEFAULT_CLIENT_ID);
                assert_eq!(region, DEFAULT_REGION);
            }
            Credentials::CapturedToken { .. } => panic!("expected account credentials"),
        }
    }

    #[test]
    fn token_profile_resolves_to_captured_token() {
        let profile = Profile {
            access_token: Some("captured".into()),
            ..Profile::default()
        };
        let creds = resolve_credentials(&profile, "kitchen").expect("resolves");
        assert!(matches!(creds, Credentials::CapturedToken { .. }));
    }

    #[test]
    fn empty_profile_has_no_credentials() {
        let err = resolve_credentials(&Profile::default(), "kitchen").expect_err("must fail");
        assert!(matches!(err, ConfigError::NoCredentials { .. }));
    }
}
