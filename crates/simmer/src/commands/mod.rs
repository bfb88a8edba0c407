//! Command handlers and shared app context.

pub mod config_cmd;
mod cook;
mod devices;
mod status;

use std::sync::Arc;

use simmer_api::{Appliance, CloudClient, Session, TransportConfig};
use simmer_config::{self as config, Profile};
use url::Url;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Everything a cloud-touching command needs: the authenticated client
/// plus the resolved profile it was built from.
pub struct App {
    pub client: Arc<CloudClient>,
    pub profile: Profile,
    pub profile_name: String,
}

impl App {
    /// Resolve the active profile, its credentials, and build the client.
    pub fn build(global: &GlobalOpts) -> Result<Self, CliError> {
        let mut cfg = config::load_config_or_default();

        let profile_name = global
            .profile
            .clone()
            .or_else(|| cfg.default_profile.clone())
            .unwrap_or_else(|| "default".into());

        let Some(profile) = cfg.profiles.remove(&profile_name) else {
            if cfg.profiles.is_empty() {
                return Err(CliError::NoConfig {
                    path: config::config_path().display().to_string(),
                });
            }
            let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available.join(", "),
            });
        };

        let credentials = config::resolve_credentials(&profile, &profile_name)?;

        let timeout = global
            .timeout
            .or(profile.timeout)
            .unwrap_or(cfg.defaults.timeout);
        let transport = TransportConfig::with_timeout_secs(timeout);

        let session = Session::new(credentials, &transport)?;
        let base_url: Url = profile.api_url().parse().map_err(|e: url::ParseError| {
            CliError::Validation {
                field: "api_url".into(),
                reason: e.to_string(),
            }
        })?;
        let client = CloudClient::new(base_url, session, &transport)?;

        Ok(Self {
            client: Arc::new(client),
            profile,
            profile_name,
        })
    }

    /// Command target from `--device`/`--module` or the profile.
    pub fn target(&self, global: &GlobalOpts) -> Result<Appliance, CliError> {
        let device_id = global
            .device
            .clone()
            .or_else(|| self.profile.device_id.clone())
            .ok_or_else(|| CliError::NoDevice {
                profile: self.profile_name.clone(),
            })?;
        let module_idx = global.module.unwrap_or(self.profile.module_idx);
        Ok(Appliance::new(device_id, module_idx))
    }
}

pub async fn dispatch(cmd: Command, app: &App, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(args, app, global).await,
        Command::Status(args) => status::handle(args, app, global).await,
        Command::Cancel => cook::cancel(app, global).await,
        Command::Warm(args) => cook::warm(args, app, global).await,
        Command::Cook(args) => cook::cook(args, app, global).await,
        Command::Config(_) => unreachable!("config is handled before client construction"),
    }
}
