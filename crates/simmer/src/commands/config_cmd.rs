//! Config subcommand handlers.

use dialoguer::{Input, Select};

use simmer_config::{self as config, Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),
        ConfigCommand::Show => show(),
        ConfigCommand::SetPassword => set_secret(global, "password", "Password: "),
        ConfigCommand::SetToken => set_secret(global, "access-token", "Token: "),
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn profile_name(global: &GlobalOpts) -> String {
    global.profile.clone().unwrap_or_else(|| "default".into())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Prompt {
        reason: e.to_string(),
    }
}

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        if let Some(ref email) = p.email {
            let _ = writeln!(out, "email = \"{email}\"");
        }
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if p.access_token.is_some() {
            let _ = writeln!(out, "access_token = \"****\"");
        }
        if let Some(ref env) = p.access_token_env {
            let _ = writeln!(out, "access_token_env = \"{env}\"");
        }
        if let Some(ref device) = p.device_id {
            let _ = writeln!(out, "device_id = \"{device}\"");
        }
        let _ = writeln!(out, "module_idx = {}", p.module_idx);
        if let Some(ref model) = p.model_id {
            let _ = writeln!(out, "model_id = \"{model}\"");
        }
        if let Some(ref url) = p.api_url {
            let _ = writeln!(out, "api_url = \"{url}\"");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

// ── Handlers ────────────────────────────────────────────────────────

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    let name = profile_name(global);
    let mut profile = cfg.profiles.remove(&name).unwrap_or_default();

    let auth = Select::new()
        .with_prompt("Authentication method")
        .items(&["Account email + password", "Captured bearer token"])
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if auth == 0 {
        let email: String = Input::new()
            .with_prompt("Account email")
            .with_initial_text(profile.email.clone().unwrap_or_default())
            .interact_text()
            .map_err(prompt_err)?;
        let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
        if email.is_empty() || password.is_empty() {
            return Err(CliError::Validation {
                field: "credentials".into(),
                reason: "email and password cannot be empty".into(),
            });
        }
        profile.email = Some(email);
        profile.access_token = None;
        store_or_inline(&name, "password", &password, &mut profile.password);
    } else {
        let token = rpassword::prompt_password("Bearer token: ").map_err(prompt_err)?;
        if token.is_empty() {
            return Err(CliError::Validation {
                field: "access_token".into(),
                reason: "token cannot be empty".into(),
            });
        }
        profile.email = None;
        profile.password = None;
        store_or_inline(&name, "access-token", &token, &mut profile.access_token);
    }

    let device: String = Input::new()
        .with_prompt("Device id (blank to discover later with `simmer devices`)")
        .with_initial_text(profile.device_id.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    profile.device_id = if device.is_empty() { None } else { Some(device) };

    cfg.profiles.insert(name.clone(), profile);
    if cfg.default_profile.is_none() {
        cfg.default_profile = Some(name.clone());
    }
    config::save_config(&cfg)?;

    println!(
        "profile '{name}' saved to {}",
        config::config_path().display()
    );
    Ok(())
}

/// Prefer the keyring; fall back to plaintext in the config file when
/// no keyring backend is available (headless hosts).
fn store_or_inline(name: &str, kind: &str, secret: &str, inline: &mut Option<String>) {
    match config::store_secret(name, kind, secret) {
        Ok(()) => {
            *inline = None;
        }
        Err(e) => {
            eprintln!("keyring unavailable ({e}), storing {kind} in the config file");
            *inline = Some(secret.to_owned());
        }
    }
}

fn show() -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    print!("{}", format_config_redacted(&cfg));
    Ok(())
}

fn set_secret(global: &GlobalOpts, kind: &str, prompt: &str) -> Result<(), CliError> {
    let name = profile_name(global);
    let secret = rpassword::prompt_password(prompt).map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: kind.to_string(),
            reason: "value cannot be empty".into(),
        });
    }
    config::store_secret(&name, kind, &secret)?;
    println!("{kind} stored in the system keyring for profile '{name}'");
    Ok(())
}
