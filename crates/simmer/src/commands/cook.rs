//! Cooking command handlers: cancel, keep-warm, pressure-cook.

use owo_colors::OwoColorize;

use simmer_api::{KeepWarmUpdate, PressureCookUpdate, PressureLevel, VentingMode, WarmPreset, WarmTemp};

use crate::cli::{CookArgs, CookCommand, GlobalOpts, WarmArgs, WarmCommand};
use crate::commands::App;
use crate::error::CliError;
use crate::output;

pub async fn cancel(app: &App, global: &GlobalOpts) -> Result<(), CliError> {
    let target = app.target(global)?;
    app.client.cancel(&target).await?;
    success(global, &format!("cancelled program on {}", target.device_id));
    Ok(())
}

pub async fn warm(args: WarmArgs, app: &App, global: &GlobalOpts) -> Result<(), CliError> {
    let target = app.target(global)?;

    match args.command {
        WarmCommand::Start {
            temp_c,
            preset,
            duration_seconds,
        } => {
            let temp = warm_temp(temp_c, preset.as_deref())?;
            app.client
                .start_keep_warm(&target, temp, duration_seconds)
                .await?;
            success(
                global,
                &format!("keep-warm started for {duration_seconds}s on {}", target.device_id),
            );
        }
        WarmCommand::Update {
            temp_c,
            preset,
            duration_seconds,
        } => {
            let temp = if temp_c.is_none() && preset.is_none() {
                None
            } else {
                Some(warm_temp(temp_c, preset.as_deref())?)
            };
            let update = KeepWarmUpdate {
                temp,
                duration_seconds,
            };
            app.client.update_keep_warm(&target, &update).await?;
            success(global, &format!("keep-warm updated on {}", target.device_id));
        }
    }
    Ok(())
}

pub async fn cook(args: CookArgs, app: &App, global: &GlobalOpts) -> Result<(), CliError> {
    let target = app.target(global)?;

    match args.command {
        CookCommand::Start {
            pressure,
            cook_time_seconds,
            venting,
            vent_time_seconds,
            nutriboost,
        } => {
            let pressure = pressure.parse::<PressureLevel>()?;
            let venting = venting.parse::<VentingMode>()?;
            app.client
                .start_pressure_cook(
                    &target,
                    pressure,
                    cook_time_seconds,
                    venting,
                    vent_time_seconds,
                    nutriboost,
                )
                .await?;
            success(
                global,
                &format!(
                    "pressure cook started on {}: {pressure} pressure, {cook_time_seconds}s, {venting} venting",
                    target.device_id
                ),
            );
        }
        CookCommand::Update {
            pressure,
            cook_time_seconds,
            venting,
            vent_time_seconds,
            nutriboost,
        } => {
            let update = PressureCookUpdate {
                pressure: pressure
                    .as_deref()
                    .map(|s| s.parse::<PressureLevel>())
                    .transpose()?,
                cook_time_seconds,
                venting: venting
                    .as_deref()
                    .map(|s| s.parse::<VentingMode>())
                    .transpose()?,
                vent_time_seconds,
                nutriboost,
            };
            app.client.update_pressure_cook(&target, &update).await?;
            success(global, &format!("pressure cook updated on {}", target.device_id));
        }
    }
    Ok(())
}

/// Exactly one of `--temp-c` / `--preset`.
fn warm_temp(temp_c: Option<u32>, preset: Option<&str>) -> Result<WarmTemp, CliError> {
    match (temp_c, preset) {
        (Some(t), None) => Ok(WarmTemp::Celsius(t)),
        (None, Some(p)) => Ok(WarmTemp::Preset(p.parse::<WarmPreset>()?)),
        _ => Err(CliError::Validation {
            field: "temp".into(),
            reason: "provide exactly one of --temp-c or --preset".into(),
        }),
    }
}

fn success(global: &GlobalOpts, message: &str) {
    if global.quiet {
        return;
    }
    if output::should_color(&global.color) {
        println!("{} {message}", "✓".green());
    } else {
        println!("✓ {message}");
    }
}
