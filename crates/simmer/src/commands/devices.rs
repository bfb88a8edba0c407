//! Device command handlers.

use tabled::Tabled;

use simmer_api::Device;

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts, OutputFormat};
use crate::commands::App;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Device ID")]
    device_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Module")]
    module: u32,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            device_id: d.device_id.clone(),
            name: d.name.clone().unwrap_or_default(),
            model: d.model_id.clone().unwrap_or_default(),
            module: d.appliance_module_idx,
        }
    }
}

pub async fn handle(args: DevicesArgs, app: &App, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command.unwrap_or(DevicesCommand::List) {
        DevicesCommand::List => list(app, global).await,
        DevicesCommand::Caps { model_id } => caps(model_id, app, global).await,
    }
}

async fn list(app: &App, global: &GlobalOpts) -> Result<(), CliError> {
    let devices = app.client.list_devices().await?;
    println!(
        "{}",
        output::render_list(
            &global.output,
            &devices,
            DeviceRow::from,
            |d| d.device_id.clone(),
        )
    );
    Ok(())
}

async fn caps(model_id: Option<String>, app: &App, global: &GlobalOpts) -> Result<(), CliError> {
    let model = model_id.unwrap_or_else(|| app.profile.model_id().to_owned());
    let caps = app.client.appliance_capabilities(&model).await?;
    let compact = matches!(global.output, OutputFormat::JsonCompact);
    println!("{}", output::render_json(&caps, compact));
    Ok(())
}
