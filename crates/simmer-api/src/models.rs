// Wire models for the KitchenOS cloud API.
//
// Inbound models use `#[serde(default)]` liberally plus a flattened
// catch-all map, because the cloud adds fields between app releases.
// Outbound models mirror the capability/settings shape the vendor app
// sends to `/cooking/execute`, including explicit `null` members.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Model id of the only appliance family this client has been captured
/// against.
pub const DEFAULT_MODEL_ID: &str = "kitchenos:InstantBrands:InstantPotProPlus";

// ── Vendor identifiers (from app capture) ────────────────────────────

pub(crate) mod ids {
    pub const CAP_KEEP_WARM: &str = "kitchenos:InstantBrands:KeepWarm";
    pub const CAP_PRESSURE_COOK: &str = "kitchenos:InstantBrands:PressureCook";

    pub const SETTING_TEMPERATURE: &str = "kitchenos:InstantBrands:TemperatureSetting";
    pub const SETTING_TIME: &str = "kitchenos:InstantBrands:TimeSetting";
    pub const SETTING_PRESSURE: &str = "kitchenos:InstantBrands:PressureSetting";
    pub const SETTING_VENTING: &str = "kitchenos:InstantBrands:VentingSetting";
    pub const SETTING_VENTING_TIME: &str = "kitchenos:InstantBrands:VentingTimeSetting";
    pub const SETTING_NUTRIBOOST: &str = "kitchenos:InstantBrands:NutriBoostSetting";

    pub const TEMPERATURE_LOW: &str = "kitchenos:InstantBrands:TemperatureLow";
    pub const TEMPERATURE_HIGH: &str = "kitchenos:InstantBrands:TemperatureHigh";

    pub const PRESSURE_LOW: &str = "kitchenos:InstantBrands:PressureLow";
    pub const PRESSURE_HIGH: &str = "kitchenos:InstantBrands:PressureHigh";
    pub const PRESSURE_MAX: &str = "kitchenos:InstantBrands:PressureMax";

    pub const VENTING_NATURAL: &str = "kitchenos:InstantBrands:VentingNatural";
    pub const VENTING_PULSE: &str = "kitchenos:InstantBrands:VentingPulse";
    pub const VENTING_QUICK: &str = "kitchenos:InstantBrands:VentingQuick";
    pub const VENTING_NATURAL_QUICK: &str = "kitchenos:InstantBrands:VentingNaturalQuick";

    pub const UNIT_CELSIUS: &str = "cckg:Celsius";
    pub const UNIT_SECOND: &str = "cckg:Second";

    pub const COMMAND_START: &str = "kitchenos:Command:Start";
    pub const COMMAND_UPDATE: &str = "kitchenos:Command:Update";
    pub const COMMAND_CANCEL: &str = "kitchenos:Command:Cancel";
}

// ── Validation bounds (vendor app schemas) ──────────────────────────

const TEMP_C_MIN: u32 = 25;
const TEMP_C_MAX: u32 = 95;
const DURATION_MAX_SECS: u32 = 24 * 60 * 60;
const COOK_TIME_MAX_SECS: u32 = 5 * 60 * 60;
const VENT_TIME_MAX_SECS: u32 = 60 * 60;

// ── Commands ────────────────────────────────────────────────────────

/// The three verbs the cooking endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CookCommand {
    Start,
    Update,
    Cancel,
}

impl CookCommand {
    pub(crate) fn vendor_id(self) -> &'static str {
        match self {
            Self::Start => ids::COMMAND_START,
            Self::Update => ids::COMMAND_UPDATE,
            Self::Cancel => ids::COMMAND_CANCEL,
        }
    }
}

// ── Program parameter enums ─────────────────────────────────────────

/// Pressure level for a pressure-cook program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PressureLevel {
    Low,
    High,
    Max,
}

impl PressureLevel {
    fn vendor_id(self) -> &'static str {
        match self {
            Self::Low => ids::PRESSURE_LOW,
            Self::High => ids::PRESSURE_HIGH,
            Self::Max => ids::PRESSURE_MAX,
        }
    }
}

impl std::str::FromStr for PressureLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" | "low" => Ok(Self::Low),
            "High" | "high" => Ok(Self::High),
            "Max" | "max" => Ok(Self::Max),
            other => Err(Error::Validation {
                field: "pressure",
                reason: format!("'{other}' is not one of Low, High, Max"),
            }),
        }
    }
}

impl std::fmt::Display for PressureLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Low => "Low",
            Self::High => "High",
            Self::Max => "Max",
        })
    }
}

/// How pressure is released at the end of a pressure-cook program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VentingMode {
    Natural,
    Pulse,
    Quick,
    NaturalQuick,
}

impl VentingMode {
    fn vendor_id(self) -> &'static str {
        match self {
            Self::Natural => ids::VENTING_NATURAL,
            Self::Pulse => ids::VENTING_PULSE,
            Self::Quick => ids::VENTING_QUICK,
            Self::NaturalQuick => ids::VENTING_NATURAL_QUICK,
        }
    }
}

impl std::str::FromStr for VentingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Natural" | "natural" => Ok(Self::Natural),
            "Pulse" | "pulse" => Ok(Self::Pulse),
            "Quick" | "quick" => Ok(Self::Quick),
            "NaturalQuick" | "natural-quick" | "naturalquick" => Ok(Self::NaturalQuick),
            other => Err(Error::Validation {
                field: "venting",
                reason: format!("'{other}' is not one of Natural, Pulse, Quick, NaturalQuick"),
            }),
        }
    }
}

impl std::fmt::Display for VentingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Natural => "Natural",
            Self::Pulse => "Pulse",
            Self::Quick => "Quick",
            Self::NaturalQuick => "NaturalQuick",
        })
    }
}

/// Keep-warm target temperature: an explicit Celsius value or one of
/// the appliance's two nominal presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarmTemp {
    Celsius(u32),
    Preset(WarmPreset),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarmPreset {
    Low,
    High,
}

impl std::str::FromStr for WarmPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" | "low" => Ok(Self::Low),
            "High" | "high" => Ok(Self::High),
            other => Err(Error::Validation {
                field: "preset",
                reason: format!("'{other}' is not one of Low, High"),
            }),
        }
    }
}

impl WarmTemp {
    fn validate(self) -> Result<(), Error> {
        if let Self::Celsius(t) = self {
            if !(TEMP_C_MIN..=TEMP_C_MAX).contains(&t) {
                return Err(Error::Validation {
                    field: "temp_c",
                    reason: format!("{t} is outside {TEMP_C_MIN}-{TEMP_C_MAX} °C"),
                });
            }
        }
        Ok(())
    }

    fn setting(self) -> Setting {
        match self {
            Self::Celsius(t) => Setting::numeric(ids::SETTING_TEMPERATURE, t, ids::UNIT_CELSIUS),
            Self::Preset(preset) => Setting::nominal(
                ids::SETTING_TEMPERATURE,
                match preset {
                    WarmPreset::Low => ids::TEMPERATURE_LOW,
                    WarmPreset::High => ids::TEMPERATURE_HIGH,
                },
            ),
        }
    }
}

// ── Cook programs ───────────────────────────────────────────────────

/// The desired program state sent to the appliance.
///
/// A closed set of variants with explicit field sets; each serializes
/// through its own mapping into the vendor capability shape, so a
/// keep-warm payload can never carry a pressure-cook setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookProgram {
    KeepWarm {
        temp: WarmTemp,
        duration_seconds: u32,
    },
    PressureCook {
        pressure: PressureLevel,
        cook_time_seconds: u32,
        venting: VentingMode,
        /// Omitted from the payload when `None` -- the appliance then
        /// applies its own venting-time default.
        vent_time_seconds: Option<u32>,
        nutriboost: bool,
    },
}

impl CookProgram {
    /// Range-check every field against the vendor app's schemas.
    pub fn validate(&self) -> Result<(), Error> {
        match *self {
            Self::KeepWarm {
                temp,
                duration_seconds,
            } => {
                temp.validate()?;
                validate_duration(duration_seconds)?;
            }
            Self::PressureCook {
                cook_time_seconds,
                vent_time_seconds,
                ..
            } => {
                validate_cook_time(cook_time_seconds)?;
                if let Some(vent) = vent_time_seconds {
                    validate_vent_time(vent)?;
                }
            }
        }
        Ok(())
    }

    /// Map this program to the vendor capability payload.
    pub(crate) fn capability(&self) -> Capability {
        match *self {
            Self::KeepWarm {
                temp,
                duration_seconds,
            } => Capability {
                reference_capability_id: ids::CAP_KEEP_WARM,
                settings: vec![
                    temp.setting(),
                    Setting::numeric(ids::SETTING_TIME, duration_seconds, ids::UNIT_SECOND),
                ],
            },
            Self::PressureCook {
                pressure,
                cook_time_seconds,
                venting,
                vent_time_seconds,
                nutriboost,
            } => {
                let mut settings = vec![
                    Setting::nominal(ids::SETTING_PRESSURE, pressure.vendor_id()),
                    Setting::numeric(ids::SETTING_TIME, cook_time_seconds, ids::UNIT_SECOND),
                    Setting::nominal(ids::SETTING_VENTING, venting.vendor_id()),
                    Setting::flag(ids::SETTING_NUTRIBOOST, nutriboost),
                ];
                if let Some(vent) = vent_time_seconds {
                    settings.push(Setting::numeric(
                        ids::SETTING_VENTING_TIME,
                        vent,
                        ids::UNIT_SECOND,
                    ));
                }
                Capability {
                    reference_capability_id: ids::CAP_PRESSURE_COOK,
                    settings,
                }
            }
        }
    }
}

fn validate_duration(duration_seconds: u32) -> Result<(), Error> {
    if duration_seconds == 0 || duration_seconds > DURATION_MAX_SECS {
        return Err(Error::Validation {
            field: "duration_seconds",
            reason: format!("{duration_seconds} is outside 1-{DURATION_MAX_SECS}"),
        });
    }
    Ok(())
}

fn validate_cook_time(cook_time_seconds: u32) -> Result<(), Error> {
    if cook_time_seconds > COOK_TIME_MAX_SECS {
        return Err(Error::Validation {
            field: "cook_time_seconds",
            reason: format!("{cook_time_seconds} exceeds {COOK_TIME_MAX_SECS}"),
        });
    }
    Ok(())
}

fn validate_vent_time(vent_time_seconds: u32) -> Result<(), Error> {
    if vent_time_seconds > VENT_TIME_MAX_SECS {
        return Err(Error::Validation {
            field: "vent_time_seconds",
            reason: format!("{vent_time_seconds} exceeds {VENT_TIME_MAX_SECS}"),
        });
    }
    Ok(())
}

// ── Program updates ─────────────────────────────────────────────────

/// Partial keep-warm update; every field optional, at least one required.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeepWarmUpdate {
    pub temp: Option<WarmTemp>,
    pub duration_seconds: Option<u32>,
}

impl KeepWarmUpdate {
    pub(crate) fn capability(&self) -> Result<Capability, Error> {
        let mut settings = Vec::new();
        if let Some(temp) = self.temp {
            temp.validate()?;
            settings.push(temp.setting());
        }
        if let Some(duration) = self.duration_seconds {
            validate_duration(duration)?;
            settings.push(Setting::numeric(ids::SETTING_TIME, duration, ids::UNIT_SECOND));
        }
        require_settings(settings, ids::CAP_KEEP_WARM)
    }
}

/// Partial pressure-cook update; every field optional, at least one required.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PressureCookUpdate {
    pub pressure: Option<PressureLevel>,
    pub cook_time_seconds: Option<u32>,
    pub venting: Option<VentingMode>,
    pub vent_time_seconds: Option<u32>,
    pub nutriboost: Option<bool>,
}

impl PressureCookUpdate {
    pub(crate) fn capability(&self) -> Result<Capability, Error> {
        let mut settings = Vec::new();
        if let Some(pressure) = self.pressure {
            settings.push(Setting::nominal(ids::SETTING_PRESSURE, pressure.vendor_id()));
        }
        if let Some(cook) = self.cook_time_seconds {
            validate_cook_time(cook)?;
            settings.push(Setting::numeric(ids::SETTING_TIME, cook, ids::UNIT_SECOND));
        }
        if let Some(venting) = self.venting {
            settings.push(Setting::nominal(ids::SETTING_VENTING, venting.vendor_id()));
        }
        if let Some(vent) = self.vent_time_seconds {
            validate_vent_time(vent)?;
            settings.push(Setting::numeric(ids::SETTING_VENTING_TIME, vent, ids::UNIT_SECOND));
        }
        if let Some(nutriboost) = self.nutriboost {
            settings.push(Setting::flag(ids::SETTING_NUTRIBOOST, nutriboost));
        }
        require_settings(settings, ids::CAP_PRESSURE_COOK)
    }
}

fn require_settings(
    settings: Vec<Setting>,
    reference_capability_id: &'static str,
) -> Result<Capability, Error> {
    if settings.is_empty() {
        return Err(Error::Validation {
            field: "update",
            reason: "provide at least one setting to update".into(),
        });
    }
    Ok(Capability {
        reference_capability_id,
        settings,
    })
}

// ── Outbound wire shapes ────────────────────────────────────────────

/// Body of `POST /cooking/execute`.
#[derive(Debug, Serialize)]
pub(crate) struct ExecuteRequest<'a> {
    pub appliance_module_idx: u32,
    pub device_id: &'a str,
    pub command: &'static str,
    pub composite_capabilities: Vec<Capability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability: Option<Capability>,
}

/// One capability block: the program being driven plus its settings.
#[derive(Debug, Clone, Serialize)]
pub struct Capability {
    pub reference_capability_id: &'static str,
    pub settings: Vec<Setting>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Setting {
    pub reference_setting_id: &'static str,
    pub value: SettingValue,
}

impl Setting {
    fn numeric(id: &'static str, value: u32, unit: &'static str) -> Self {
        Self {
            reference_setting_id: id,
            value: SettingValue::Numeric {
                value,
                reference_unit_id: Some(unit),
                reference_value_id: None,
            },
        }
    }

    fn nominal(id: &'static str, value_id: &'static str) -> Self {
        Self {
            reference_setting_id: id,
            value: SettingValue::Nominal {
                reference_value_id: value_id,
                reference_unit_id: None,
            },
        }
    }

    fn flag(id: &'static str, value: bool) -> Self {
        Self {
            reference_setting_id: id,
            value: SettingValue::Boolean {
                value,
                reference_unit_id: None,
                reference_value_id: None,
            },
        }
    }
}

/// Typed setting value. The cloud expects the unused reference members
/// present as explicit `null`s, so none of these fields are skipped.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SettingValue {
    Numeric {
        value: u32,
        reference_unit_id: Option<&'static str>,
        reference_value_id: Option<&'static str>,
    },
    Nominal {
        reference_value_id: &'static str,
        reference_unit_id: Option<&'static str>,
    },
    Boolean {
        value: bool,
        reference_unit_id: Option<&'static str>,
        reference_value_id: Option<&'static str>,
    },
}

// ── Inbound wire shapes ─────────────────────────────────────────────

/// Account profile from `GET /user/`. Only the appliance list matters
/// to this client.
#[derive(Debug, Deserialize)]
pub(crate) struct UserProfile {
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// One appliance record associated with the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub device_id: String,
    /// Index of the cooking module on the device; single-module
    /// appliances report 0.
    #[serde(default)]
    pub appliance_module_idx: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Device {
    /// Display name, falling back to the device id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.device_id)
    }

    /// Command target for this device.
    pub fn appliance(&self) -> Appliance {
        Appliance {
            device_id: self.device_id.clone(),
            module_idx: self.appliance_module_idx,
        }
    }
}

/// Command target: the minimum addressing a cooking command needs.
///
/// Built from a discovered [`Device`] or directly from configuration
/// when the device id was captured out-of-band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appliance {
    pub device_id: String,
    pub module_idx: u32,
}

impl Appliance {
    pub fn new(device_id: impl Into<String>, module_idx: u32) -> Self {
        Self {
            device_id: device_id.into(),
            module_idx,
        }
    }
}

/// Response of `GET /cooking/sessions/`.
#[derive(Debug, Deserialize)]
pub(crate) struct SessionsResponse {
    #[serde(default)]
    pub sessions: Vec<CookingSession>,
}

/// One active cooking session as reported by the cloud.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookingSession {
    #[serde(default)]
    pub device_id: Option<String>,
    /// Device state id, e.g. `kitchenos:DeviceState:Running`.
    #[serde(default)]
    pub device_state: Option<String>,
    /// The capability currently executing, if the cloud reports one.
    #[serde(default)]
    pub capability: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CookingSession {
    /// Friendly state label: the trailing segment of the state id
    /// (`kitchenos:DeviceState:Running` -> `Running`).
    pub fn state_label(&self) -> Option<&str> {
        self.device_state
            .as_deref()
            .map(|s| s.rsplit(':').next().unwrap_or(s))
    }
}

/// The client's understanding of a device's program state, mirroring
/// vendor semantics: `Idle --start--> Active --update*--> Active
/// --cancel--> Idle`. Starting while Active is a vendor-side no-op,
/// not a transition failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProgramState {
    /// Nothing observed yet (no command sent, no poll completed).
    #[default]
    Unknown,
    Idle,
    Active,
}
