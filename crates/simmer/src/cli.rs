//! Clap derive structures for the `simmer` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// simmer -- command an Instant Pot through the KitchenOS cloud
#[derive(Debug, Parser)]
#[command(
    name = "simmer",
    version,
    about = "Control a cloud-connected Instant Pot from the command line",
    long_about = "Start, adjust, and cancel pressure-cook and keep-warm programs on a\n\
        Fresco KitchenOS connected appliance, from your terminal.\n\n\
        Authenticates with your account email/password, or with a bearer token\n\
        captured from the vendor app.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Account profile to use
    #[arg(long, short = 'p', env = "SIMMER_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device id to command (overrides profile)
    #[arg(long, short = 'd', env = "SIMMER_DEVICE", global = true)]
    pub device: Option<String>,

    /// Cooking-module index on the device
    #[arg(long, env = "SIMMER_MODULE", global = true)]
    pub module: Option<u32>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SIMMER_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, env = "SIMMER_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

// ── Command Tree ─────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the appliances registered to the account
    Devices(DevicesArgs),

    /// Show active cooking sessions
    Status(StatusArgs),

    /// Cancel the active program (safe when the appliance is idle)
    Cancel,

    /// Keep-warm programs
    Warm(WarmArgs),

    /// Pressure-cook programs
    Cook(CookArgs),

    /// Manage configuration profiles
    Config(ConfigArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: Option<DevicesCommand>,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List appliances (default)
    List,
    /// Dump the capability document for an appliance model
    Caps {
        /// Model id (defaults to the profile's model)
        model_id: Option<String>,
    },
}

// ── Status ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Keep polling and print updates until interrupted
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Poll period in seconds (with --watch)
    #[arg(long, default_value = "30")]
    pub interval: u64,
}

// ── Keep warm ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WarmArgs {
    #[command(subcommand)]
    pub command: WarmCommand,
}

#[derive(Debug, Subcommand)]
pub enum WarmCommand {
    /// Start a keep-warm program
    Start {
        /// Target temperature in °C (25-95)
        #[arg(long, conflicts_with = "preset")]
        temp_c: Option<u32>,

        /// Nominal preset instead of a temperature: Low or High
        #[arg(long)]
        preset: Option<String>,

        /// Duration in seconds (up to 24h)
        #[arg(long)]
        duration_seconds: u32,
    },
    /// Adjust the active keep-warm program
    Update {
        /// Target temperature in °C (25-95)
        #[arg(long, conflicts_with = "preset")]
        temp_c: Option<u32>,

        /// Nominal preset instead of a temperature: Low or High
        #[arg(long)]
        preset: Option<String>,

        /// Duration in seconds (up to 24h)
        #[arg(long)]
        duration_seconds: Option<u32>,
    },
}

// ── Pressure cook ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CookArgs {
    #[command(subcommand)]
    pub command: CookCommand,
}

#[derive(Debug, Subcommand)]
pub enum CookCommand {
    /// Start a pressure-cook program
    Start {
        /// Pressure level: Low, High, or Max
        #[arg(long)]
        pressure: String,

        /// Cook time in seconds (up to 5h)
        #[arg(long)]
        cook_time_seconds: u32,

        /// Venting mode: Natural, Pulse, Quick, or NaturalQuick
        #[arg(long, default_value = "Natural")]
        venting: String,

        /// Venting time in seconds (up to 1h); appliance default when omitted
        #[arg(long)]
        vent_time_seconds: Option<u32>,

        /// Enable the NutriBoost enhancement
        #[arg(long)]
        nutriboost: bool,
    },
    /// Adjust the active pressure-cook program
    Update {
        /// Pressure level: Low, High, or Max
        #[arg(long)]
        pressure: Option<String>,

        /// Cook time in seconds (up to 5h)
        #[arg(long)]
        cook_time_seconds: Option<u32>,

        /// Venting mode: Natural, Pulse, Quick, or NaturalQuick
        #[arg(long)]
        venting: Option<String>,

        /// Venting time in seconds (up to 1h)
        #[arg(long)]
        vent_time_seconds: Option<u32>,

        /// Enable or disable the NutriBoost enhancement
        #[arg(long)]
        nutriboost: Option<bool>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactively create or update a profile
    Init,
    /// Print the loaded configuration (secrets masked)
    Show,
    /// Store an account password in the system keyring
    SetPassword,
    /// Store a captured bearer token in the system keyring
    SetToken,
    /// Print the config file path
    Path,
}
