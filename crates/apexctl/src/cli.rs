//! Clap derive structures for the `apexctl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use apex_core::OutputState;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// apexctl -- command-line control for Neptune Apex aquarium controllers
#[derive(Debug, Parser)]
#[command(
    name = "apexctl",
    version,
    about = "Monitor and control Neptune Apex aquarium controllers",
    long_about = "Monitor and control Neptune Apex aquarium controllers.\n\n\
        Talks to the controller's local REST API, falling back to the\n\
        classic CGI interface on older firmware.",
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
    /// Controller profile to use
    #[arg(long, short = 'p', env = "APEX_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller address (overrides profile)
    #[arg(long, short = 'H', env = "APEX_HOST", global = true)]
    pub host: Option<String>,

    /// Login name (overrides profile)
    #[arg(long, short = 'u', env = "APEX_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "APEX_OUTPUT",
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

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "APEX_TIMEOUT", global = true)]
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
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show controller identity and a summary of its state
    #[command(alias = "st")]
    Status,

    /// List probe and variable readings
    #[command(alias = "in")]
    Inputs,

    /// List and switch outputs
    #[command(alias = "out")]
    Outputs(OutputsArgs),

    /// Show the controller's editable configuration
    Config(ConfigArgs),

    /// Program virtual outputs
    #[command(alias = "var")]
    Variable(VariableArgs),

    /// Program heater setpoints
    #[command(alias = "temp")]
    Temperature(TemperatureArgs),

    /// Drive DOS/DQD dosing pumps
    Dose(DoseArgs),

    /// Show or install controller firmware
    #[command(alias = "fw")]
    Firmware(FirmwareArgs),

    /// Manage apexctl profiles and credentials
    Profile(ProfileArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Outputs ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct OutputsArgs {
    #[command(subcommand)]
    pub command: OutputsCommand,
}

#[derive(Debug, Subcommand)]
pub enum OutputsCommand {
    /// List outputs and their states
    #[command(alias = "ls")]
    List,

    /// Switch an output to AUTO, ON, or OFF
    Set {
        /// Output device id (e.g. 2_1)
        did: String,
        /// AUTO, ON, or OFF
        state: OutputState,
    },
}

// ── Device config ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show configuration records
    Show {
        /// Limit to one section
        #[arg(long, short = 's')]
        section: Option<ConfigSection>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigSection {
    /// Output programs
    Oconf,
    /// Expansion modules
    Mconf,
    /// Profiles
    Pconf,
    /// Inputs
    Iconf,
    /// Network and firmware
    Nconf,
}

// ── Programs ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct VariableArgs {
    #[command(subcommand)]
    pub command: VariableCommand,
}

#[derive(Debug, Subcommand)]
pub enum VariableCommand {
    /// Replace the program of an Advanced output
    Set {
        /// Output device id
        did: String,
        /// Program text; use `\n` between lines
        code: String,
    },
}

#[derive(Debug, Args)]
pub struct TemperatureArgs {
    #[command(subcommand)]
    pub command: TemperatureCommand,
}

#[derive(Debug, Subcommand)]
pub enum TemperatureCommand {
    /// Program a heater output to hold a setpoint
    Set {
        /// Heater output device id
        did: String,
        /// Target temperature, in the controller's unit
        target: f64,
    },
}

// ── Dosing ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DoseArgs {
    #[command(subcommand)]
    pub command: DoseCommand,
}

#[derive(Debug, Subcommand)]
pub enum DoseCommand {
    /// Run a pump head at a continuous rate
    Set {
        /// Pump head id: {module}_{pump}, e.g. 5_1
        did: String,
        /// Profile slot to overwrite (1-based)
        #[arg(long, short = 's')]
        slot: u32,
        /// Rate in mL/min; 0 stops the pump
        #[arg(allow_negative_numbers = true)]
        rate: f64,
    },

    /// Mark a pump head's reservoir as full
    Refill {
        /// Pump head id: {module}_{pump}
        did: String,
    },
}

// ── Firmware ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FirmwareArgs {
    #[command(subcommand)]
    pub command: FirmwareCommand,
}

#[derive(Debug, Subcommand)]
pub enum FirmwareCommand {
    /// Show installed and available versions
    Show,
    /// Install the latest available firmware
    Update,
}

// ── Profiles ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Interactive profile setup
    Init,
    /// Show the configuration file (secrets redacted)
    Show,
    /// Store a profile's password in the system keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
