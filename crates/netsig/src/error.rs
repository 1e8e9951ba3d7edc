//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use netsig_config::ConfigError;
use netsig_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const INPUT: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Script input ─────────────────────────────────────────────────
    #[error("Could not read script {path}")]
    #[diagnostic(code(netsig::script_read))]
    ScriptRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid script {path}: {reason}")]
    #[diagnostic(
        code(netsig::script_parse),
        help(
            "A script has an optional `initial` map (wifi / ethernet status)\n\
             and a `steps` list of {{transport, event}}, {{radio_on}} or {{carrier_name}} entries."
        )
    )]
    ScriptParse { path: String, reason: String },

    #[error("Step {step} was rejected")]
    #[diagnostic(
        code(netsig::step_rejected),
        help("Drop --strict to skip rejected events and keep replaying.")
    )]
    StepRejected {
        step: usize,
        #[source]
        source: CoreError,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netsig::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(netsig::config),
        help("Check the config file, or recreate it with: netsig config init --force")
    )]
    Config(#[from] ConfigError),

    // ── Engine ───────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(netsig::core))]
    Core(CoreError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {reason}")]
    #[diagnostic(code(netsig::render))]
    Render { reason: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ScriptRead { .. } | Self::ScriptParse { .. } | Self::StepRejected { .. } => {
                exit_code::INPUT
            }
            Self::Validation { .. } => exit_code::USAGE,
            Self::Config(_) | Self::Core(CoreError::Config { .. }) => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}
