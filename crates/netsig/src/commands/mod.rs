//! Command dispatch: bridges CLI args -> engine -> output formatting.

pub mod config_cmd;
pub mod replay;
pub mod resolve;

use clap::ValueEnum;

use netsig_config::Config;

use crate::cli::{ColorMode, Command, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Resolved settings every engine-bound command needs.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

impl Context {
    /// Load the config file and fold CLI flags over its `[defaults]`.
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let config = load_config(global)?;

        let format = match global.output {
            Some(format) => format,
            None => parse_value::<OutputFormat>("defaults.output", &config.defaults.output)?,
        };
        let color_mode = match global.color {
            Some(mode) => mode,
            None => parse_value::<ColorMode>("defaults.color", &config.defaults.color)?,
        };

        Ok(Self {
            config,
            format,
            color: output::should_color(color_mode),
            quiet: global.quiet,
        })
    }
}

fn parse_value<T: ValueEnum>(field: &str, raw: &str) -> Result<T, CliError> {
    T::from_str(raw, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}

/// The explicit `--config` file if given, else the platform default.
pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let config = match &global.config {
        Some(path) => netsig_config::load_config_from(path)?,
        None => netsig_config::load_config()?,
    };
    Ok(config)
}

/// Dispatch an engine-bound command to the appropriate handler.
pub fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Replay(args) => replay::handle(&args, &Context::load(global)?),
        Command::Resolve(args) => resolve::handle(&args, &Context::load(global)?),
        Command::Config(args) => config_cmd::handle(&args, global),
        // Completions need the full clap command and are handled in main
        Command::Completions(_) => Ok(()),
    }
}
