//! Config subcommand handlers.

use std::path::PathBuf;

use clap::ValueEnum;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

fn target_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(netsig_config::config_path)
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&target_path(global).display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            let path = target_path(global);
            netsig_config::init_config(&path, force)?;
            output::print_output(&format!("Wrote {}", path.display()), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = super::load_config(global)?;
            // Fail loudly on values the engine would reject.
            cfg.to_signal_config()?;

            let format = match global.output {
                Some(f) => f,
                None => OutputFormat::from_str(&cfg.defaults.output, true).unwrap_or(OutputFormat::Table),
            };
            let as_toml = |c: &netsig_config::Config| {
                toml::to_string_pretty(c).unwrap_or_else(|e| format!("# failed to render: {e}"))
            };
            let rendered = output::render_single(format, &cfg, as_toml, as_toml)?;
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }
    }
}
