//! # GroundModels CLI
//!
//! Command-line front end for `ground_core`: AGS/JSON conversion, AGSi
//! import, soil description checks, and building and querying the ground
//! models in a `.gmp` project file.

mod cli;
mod commands;
mod config;
mod error;
mod logging;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use ground_core::{load_project, GlobalSettings};
use std::path::Path;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("Error: {}", e);
        if let error::CliError::Ground(ground) = &e {
            if let Ok(json) = serde_json::to_string_pretty(ground) {
                debug!("Error JSON:\n{}", json);
            }
        }
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!("GroundModels CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let config = cli.config.as_deref();
    let output = match cli.command {
        Commands::Convert(args) => {
            let settings = config::resolve(config, &GlobalSettings::default())?;
            commands::convert::run(args, &settings)?
        }
        Commands::ToAgs(args) => commands::convert::run_to_ags(args)?,
        Commands::ImportAgsi(args) => {
            let settings = project_settings(config, &args.project)?;
            commands::project::run_import_agsi(args, &settings)?;
            None
        }
        Commands::Init(args) => {
            let settings = config::resolve(config, &GlobalSettings::default())?;
            commands::project::run_init(args, settings)?;
            None
        }
        Commands::AddSoil(args) => {
            commands::project::run_add_soil(args)?;
            None
        }
        Commands::AddLayer(args) => {
            commands::project::run_add_layer(args)?;
            None
        }
        Commands::Query(args) => Some(commands::model::run_query(args)?),
        Commands::Profile(args) => Some(commands::model::run_profile(args)?),
        Commands::StripLog(args) => Some(commands::model::run_strip_log(args)?),
        Commands::Describe(args) => Some(commands::describe::run_describe(args)?),
        Commands::SuggestParams(args) => Some(commands::describe::run_suggest_params(args)?),
    };

    if let Some(text) = output {
        print!("{}", text);
        if !text.ends_with('\n') {
            println!();
        }
    }
    info!("Command completed successfully.");
    Ok(())
}

/// Settings for a command that may create `project`: the `--config` file,
/// else the existing project's settings, else defaults.
fn project_settings(config: Option<&Path>, project: &Path) -> Result<GlobalSettings> {
    let fallback = if project.exists() {
        load_project(project)?.settings
    } else {
        GlobalSettings::default()
    };
    config::resolve(config, &fallback)
}
