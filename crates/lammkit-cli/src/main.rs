mod cli;
mod commands;
mod config;
mod error;
mod logging;

use clap::Parser;
use tracing::{debug, error, info};

use crate::cli::{Cli, Commands};
use crate::error::Result;

fn main() {
    if let Err(e) = run_app() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!("lammkit v{} starting up", env!("CARGO_PKG_VERSION"));
    debug!("full arguments parsed: {:?}", &cli);

    let config = config::FileConfig::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Info(args) => {
            debug!("dispatching to 'info'");
            commands::info::run(args, &config)
        }
        Commands::Rewrite(args) => {
            debug!("dispatching to 'rewrite'");
            commands::rewrite::run(args, &config)
        }
        Commands::Retype(args) => {
            debug!("dispatching to 'retype'");
            commands::retype::run(args, &config)
        }
        Commands::Thermo(args) => {
            debug!("dispatching to 'thermo'");
            commands::thermo::run(args, &config)
        }
    };

    match &result {
        Ok(_) => info!("command completed"),
        Err(e) => error!("command failed: {}", e),
    }
    result
}
