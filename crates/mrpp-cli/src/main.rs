//! mrpp Command Line Interface
//!
//! This crate contains the mrpp CLI that builds GR(1) specifications for
//! multi-robot motion planning problems on grids and inspects the packed
//! encoding of joint robot positions.

use clap::Parser;
use cli::{Cli, Commands, initialize_logger};
use human_panic::setup_panic;
use log::info;
use mrpp_encoder::transitions::TransitionOptions;

mod cli;
mod problem_config;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_panic!();

    // parse the cli arguments
    let cli = Cli::parse();
    initialize_logger(cli.log_config)?;

    match cli.command {
        Commands::Spec {
            problem_file,
            output,
            format,
            config_file,
        } => {
            info!("Reading problem file '{}'", problem_file.display());
            let problem = cli::read_problem(problem_file, config_file)?;

            let out = cli::build_specification(&problem, format)?;
            cli::write_output(&out, output)?;

            info!("Finished building the specification. Goodbye!");
            Ok(())
        }
        Commands::Transitions {
            grid,
            robots,
            stay,
            parallel,
        } => {
            let options = TransitionOptions {
                parallel,
                allow_stay: stay,
            };
            let out = cli::transitions(grid, robots, options)?;
            cli::write_output(&out, None)?;
            Ok(())
        }
        Commands::Decode {
            grid,
            robots,
            states,
        } => {
            let out = cli::decode(grid, robots, &states)?;
            cli::write_output(&out, None)?;
            Ok(())
        }
        Commands::Encode { grid, cells } => {
            let out = cli::encode(grid, &cells)?;
            cli::write_output(&out, None)?;
            Ok(())
        }
    }
}
