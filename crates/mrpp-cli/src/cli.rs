//! Command Line Interface for mrpp
//!
//! mrpp uses the `clap` crate to parse command line arguments and create the
//! CLI interface. This module defines all available commands and options (and
//! their documentation) as well as the functions executing them.

use std::{fmt::Write as _, fs, path::PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::Config;
use log::{LevelFilter, debug, info};
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
};
use mrpp_encoder::{
    problem::ProblemEncoder,
    transitions::{TransitionGenerator, TransitionOptions},
};
use mrpp_gr1::specification::GR1Specification;
use mrpp_grid::{Cell, Grid, Workspace, codec::StateId};

use crate::problem_config::ProblemConfig;

/// Prefix of environment variables overriding problem and encoder options
pub const ENV_PREFIX: &str = "MRPP";

/// mrpp - GR(1) specifications for multi-robot motion planning
///
/// Build GR(1) specifications for teams of robots moving on a grid. The joint
/// position of all robots is packed into a single integer state, goals are
/// translated into propositional formulas over that state. The resulting
/// specification can be handed to a reactive synthesis tool.
///
/// You can use the --help / -h flag to get all available commands and
/// options.
#[derive(Parser, Debug)]
#[command(version, name = "mrpp", about, long_about)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) log_config: LoggerConfig,
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Build the full specification of a problem file
    Spec {
        /// Location and name of the problem file (e.g. `.toml` or `.json`)
        problem_file: PathBuf,

        /// Output file to save the specification to (default: stdout)
        #[arg(short, long, value_name = "OUTPUT_FILE")]
        output: Option<PathBuf>,

        /// Format of the specification
        #[arg(short, long, value_enum, default_value_t = SpecFormat::Text)]
        format: SpecFormat,

        /// Configuration file overriding the encoder options of the problem
        #[arg(short, long, value_name = "CONFIG_FILE")]
        config_file: Option<PathBuf>,
    },
    /// Print the transition formulas of a workspace
    Transitions {
        #[command(flatten)]
        grid: GridArgs,

        /// Number of robots
        #[arg(long, value_name = "ROBOTS")]
        robots: usize,

        /// Allow robots to remain in their cell
        #[arg(long, default_value_t = false)]
        stay: bool,

        /// Enumerate the joint states in parallel
        #[arg(short, long, default_value_t = false)]
        parallel: bool,
    },
    /// Print the coordinates of all robots in joint states
    Decode {
        #[command(flatten)]
        grid: GridArgs,

        /// Number of robots
        #[arg(long, value_name = "ROBOTS")]
        robots: usize,

        /// Joint states to decode
        #[arg(required = true)]
        states: Vec<u64>,
    },
    /// Print the joint state of robots placed in cells
    Encode {
        #[command(flatten)]
        grid: GridArgs,

        /// Cell of every robot, robot 0 first
        #[arg(required = true)]
        cells: Vec<Cell>,
    },
}

/// Output format of a specification
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum SpecFormat {
    /// Sectioned text form
    Text,
    /// JSON document
    Json,
}

#[derive(Debug, Copy, Clone, Args)]
pub(crate) struct GridArgs {
    /// Number of rows of the grid
    #[arg(long, value_name = "ROWS")]
    rows: usize,

    /// Number of columns of the grid
    #[arg(long, value_name = "COLS")]
    cols: usize,
}

impl GridArgs {
    fn grid(&self) -> Result<Grid, anyhow::Error> {
        Grid::new(self.rows, self.cols).with_context(|| "Invalid grid")
    }

    fn workspace(&self, robots: usize) -> Result<Workspace, anyhow::Error> {
        Workspace::new(self.grid()?, robots).with_context(|| "Invalid workspace")
    }
}

#[derive(Debug, Args)]
pub(crate) struct LoggerConfig {
    /// Read the logger configuration from file.
    /// Logger configuration can be provided in the log4rs specification format.
    #[arg(long)]
    logger_config_file: Option<String>,

    /// Enable debug output.
    /// **Note**: This flag must be passed first, before any command.
    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

/// Initialize the logger as specified in `cfg`
///
/// By default the logger is configured to log to stderr. If a log4rs
/// configuration file is given in `cfg`, the configuration from that file will
/// be used instead
pub(crate) fn initialize_logger(cfg: LoggerConfig) -> Result<(), anyhow::Error> {
    if let Some(f) = cfg.logger_config_file {
        // Read logger configuration file
        log4rs::init_file(f, Default::default())
            .with_context(|| "Failed to read logger config file")?;
        return Ok(());
    }

    let p_encoder = match cfg.debug {
        true => PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S)} - {h({l})} - [{f}:{L} - {M}] - {m}{n}"),
        false => PatternEncoder::new("{d(%H:%M:%S)} - {h({l})} - {m}{n}"),
    };

    // Log to stderr, stdout is reserved for formulas
    let stderr = ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(p_encoder))
        .build();

    let mut level = LevelFilter::Info;
    if cfg.debug {
        level = LevelFilter::Debug;
    }

    let log_config = log4rs::Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .with_context(|| "Failed to build logger configuration")?;

    log4rs::init_config(log_config).with_context(|| "Failed to initialize console logger")?;
    Ok(())
}

/// Read a problem file
///
/// The problem file is layered with the optional configuration file and
/// environment variables prefixed with [`ENV_PREFIX`], e.g.
/// `MRPP_ENCODER__ENCODING=structured`.
pub(crate) fn read_problem(
    problem_file: PathBuf,
    config_file: Option<PathBuf>,
) -> Result<ProblemConfig, anyhow::Error> {
    if !problem_file.exists() {
        bail!(
            "Specified problem file '{}' does not exist.",
            problem_file.display()
        );
    }

    let mut settings = Config::builder().add_source(config::File::from(problem_file));

    // Check whether a configuration file was supplied
    if let Some(config_file) = config_file {
        if !config_file.exists() {
            bail!(
                "Specified configuration file '{}' does not exist.",
                config_file.display()
            );
        }

        settings = settings.add_source(config::File::from(config_file));
    }

    // Parse configuration from environment variables
    settings = settings.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    settings
        .build()
        .with_context(|| "Failed to read problem file")?
        .try_deserialize::<ProblemConfig>()
        .with_context(|| "Invalid problem file")
}

/// Build the specification of `problem` and render it in `format`
pub(crate) fn build_specification(
    problem: &ProblemConfig,
    format: SpecFormat,
) -> Result<String, anyhow::Error> {
    let encoder = ProblemEncoder::new(problem.encoder_options());
    debug!("Encoder options: {:?}", encoder.options());

    let spec = encoder.encode(&problem.to_problem()?)?;
    render_specification(&spec, format)
}

/// Render `spec` in `format`
pub(crate) fn render_specification(
    spec: &GR1Specification,
    format: SpecFormat,
) -> Result<String, anyhow::Error> {
    match format {
        SpecFormat::Text => Ok(spec.to_string()),
        SpecFormat::Json => serde_json::to_string_pretty(spec)
            .with_context(|| "Failed to serialize the specification"),
    }
}

/// Write `out` to `output` or stdout if no output file is given
pub(crate) fn write_output(out: &str, output: Option<PathBuf>) -> Result<(), anyhow::Error> {
    match output {
        Some(file) => {
            fs::write(&file, out).with_context(|| "Failed to write output file")?;
            info!("Wrote output to '{}'", file.display());
        }
        None => println!("{out}"),
    }
    Ok(())
}

/// Transition formulas of the workspace followed by a summary line
pub(crate) fn transitions(
    grid: GridArgs,
    robots: usize,
    options: TransitionOptions,
) -> Result<String, anyhow::Error> {
    let workspace = grid.workspace(robots)?;
    let relation = TransitionGenerator::new(&workspace, options).generate();

    let mut out = String::new();
    for transition in relation.transitions() {
        writeln!(out, "{transition}")?;
    }
    write!(
        out,
        "# {} transitions, {} dead states",
        relation.len(),
        relation.dead_states().len()
    )?;
    for state in relation.dead_states() {
        write!(out, "\n# dead: loc={state} {:?}", workspace.coordinates(*state))?;
    }

    Ok(out)
}

/// Coordinates of the robots in each of `states`, one line per state
pub(crate) fn decode(
    grid: GridArgs,
    robots: usize,
    states: &[u64],
) -> Result<String, anyhow::Error> {
    let workspace = grid.workspace(robots)?;

    let lines = states
        .iter()
        .map(|state| {
            if *state >= workspace.num_states() {
                bail!(
                    "State {state} is not a joint state of the {workspace}, states range from 0 to {}",
                    workspace.num_states() - 1
                );
            }
            let coordinates = workspace
                .coordinates(StateId::new(*state))
                .iter()
                .map(|(row, col)| format!("({row}, {col})"))
                .collect::<Vec<_>>()
                .join(" ");
            Ok(format!("loc={state}: {coordinates}"))
        })
        .collect::<Result<Vec<_>, anyhow::Error>>()?;

    Ok(lines.join("\n"))
}

/// Joint state of robots placed in `cells`
pub(crate) fn encode(grid: GridArgs, cells: &[Cell]) -> Result<String, anyhow::Error> {
    let workspace = grid.workspace(cells.len())?;

    if let Some(cell) = cells.iter().find(|cell| !workspace.grid().contains(**cell)) {
        bail!("Cell {cell} is not part of the {}", workspace.grid());
    }

    Ok(workspace.encode(cells).to_string())
}
