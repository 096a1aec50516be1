//! The command line interface for the planner.
use crate::input::load_parameters;
use crate::input::prompt::collect_from_console;
use crate::log;
use crate::model::build_model;
use crate::parameters::Parameters;
use crate::report::Report;
use crate::settings::Settings;
use crate::solver::{SolverOptions, default_backends, solve};
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the planner.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Find the most profitable production plan.
    Solve {
        /// Path to a TOML file of parameters. If omitted, parameters are entered at prompts.
        params_file: Option<PathBuf>,
    },
    /// Manage example plans.
    Example {
        /// The available subcommands for managing example plans.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Check that a parameters file describes a valid plan.
    Validate {
        /// Path to a TOML file of parameters.
        params_file: PathBuf,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Solve { params_file } => handle_solve_command(params_file.as_deref(), None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { params_file } => handle_validate_command(&params_file, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start wineopt
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ wineopt --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load program settings, if not provided
fn settings_or_load(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Warn about premium wines whose production may be cut off by Big-M
fn warn_if_big_m_limits_production(params: &Parameters) {
    for j in params.premium_wines_limited_by_big_m() {
        let wine = params.premium_wine_index(j);
        match params.production_cap(wine) {
            Some(cap) => warn!(
                "Big-M ({}) is smaller than the production cap of premium wine {} ({cap}). \
                 Its production may be limited by Big-M.",
                params.big_m,
                wine + 1
            ),
            None => warn!(
                "Production of premium wine {} is unbounded, so it will be limited by Big-M ({}).",
                wine + 1,
                params.big_m
            ),
        }
    }
}

/// Build the optimisation problem for a plan, solve it and report on the solution.
///
/// # Returns
///
/// The report for the best plan found, or an error if the parameters are inconsistent or no
/// backend could solve the problem.
pub fn solve_plan(params: &Parameters, options: SolverOptions) -> Result<Report> {
    let model = build_model(params)?;
    warn_if_big_m_limits_production(params);
    info!(
        "Built model with {} variables and {} constraints",
        model.problem.variables().len(),
        model.problem.constraints().len()
    );

    let solution = solve(&model.problem, &default_backends(options))?;
    Ok(Report::new(params, &model.variables, &solution))
}

/// Handle the `solve` command.
pub fn handle_solve_command(params_file: Option<&Path>, settings: Option<Settings>) -> Result<()> {
    let settings = settings_or_load(settings)?;

    // Initialise program logger
    log::init(Some(&settings.log_level)).context("Failed to initialise logging.")?;

    let params = match params_file {
        Some(path) => {
            let params = load_parameters(path)?;
            info!("Loaded parameters from {}", path.display());
            params
        }
        None => collect_from_console().context("Failed to read parameters.")?,
    };

    let report = solve_plan(&params, settings.solver_options())?;
    println!("{report}");

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(params_file: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = settings_or_load(settings)?;

    // Initialise program logger
    log::init(Some(&settings.log_level)).context("Failed to initialise logging.")?;

    // Load parameters and check they make a valid model
    let params = load_parameters(params_file)?;
    let model = build_model(&params).context("Failed to validate parameters.")?;
    warn_if_big_m_limits_production(&params);
    info!(
        "Parameters are valid: {} wines ({} premium), {} resources, {} constraints",
        params.num_wines(),
        params.num_premium,
        params.num_resources(),
        model.problem.constraints().len()
    );

    Ok(())
}
