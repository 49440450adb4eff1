use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cdp", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Which formulation(s) `cdp solve` builds.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormulationArg {
    /// Flat expansion with a one-time fee, aggregate new builds
    Flat,
    /// Tiered expansion pricing, optional site-level builds
    Tiered,
    /// Both formulations, solved in parallel
    Both,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve a capacity expansion plan
    Solve {
        /// Region data (JSON mapping region key -> record)
        #[arg(long, value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Output directory for plan tables and summary
        #[arg(long, value_hint = ValueHint::DirPath)]
        out: PathBuf,
        /// Formulation to solve
        #[arg(long, value_enum, default_value_t = FormulationArg::Tiered)]
        formulation: FormulationArg,
        /// Place new facilities at candidate sites (tiered only)
        #[arg(long)]
        sites: bool,
        /// Wall-clock limit for the solver in seconds
        #[arg(long)]
        time_limit: Option<f64>,
        /// TOML file with [parameters] and [solver] overrides
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
        /// Drop regions that fail validation instead of aborting
        #[arg(long)]
        skip_incomplete: bool,
        /// Exit successfully even when the plan is not proven optimal
        #[arg(long)]
        accept_suboptimal: bool,
        /// Threads to use (`auto` = number of CPUs)
        #[arg(long, default_value = "auto")]
        threads: String,
    },
    /// Validate region data without solving
    Validate {
        /// Region data (JSON mapping region key -> record)
        #[arg(long, value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Also check that site-level planning has the coordinates it needs
        #[arg(long)]
        sites: bool,
        /// TOML file with [parameters] overrides
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
    },
    /// Region dataset utilities
    Dataset {
        #[command(subcommand)]
        command: DatasetCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DatasetCommands {
    /// Build region JSON from the public source tables
    Build {
        /// Average individual income by ZIP (CSV)
        #[arg(long, value_hint = ValueHint::FilePath)]
        income: PathBuf,
        /// Employment rate by ZIP (CSV)
        #[arg(long, value_hint = ValueHint::FilePath)]
        employment: PathBuf,
        /// Population by age band and ZIP (CSV)
        #[arg(long, value_hint = ValueHint::FilePath)]
        population: PathBuf,
        /// Regulated child care facilities (CSV)
        #[arg(long, value_hint = ValueHint::FilePath)]
        childcare: PathBuf,
        /// Potential new facility locations (CSV)
        #[arg(long, value_hint = ValueHint::FilePath)]
        locations: PathBuf,
        /// Output region JSON
        #[arg(long, value_hint = ValueHint::FilePath)]
        out: PathBuf,
    },
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
