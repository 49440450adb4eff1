use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use cdp_cli::cli::{Cli, Commands};

mod commands;

use commands::solve::SolveArgs;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("failed to install tracing subscriber");
    }

    let result = match &cli.command {
        Some(Commands::Solve {
            input,
            out,
            formulation,
            sites,
            time_limit,
            config,
            skip_incomplete,
            accept_suboptimal,
            threads,
        }) => commands::solve::handle(SolveArgs {
            input: input.as_path(),
            out: out.as_path(),
            formulation: *formulation,
            sites: *sites,
            time_limit: *time_limit,
            config: config.as_deref(),
            skip_incomplete: *skip_incomplete,
            accept_suboptimal: *accept_suboptimal,
            threads: threads.as_str(),
        }),
        Some(Commands::Validate {
            input,
            sites,
            config,
        }) => commands::validate::handle(input, *sites, config.as_deref()),
        Some(Commands::Dataset { command }) => commands::dataset::handle(command),
        Some(Commands::Completions { shell, out }) => {
            commands::completions::handle(*shell, out.as_deref())
        }
        None => {
            info!("No subcommand provided. Use `cdp --help` for more information.");
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{e:#}");
        std::process::exit(1);
    }
}
