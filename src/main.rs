mod cli;
mod error;
mod fmt;
mod loader;
mod logging;
mod models;
mod reports;
mod settings;
mod tui;

use clap::Parser;

use cli::{Cli, Commands, LedgerSource};
use error::Result;
use settings::{load_settings, Settings};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let settings = load_settings();
    if let Err(e) = dispatch(&cli, &settings) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn dispatch(cli: &Cli, settings: &Settings) -> Result<()> {
    let source = || LedgerSource::resolve(cli.file.as_deref(), cli.delimiter, settings);

    match &cli.command {
        Some(Commands::Summary) => cli::report::summary(&source()?, settings),
        Some(Commands::Day { date }) => cli::report::day(&source()?, settings, date),
        Some(Commands::Dates) => cli::report::dates(&source()?),
        Some(Commands::Methods) => cli::report::methods(&source()?),
        Some(Commands::Distribution { bins }) => {
            cli::report::distribution(&source()?, settings, *bins)
        }
        Some(Commands::Reformat { input, output }) => cli::reformat::run(
            input,
            output.as_deref(),
            cli.delimiter.unwrap_or(settings.delimiter),
        ),
        Some(Commands::Use { path }) => cli::use_ledger::run(path, cli.delimiter),
        Some(Commands::Config) => cli::config::run(),
        Some(Commands::Dashboard) | None => cli::dashboard::run(&source()?, settings),
    }
}
