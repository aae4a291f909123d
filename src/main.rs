mod cli;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    stmtx::logging::setup_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init { config_dir, force } => cli::init::run(config_dir.as_deref(), force),
        Commands::Sections {
            statement_type,
            config_dir,
        } => cli::sections::run(statement_type.as_deref(), config_dir.as_deref()),
        Commands::Parse {
            file,
            statement_type,
            config_dir,
            format,
            output,
        } => cli::parse::run(
            &file,
            statement_type.as_deref(),
            config_dir.as_deref(),
            format,
            output.as_deref(),
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
