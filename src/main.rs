use clap::Parser;
use squigview::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{cluster, stats},
    utils::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    let subcommand_name = match cli.command {
        Command::Stats(_) => "stats",
        Command::Cluster(_) => "cluster",
    };

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        *FULL_VERSION,
        subcommand_name
    );
    match cli.command {
        Command::Stats(args) => stats::stats(args)?,
        Command::Cluster(args) => cluster::cluster(args)?,
    }
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
