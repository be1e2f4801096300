use anyhow::Result;
use chrono::Local;
use clap::Parser;
use increback::commands::Cli;
use increback::config::Config;
use increback::runner::{ProcessExecutor, RunOptions, Runner, Summary};
use increback::{Error, path, snapshot, sysexits};
use std::path::Path;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Entry point for the increback CLI application.
/// Loads the configuration and backs up every active item in turn.
fn main() {
    let cli = Cli::parse();
    let config_file = cli.config.clone().unwrap_or_else(path::default_config_file);

    // Colors are configurable, so the configuration is read before logging starts.
    let config = Config::load(&config_file);
    let colorize = !cli.no_colors && config.as_ref().is_ok_and(Config::colorize);
    init_logging(cli.verbosity, colorize);

    if let Err(err) = run(&cli, &config_file, config) {
        error!("{err}");
        let code = err
            .downcast_ref::<Error>()
            .map_or(sysexits::EX_SOFTWARE, Error::exit_code);
        process::exit(code);
    }
}

fn run(cli: &Cli, config_file: &Path, config: increback::Result<Config>) -> Result<()> {
    info!("Reading configuration from [ {} ]", config_file.display());
    let config = config?.with_default_nlink(cli.nlink);

    let options = RunOptions {
        dry_run: cli.dry_run,
        verbose: cli.verbose(),
        program: cli.rsync.clone(),
        today: snapshot::snapshot_name(Local::now().date_naive()),
    };
    let mut runner = Runner::new(&config, options, ProcessExecutor);
    let outcomes = runner.run()?;
    info!("{}", Summary::new(&outcomes));
    Ok(())
}

/// Installs the console logger on stderr. `RUST_LOG` overrides the verbosity.
fn init_logging(verbosity: u8, colorize: bool) {
    let level = match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(colorize)
        .with_target(false)
        .init();
}
