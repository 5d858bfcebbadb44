mod args;
mod bws;

use clap::Parser;
use log::{info, LevelFilter};
use snafu::ErrorCompat;

use crate::args::{Args, Command};

const LOG_ENV: &str = "RUST_LOG";

/// The filter forced by the command line. An explicit RUST_LOG always wins.
fn forced_level(verbose: bool, rust_log: Option<&str>) -> Option<LevelFilter> {
    match rust_log {
        Some(s) if !s.trim().is_empty() => None,
        _ if verbose => Some(LevelFilter::Debug),
        _ => None,
    }
}

fn main() {
    let args = Args::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    let rust_log = std::env::var(LOG_ENV).ok();
    if let Some(level) = forced_level(args.verbose, rust_log.as_deref()) {
        builder.filter_level(level);
    }
    builder.init();

    info!("args: {:?}", args);

    let res = match &args.command {
        Command::Generate(generate_args) => bws::run_generate(generate_args),
        Command::Score(score_args) => bws::run_score(score_args),
    };

    if let Err(e) = res {
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("{}", bt);
        }
        std::process::exit(1);
    }
}
