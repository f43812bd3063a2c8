mod adjudicate;
mod args;
mod format;
mod game;
mod progress;
mod worker;

use args::Args;
use clap::Parser;
use log::LevelFilter;
use nnue::Network;
use simplelog::{Config, SimpleLogger};
use std::{
    error::Error,
    fs,
    process::ExitCode,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use worker::Generator;

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = SimpleLogger::init(LevelFilter::Info, Config::default()) {
        eprintln!("failed to initialize logging: {}", err);
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    // A bad network file must abort before any worker starts.
    let network = Network::load(&args.nnue).map(Arc::new)?;
    log::info!("loaded network from {}", args.nnue.display());

    let stop_flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop_flag);
    ctrlc::set_handler(move || {
        log::info!("received SIGINT, finishing current games...");
        handler_flag.store(true, Ordering::Relaxed);
    })?;

    fs::create_dir_all(&args.output)?;

    let threads = if args.threads == 0 {
        num_cpus::get()
    } else {
        args.threads
    };

    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("base seed: {}", seed);

    if args.games > 0 {
        log::info!("generating {} games per thread", args.games);
    } else {
        log::info!("generating until interrupted (Ctrl+C)");
    }

    let generator = Generator::new(threads, args.games, seed);
    let summary = generator.run(network, &args.output, stop_flag)?;

    log::info!(
        "generation complete: {} positions from {} games ({:.0} positions/sec)",
        summary.positions,
        summary.games,
        summary.throughput
    );

    Ok(())
}
