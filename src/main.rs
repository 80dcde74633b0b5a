use clap::Parser;
use log::{debug, LevelFilter};
use snafu::ErrorCompat;

mod args;
mod experiment;

use crate::experiment::config_reader::Overrides;

fn main() {
    let args = args::Args::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
    debug!("args: {:?}", args);

    let overrides = Overrides {
        seed: args.seed,
        num_elections: args.num_elections,
        num_instances: args.num_instances,
        output_directory: args.output_directory.clone(),
    };

    let res = experiment::run_experiment(args.config, &overrides, args.out, args.reference);
    if let Err(e) = res {
        eprintln!("An error occured: {}", e);
        for cause in ErrorCompat::iter_chain(&e).skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
