use clap::Parser;
use log::{error, Level};
use simple_logger::init_with_level;

use nanoamp::{
    cli::{Args, SubArgs},
    conda::CondaCli,
    config::Config,
    core,
};

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();

    let args: Args = Args::parse();
    let manager = CondaCli;

    let result = match args.command {
        SubArgs::Run { args } => {
            Config::read(args.config).and_then(|config| core::run(config, &manager))
        }
        SubArgs::Envs => core::show_envs(&manager),
        SubArgs::Models { args } => core::show_models(&manager, &args),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }

    let elapsed = start.elapsed();
    log::info!("Elapsed time: {:.3?}", elapsed);
}
