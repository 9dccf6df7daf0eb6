use std::{
    io::{self, BufWriter},
    process::ExitCode,
};

use clap::Parser;
use env_logger::Env;

use sha1append::{run, AppError, Args, Config};

//RUST_LOG=debug sha1append <digest> <attacker-string>
fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("off")).init();

    let args = Args::parse();
    let outcome = Config::from_args(args)
        .map_err(AppError::from)
        .and_then(|config| run(&config, &mut BufWriter::new(io::stdout().lock())));

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sha1append: {e}");
            ExitCode::FAILURE
        }
    }
}
