use std::process::ExitCode;
use burn_ndarray::NdArray;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod error;
mod pipeline;

use cli::Cli;
use pipeline::Paths;

type Backend = NdArray<f32>;

fn init_tracing(cli: &Cli) {
    let filter = match cli.log_level() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let settings = cli.settings();
    tracing::debug!(?settings, "parsed arguments");

    let paths = Paths {
        input: &cli.input,
        displacement_field: &cli.displacement_field,
        output: &cli.output,
    };
    let device = Default::default();
    let mut stdout = std::io::stdout().lock();

    match pipeline::run::<Backend>(paths, &settings, &device, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(causes = ?&err.chain()[1..], "run failed");
            if let Err(io_err) = err.report(&mut stdout) {
                eprintln!("{err} ({io_err})");
            }
            ExitCode::FAILURE
        }
    }
}
