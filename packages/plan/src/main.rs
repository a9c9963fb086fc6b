use blockwire_plan::cli::{self, Args};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let stdout = std::io::stdout();
    if let Err(e) = cli::run(&args, &mut stdout.lock()) {
        eprintln!("Error: {}", cli::describe(&e));
        std::process::exit(1);
    }
}
