mod assets;
mod cli;
mod dispatch;
mod domain;
mod locks;
mod settings;
mod slug;
mod store;

use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), dispatch::CliError> {
    use clap::Parser;

    let cli = cli::Cli::parse();
    init_logging(&cli.log);

    let store = store::Store::open(&cli.root)?;
    dispatch::run_command(&store, cli.command)
}

/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_logging(directive: &str) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|err| {
        eprintln!("warning: ignoring invalid log filter '{directive}': {err}");
        EnvFilter::new("warn")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
