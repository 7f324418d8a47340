use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use docuchat::core::interrupt::{self, CancelToken};
use docuchat::session::{Assistant, Session, TerminalPrompter};
use docuchat::Config;

#[derive(Parser)]
#[command(name = "docuchat")]
#[command(about = "Index PDF documents and chat with them using a language model", long_about = None)]
#[command(version)]
struct Cli {}

fn main() -> anyhow::Result<()> {
    let _cli = Cli::parse();

    dotenv::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    let cancel = CancelToken::new();
    interrupt::install_handler(cancel.clone())?;

    let backend = Assistant::from_config(&config)?;
    let mut session = Session::new(
        config.paths.clone(),
        TerminalPrompter::new(),
        backend,
        std::io::stdout(),
        cancel,
    );

    let result = session.run();
    interrupt::reset_terminal();

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_interrupt() => Ok(()),
        Err(e) => {
            tracing::error!(error = %e, "session aborted");
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("DOCUCHAT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
