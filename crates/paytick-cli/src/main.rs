use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "paytick", version, about = "Real-time earnings timer")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress logs and notices
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Rate, start time and duration of the active mode
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Active mode (default or alternate)
    Mode {
        #[command(subcommand)]
        action: commands::mode::ModeAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Saved data management
    Data {
        #[command(subcommand)]
        action: commands::data::DataAction,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("paytick=debug")
    } else {
        EnvFilter::new("paytick=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action, cli.quiet).await,
        Commands::Settings { action } => commands::settings::run(action, cli.quiet),
        Commands::Mode { action } => commands::mode::run(action, cli.quiet),
        Commands::Config { action } => commands::config::run(action),
        Commands::Data { action } => commands::data::run(action, cli.quiet),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
