use clap::{Parser, Subcommand};
use lazycat_core::AppConfig;

mod commands;
mod desktop;
mod session;

#[derive(Parser)]
#[command(name = "lazycat", version, about = "LazyCat work/rest timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the timer in the foreground until Ctrl-C
    Run(commands::run::RunArgs),
    /// Answer the first-run questions and get recommended durations
    Onboard(commands::onboard::OnboardArgs),
    /// User preferences
    Prefs {
        #[command(subcommand)]
        action: commands::prefs::PrefsAction,
    },
    /// Accumulated work time
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Initialize logging. `RUST_LOG` wins over the configured level.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("lazycat={level},lazycat_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default();
    init_logging(&config.log.level);

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args, &config),
        Commands::Onboard(args) => commands::onboard::run(args),
        Commands::Prefs { action } => commands::prefs::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
