//! Artel CLI - Command-line client for the Artel marketplace.

mod commands;
mod output;

use artel_config::{Config, Paths};
use auth_engine::{
    ApiClient, AuthRepository, BusinessProfile, IndividualProfile, RegisterProfile,
    SessionMachine, WorkerProfile,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::debug;

/// Artel CLI - authenticate and inspect the current session.
#[derive(Parser)]
#[command(name = "artel")]
#[command(about = "Artel client for authentication and session management")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with email and password
    Login,

    /// Register a new account
    Register {
        #[command(subcommand)]
        command: RegisterCommands,
    },

    /// Logout and clear session
    Logout,

    /// Check authentication status
    Status,

    /// Show the profile of the active session
    Whoami,
}

#[derive(Subcommand)]
enum RegisterCommands {
    /// Register a worker account
    Worker {
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        /// Full name
        #[arg(long)]
        full_name: String,
    },
    /// Register a business account
    Business {
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        company_name: String,
        #[arg(long)]
        bin: String,
        #[arg(long)]
        inn: String,
        #[arg(long)]
        legal_address: String,
        #[arg(long)]
        contact_name: String,
        #[arg(long)]
        contact_number: String,
    },
    /// Register an individual account
    Individual {
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        /// Full name in Russian
        #[arg(long)]
        full_name_ru: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let mut config = Config::load(&paths)?;
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }
    artel_config::init_logging(&config.log_level);

    // Wire the subsystem once at process start and pass references down.
    let store = artel_storage::create_credential_store()?;
    let api = ApiClient::new(config.api_base_url.clone())?;
    let repository = Arc::new(AuthRepository::new(api, store));
    let machine = SessionMachine::new(repository.clone());
    machine.start();

    debug!(api_url = %config.api_base_url, "Session subsystem wired");

    let app = commands::App {
        repository,
        machine,
    };

    match cli.command {
        Commands::Login => commands::login(&app, &cli.format).await,
        Commands::Register { command } => {
            let (email, phone, profile) = match command {
                RegisterCommands::Worker {
                    email,
                    phone,
                    full_name,
                } => (
                    email,
                    phone,
                    RegisterProfile::Worker(WorkerProfile { full_name }),
                ),
                RegisterCommands::Business {
                    email,
                    phone,
                    company_name,
                    bin,
                    inn,
                    legal_address,
                    contact_name,
                    contact_number,
                } => (
                    email,
                    phone,
                    RegisterProfile::Business(BusinessProfile {
                        company_name,
                        bin,
                        inn,
                        legal_address,
                        contact_name,
                        contact_number,
                    }),
                ),
                RegisterCommands::Individual {
                    email,
                    phone,
                    full_name_ru,
                } => (
                    email,
                    phone,
                    RegisterProfile::Individual(IndividualProfile { full_name_ru }),
                ),
            };
            commands::register(&app, email, phone, profile, &cli.format).await
        }
        Commands::Logout => commands::logout(&app, &cli.format).await,
        Commands::Status => commands::status(&app, &cli.format).await,
        Commands::Whoami => commands::whoami(&app, &cli.format).await,
    }
}
