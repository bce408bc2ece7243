//! ldapgate - LDAP username/password authentication
//!
//! Resolves a username to its DN with a directory search, then binds as that
//! DN with the supplied password.

use clap::{Parser, Subcommand};
use ldapgate_auth::{AuthOutcome, LdapConnection};
use ldapgate_core::config::{GatewayConfig, LoggingConfig};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ldapgate")]
#[command(version = ldapgate_core::VERSION)]
#[command(about = "Authenticate users against an LDAP directory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "LDAPGATE_CONFIG")]
    config: Option<String>,

    /// LDAP server URL (ldap:// or ldaps://)
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// User search base(s), joined by '#'
    #[arg(long, global = true)]
    search_base: Option<String>,

    /// Service instance id selecting the TLS profile
    #[arg(long, global = true)]
    instance_id: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate a username and password
    Authenticate {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "LDAPGATE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Resolve a username to its DN without binding
    Resolve {
        #[arg(short, long)]
        username: String,
    },

    /// Validate the configuration and connect to the server
    CheckConfig,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = if let Some(config_path) = &cli.config {
        GatewayConfig::from_file(config_path)?
    } else {
        GatewayConfig::from_env()
    };

    // Override with CLI args
    if let Some(url) = cli.server_url {
        config.ldap.server_url = url;
    }
    if let Some(base) = cli.search_base {
        config.ldap.user_search_base = base;
    }
    if let Some(id) = cli.instance_id {
        config.instance_id = Some(id);
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging);

    match cli.command {
        Commands::Version => {
            println!("ldapgate {}", ldapgate_core::VERSION);
            Ok(ExitCode::SUCCESS)
        }
        Commands::CheckConfig => {
            config.validate()?;
            let connection = LdapConnection::connect(&config).await?;
            connection.close().await?;
            println!("Configuration OK: connected to {}", config.ldap.server_url);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Resolve { username } => {
            let connection = LdapConnection::connect(&config).await?;
            let resolved = connection.resolve(&username).await;
            let _ = connection.close().await;

            match resolved {
                Ok(name) => {
                    println!("{}", name);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("{}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Authenticate { username, password } => {
            let outcome = match LdapConnection::connect(&config).await {
                Ok(connection) => {
                    let outcome = connection.authenticate(&username, &password).await;
                    let _ = connection.close().await;
                    outcome
                }
                Err(e) => AuthOutcome::failure(e.to_string()),
            };
            info!(success = outcome.is_success(), "Authentication finished");

            print_outcome(&outcome, cli.json)?;
            Ok(if outcome.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn print_outcome(outcome: &AuthOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(outcome)?);
    } else if let Some(message) = outcome.error_message() {
        eprintln!("Authentication failed: {}", message);
    } else {
        println!("Authentication succeeded");
    }
    Ok(())
}
