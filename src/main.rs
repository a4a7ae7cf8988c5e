use std::io::Read;
use std::net::TcpListener;

use clap::Parser;
use keyward::auth::{generate_keypair, CredentialHasher};
use keyward::cli::{Cli, Commands};
use keyward::configuration::get_configuration;
use keyward::error::AppError;
use keyward::startup::{run, AppState};
use keyward::telemetry::init_telemetry;

#[tokio::main]
async fn main() {
    init_telemetry();

    let cli = Cli::parse();
    let result = match cli.action() {
        Commands::Serve => serve(&cli).await,
        Commands::Keygen {
            private,
            public,
            bits,
        } => keygen(&private, &public, bits),
        Commands::HashPassword { cost } => hash_password(cost),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "keyward failed");
        std::process::exit(1);
    }
}

async fn serve(cli: &Cli) -> Result<(), AppError> {
    tracing::info!(config = %cli.config.display(), "Starting application");

    let configuration = get_configuration(&cli.config)?;
    tracing::info!("Configuration loaded successfully");

    // Key problems are fatal: never serve without a working keypair
    let state = AppState::from_settings(&configuration)?;
    tracing::info!(users = state.users.len(), "Authenticator ready");

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)
        .map_err(|e| AppError::Internal(format!("Failed to bind {}: {}", address, e)))?;
    tracing::info!(%address, "Server listening");

    let server = run(
        listener,
        state,
        &configuration.application,
        &configuration.cors,
    )?;
    server
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))
}

fn keygen(private: &std::path::Path, public: &std::path::Path, bits: usize) -> Result<(), AppError> {
    tracing::info!(bits, "Generating RSA keypair");
    let generated = generate_keypair(bits)?;
    generated.write_to(private, public)?;
    tracing::info!(
        private = %private.display(),
        public = %public.display(),
        "Keypair written"
    );
    Ok(())
}

fn hash_password(cost: u32) -> Result<(), AppError> {
    let hasher = CredentialHasher::new(cost)?;

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| AppError::Internal(format!("Failed to read stdin: {}", e)))?;
    let password = input.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(AppError::Internal("No password given on stdin".to_string()));
    }

    println!("{}", hasher.hash(password)?);
    Ok(())
}
