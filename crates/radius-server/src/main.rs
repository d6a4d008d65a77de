use clap::Parser;
use radius_server::{Config, RadiusServer};
use std::path::Path;
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// RADIUS authentication and accounting server
#[derive(Parser, Debug)]
#[command(name = "radius-engine", version, about)]
struct Cli {
    /// JSON configuration, created with example values when missing
    #[arg(value_name = "FILE", default_value = "config.json")]
    config_path: String,

    /// Check the configuration, print a summary and exit
    #[arg(long)]
    validate: bool,
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn print_summary(config: &Config) {
    println!("Configuration is valid");
    println!("  Listen:          {}", config.listen_addresses.join(", "));
    println!("  Users:           {}", config.users.len());
    println!("  Session timeout: {}s", config.session_timeout_secs);
    println!("  Max clients:     {}", config.max_clients);
    println!("  Clients:");
    for client in &config.clients {
        let status = if client.enabled { "enabled" } else { "disabled" };
        println!(
            "    {:<20} {} ({status})",
            client.address,
            client.name.as_deref().unwrap_or("-")
        );
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let path = cli.config_path.as_str();

    if !cli.validate && !Path::new(path).exists() {
        init_tracing("info");
        info!(path, "No configuration found, writing an example");
        if let Err(e) = Config::example().to_file(path) {
            error!(path, error = %e, "Cannot write example configuration");
            process::exit(1);
        }
        info!(path, "Edit the example configuration and start again");
        return;
    }

    let config = match Config::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{path}: {e}");
            process::exit(1);
        }
    };

    if cli.validate {
        print_summary(&config);
        return;
    }

    init_tracing(config.log_level.as_deref().unwrap_or("info"));
    info!(version = env!("CARGO_PKG_VERSION"), path, "RADIUS engine starting");

    if config.clients.is_empty() {
        warn!("No clients configured, every request will be dropped");
    }
    for client in &config.clients {
        info!(
            address = %client.address,
            name = client.name.as_deref().unwrap_or("-"),
            enabled = client.enabled,
            "Authorized client"
        );
    }
    info!(users = config.users.len(), "Loaded users");

    let server = match RadiusServer::from_config(&config).await {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Failed to create server");
            process::exit(1);
        }
    };

    info!("Serving until Ctrl+C");
    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        process::exit(1);
    }
}
