//! # Push Service Configuration Validator
//!
//! Command-line tool for validating push service configuration across
//! environments. Reports what the service would resolve at startup so
//! problems show up before the first request does.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use fcm_dispatch::config::{AttributeResolver, ConfigManager};
use fcm_dispatch::constants::attributes;
use fcm_dispatch::credentials::KeyMaterial;
use fcm_dispatch::messaging::AndroidConfig;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate push service configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment to validate (development, test, production, ...)
    #[arg(short, long, default_value = "development")]
    environment: String,

    /// Configuration directory path (default: $PUSH_CONFIG_DIR or ./config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format (table, json)
    #[arg(long, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate configuration and report resolved startup values
    Check,

    /// List the flattened attribute keys
    Attributes,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match &cli.command {
        Some(Commands::Check) | None => check_config(&cli),
        Some(Commands::Attributes) => list_attributes(&cli),
    };

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration validation failed: {:#}", e);
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    }
}

fn load(cli: &Cli) -> anyhow::Result<std::sync::Arc<ConfigManager>> {
    ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &cli.environment)
        .with_context(|| format!("loading configuration for '{}'", cli.environment))
}

fn check_config(cli: &Cli) -> anyhow::Result<()> {
    let manager = load(cli)?;
    let config = manager.config();
    let resolver = manager.attribute_resolver();
    let platform = AndroidConfig::resolve(&resolver);

    let delete_target = resolver.get_attribute(attributes::DELETE_TOKEN).ok();
    let key_material = KeyMaterial::resolve(&resolver, config.access_key.as_deref());
    let key_source = key_material.source().to_string();
    let credential_usable = key_material.is_usable();
    let has_credential = !resolver
        .attribute_or_empty(attributes::GOOGLE_CREDENTIAL)
        .is_empty();

    if cli.format == "json" {
        let report = serde_json::json!({
            "environment": manager.environment(),
            "config_directory": manager.config_directory().display().to_string(),
            "service_name": config.service_name,
            "reconcile_transient_failures": config.reconcile_transient_failures,
            "android": platform,
            "delete_token_service": delete_target,
            "credential": {
                "key_source": key_source,
                "key_material_usable": credential_usable,
                "encrypted_credential_present": has_credential,
            },
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("🔧 Validating Push Service Configuration");
        println!("Environment: {}", manager.environment());
        println!("Config Directory: {}", manager.config_directory().display());
        println!();
        println!("Service name:          {}", config.service_name);
        println!("Reconcile transient:   {}", config.reconcile_transient_failures);
        println!("Android priority:      {}", platform.priority);
        println!("Android TTL:           {}s", platform.time_to_live.as_secs());
        println!(
            "DeleteToken service:   {}",
            delete_target.as_deref().unwrap_or("(not configured)")
        );
        println!("Credential key source: {key_source}");
        println!("Key material usable:   {credential_usable}");
        println!("GoogleCredential set:  {has_credential}");
    }

    if delete_target.is_none() {
        bail!("DeleteToken attribute is not configured; failed tokens cannot be reconciled");
    }
    if !credential_usable || !has_credential {
        bail!("gateway credential cannot be resolved from this configuration");
    }

    Ok(())
}

fn list_attributes(cli: &Cli) -> anyhow::Result<()> {
    let manager = load(cli)?;
    let mut keys: Vec<String> = manager.config().attribute_map().into_keys().collect();
    keys.sort();

    if cli.format == "json" {
        println!("{}", serde_json::to_string_pretty(&keys)?);
    } else {
        println!("Attributes ({}):", keys.len());
        for key in keys {
            println!("  {key}");
        }
    }

    Ok(())
}
