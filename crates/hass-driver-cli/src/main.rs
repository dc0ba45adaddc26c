//! Command-line interface for the Home Assistant point driver.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hass_driver::config::env_vars;
use hass_driver::{DriverConfig, HassClient, HassInterface, PointRegistry, PointValue};

/// Read and write Home Assistant entities as typed points.
#[derive(Parser, Debug)]
#[command(name = "hass-driver")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Driver configuration file (.toml or .json).
    #[arg(short, long, global = true, default_value = "hass-driver.toml")]
    config: PathBuf,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Action to perform.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// List configured points.
    Points,
    /// Check that Home Assistant is reachable with the configured token.
    Ping,
    /// Read one point from the device.
    Get {
        /// Point name.
        point: String,
    },
    /// Write one point.
    Set {
        /// Point name.
        point: String,
        /// Value, parsed as JSON when possible (`1`, `21.5`, `true`), else a string.
        value: String,
    },
    /// Poll every point and print the values as JSON.
    Scrape,
    /// Write starting values back; all writable points when no point is given.
    Revert {
        /// Point name.
        point: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = DriverConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    match args.command {
        Command::Points => list_points(&config),
        Command::Ping => ping(&config).await,
        Command::Get { point } => {
            let mut driver = configure(&config)?;
            let value = driver.get_point(&point).await?;
            println!("{}", value);
            Ok(())
        }
        Command::Set { point, value } => {
            let mut driver = configure(&config)?;
            let written = driver.set_point(&point, parse_value(&value)).await?;
            println!("{}", written);
            Ok(())
        }
        Command::Scrape => {
            let mut driver = configure(&config)?;
            let values = driver.scrape_all().await;
            println!("{}", serde_json::to_string_pretty(&values)?);
            Ok(())
        }
        Command::Revert { point } => {
            let mut driver = configure(&config)?;
            match point {
                Some(point) => {
                    let value = driver.revert_point(&point).await?;
                    println!("{} = {}", point, value);
                }
                None => {
                    for point in driver.revert_all().await {
                        println!("{}", point);
                    }
                }
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };

    // JSON format for container environments
    let json_logging = std::env::var(env_vars::LOG_JSON)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("hass_driver={}", default_level))
            .add_directive(tracing::Level::WARN.into())
    });

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}

fn configure(config: &DriverConfig) -> Result<HassInterface> {
    let mut driver = HassInterface::new();
    driver.configure(&config.connection, &config.points)?;
    Ok(driver)
}

fn list_points(config: &DriverConfig) -> Result<()> {
    let registry = PointRegistry::parse(&config.points)?;
    for register in registry.iter() {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            register.point_name,
            register.entity_id,
            register.entity_point,
            register.point_type,
            if register.read_only { "read-only" } else { "writable" }
        );
    }
    Ok(())
}

async fn ping(config: &DriverConfig) -> Result<()> {
    let client = HassClient::new(config.connection.connection_config()?)?;
    if client.check_connection().await? {
        println!("Home Assistant at {} is reachable", client.config().url);
        Ok(())
    } else {
        anyhow::bail!("Home Assistant at {} rejected the request", client.config().url)
    }
}

fn parse_value(raw: &str) -> PointValue {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| PointValue::from_json(&v))
        .unwrap_or_else(|| PointValue::String(raw.to_string()))
}
