//! Main entry point for the delivery-order service.
//!
//! This binary wires the configured storage backend to the order store,
//! runs the one-time seed bootstrap when configured, and serves the
//! HTTP API.

use clap::Parser;
use pedidos_config::Config;
use pedidos_storage::{StorageFactory, StorageService};
use pedidos_store::{seed_if_empty, OrderStore};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod server;

use pedidos_storage::implementations::file::create_storage as create_file_storage;
use pedidos_storage::implementations::memory::create_storage as create_memory_storage;

/// Command-line arguments for the delivery-order service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the delivery-order service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the order store over the configured storage backend
/// 5. Runs the one-time seed bootstrap when configured
/// 6. Serves the HTTP API until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	// Create env filter with default from args
	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt().with_env_filter(env_filter).with_target(true).init();

	tracing::info!("Started delivery-order service");

	// Load configuration
	let config_path = args
		.config
		.to_str()
		.ok_or("configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path)?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	// Build the order store over the configured backend
	let store = Arc::new(build_store(&config)?);

	// One-time seed bootstrap, guarded by an emptiness check
	if let Some(ref seed) = config.seed {
		seed_if_empty(&store, Path::new(&seed.path)).await?;
	}

	server::start_server(config.api.clone(), store).await?;

	tracing::info!("Stopped delivery-order service");
	Ok(())
}

/// Returns the registered storage backend factories.
fn storage_factories() -> HashMap<String, StorageFactory> {
	let mut factories = HashMap::new();
	factories.insert("file".to_string(), create_file_storage as StorageFactory);
	factories.insert(
		"memory".to_string(),
		create_memory_storage as StorageFactory,
	);
	factories
}

/// Builds the order store from the configured primary storage backend.
fn build_store(config: &Config) -> Result<OrderStore, Box<dyn std::error::Error>> {
	let factories = storage_factories();
	let factory = factories.get(&config.storage.primary).ok_or_else(|| {
		format!(
			"Unknown storage backend '{}' (available: {:?})",
			config.storage.primary,
			factories.keys().collect::<Vec<_>>()
		)
	})?;

	let backend_config = config
		.storage
		.implementations
		.get(&config.storage.primary)
		.cloned()
		.unwrap_or_else(|| toml::Value::Table(toml::map::Map::new()));

	let backend = factory(&backend_config)?;
	Ok(OrderStore::new(Arc::new(StorageService::new(backend))))
}
