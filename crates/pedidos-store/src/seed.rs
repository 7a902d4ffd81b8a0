//! One-time seed bootstrap.
//!
//! Populates an empty store from a JSON file holding an array of full
//! order documents. Runs once at process start, guarded by an
//! emptiness check; a non-empty store or a missing file makes it a
//! no-op. Seeded documents keep their status label and history as-is.

use crate::{OrderStore, StoreError};
use pedidos_types::OrderDocument;
use std::path::Path;

/// Loads initial orders into the store if it is empty.
///
/// Returns the number of orders inserted (zero when the store already
/// holds data or the file does not exist). Idempotent: a second call
/// always returns zero.
pub async fn seed_if_empty(store: &OrderStore, path: &Path) -> Result<usize, StoreError> {
	if !store.is_empty().await? {
		tracing::debug!("Store is not empty, skipping seed");
		return Ok(0);
	}

	let content = match tokio::fs::read(path).await {
		Ok(content) => content,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
			tracing::warn!(path = %path.display(), "Seed file not found, skipping seed");
			return Ok(0);
		}
		Err(e) => return Err(StoreError::Storage(e.to_string())),
	};

	let documents: Vec<OrderDocument> = serde_json::from_slice(&content)
		.map_err(|e| StoreError::Storage(format!("invalid seed file: {}", e)))?;

	let count = documents.len();
	for document in documents {
		store.insert_existing(document).await?;
	}

	tracing::info!(count, path = %path.display(), "Seeded orders");
	Ok(count)
}
