//! Storage-backed order store.
//!
//! Owns the durable representation of each order and keeps the
//! denormalized full-order document in sync with the authoritative
//! status column. Every read path goes through [`Order::project_view`]
//! so the returned document always reflects the current status,
//! independent of what the stored document says.

use pedidos_storage::{StorageError, StorageService};
use pedidos_types::{Order, OrderDocument, OrderStatus, StatusEntry, StatusOrigin};
use std::sync::Arc;
use thiserror::Error;

/// Namespace under which order records are stored.
pub const ORDERS_NAMESPACE: &str = "orders";

/// Errors that can occur during order store operations.
///
/// Duplicate and NotFound are recoverable, caller-visible business
/// conditions; Storage wraps backend failures.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("order id already registered: {0}")]
	Duplicate(String),
	#[error("order not found: {0}")]
	NotFound(String),
	#[error("storage error: {0}")]
	Storage(String),
}

/// Durable CRUD for orders plus status-history maintenance.
///
/// The store does not re-validate status transitions; callers are
/// expected to consult [`crate::validate_transition`] before asking
/// for a status update.
pub struct OrderStore {
	storage: Arc<StorageService>,
}

impl OrderStore {
	/// Creates a new OrderStore on top of the given storage service.
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Returns the full view of every order, ordered by creation time
	/// descending (ties broken by order id for determinism).
	pub async fn list(&self) -> Result<Vec<OrderDocument>, StoreError> {
		let mut orders: Vec<Order> = self
			.storage
			.retrieve_all(ORDERS_NAMESPACE)
			.await
			.map_err(|e| StoreError::Storage(e.to_string()))?;

		orders.sort_by(|a, b| {
			b.created_at
				.cmp(&a.created_at)
				.then_with(|| a.order_id.cmp(&b.order_id))
		});

		Ok(orders.iter().map(Order::project_view).collect())
	}

	/// Returns the full view of one order, or NotFound.
	pub async fn get_by_id(&self, order_id: &str) -> Result<OrderDocument, StoreError> {
		Ok(self.fetch(order_id).await?.project_view())
	}

	/// Returns the current authoritative status of an order.
	///
	/// Used by callers that must run the transition validator before
	/// requesting a status update.
	pub async fn current_status(&self, order_id: &str) -> Result<OrderStatus, StoreError> {
		Ok(self.fetch(order_id).await?.status)
	}

	/// Persists a new order from a submitted document.
	///
	/// Fails with Duplicate when the order id already exists, leaving
	/// the prior record untouched. The status is forced to RECEIVED
	/// regardless of what the submission carries, the history is seeded
	/// with exactly one entry, and a millisecond creation timestamp is
	/// stamped when the submission lacks one. The denormalized columns
	/// are extracted here, once; they are never re-derived later.
	pub async fn create(&self, mut submission: OrderDocument) -> Result<OrderDocument, StoreError> {
		let order_id = submission.order_id.clone();

		let exists = self
			.storage
			.exists(ORDERS_NAMESPACE, &order_id)
			.await
			.map_err(|e| StoreError::Storage(e.to_string()))?;
		if exists {
			return Err(StoreError::Duplicate(order_id));
		}

		let now = now_ms();
		let created_at = *submission.order.created_at.get_or_insert(now);
		submission.order.last_status_name = OrderStatus::Received;
		submission.order.statuses = vec![StatusEntry {
			name: OrderStatus::Received,
			created_at: now,
			order_id: Some(order_id.clone()),
			origin: StatusOrigin::Store,
		}];

		let order = build_record(submission, OrderStatus::Received, created_at);
		self.storage
			.store(ORDERS_NAMESPACE, &order_id, &order)
			.await
			.map_err(|e| StoreError::Storage(e.to_string()))?;

		tracing::info!(order_id = %order_id, "Created order");
		Ok(order.project_view())
	}

	/// Sets the authoritative status and appends one history entry.
	///
	/// Trusts that the caller already validated the transition. This is
	/// a read-modify-write: the stored document is cloned before
	/// mutation so no shared in-memory structure is aliased.
	pub async fn update_status(
		&self,
		order_id: &str,
		requested: OrderStatus,
	) -> Result<OrderDocument, StoreError> {
		let mut order = self.fetch(order_id).await?;
		let now = now_ms();

		order.status = requested;

		let mut document = order.document.clone();
		document.order.last_status_name = requested;
		document.order.statuses.push(StatusEntry {
			name: requested,
			created_at: now,
			order_id: Some(order_id.to_string()),
			origin: StatusOrigin::Store,
		});
		order.document = document;

		match self
			.storage
			.update(ORDERS_NAMESPACE, order_id, &order)
			.await
		{
			Ok(()) => {}
			Err(StorageError::NotFound) => return Err(StoreError::NotFound(order_id.to_string())),
			Err(e) => return Err(StoreError::Storage(e.to_string())),
		}

		tracing::info!(order_id = %order_id, status = %requested, "Updated order status");
		Ok(order.project_view())
	}

	/// Removes an order and its embedded history permanently.
	///
	/// Returns whether a matching order existed.
	pub async fn delete(&self, order_id: &str) -> Result<bool, StoreError> {
		let exists = self
			.storage
			.exists(ORDERS_NAMESPACE, order_id)
			.await
			.map_err(|e| StoreError::Storage(e.to_string()))?;
		if !exists {
			return Ok(false);
		}

		self.storage
			.remove(ORDERS_NAMESPACE, order_id)
			.await
			.map_err(|e| StoreError::Storage(e.to_string()))?;

		tracing::info!(order_id = %order_id, "Deleted order");
		Ok(true)
	}

	/// Whether the store holds no orders at all.
	pub async fn is_empty(&self) -> Result<bool, StoreError> {
		let ids = self
			.storage
			.retrieve_all::<Order>(ORDERS_NAMESPACE)
			.await
			.map_err(|e| StoreError::Storage(e.to_string()))?;
		Ok(ids.is_empty())
	}

	/// Inserts a pre-existing document as-is, preserving its status
	/// label and history. Used only by the seed bootstrap.
	pub(crate) async fn insert_existing(
		&self,
		document: OrderDocument,
	) -> Result<(), StoreError> {
		let order_id = document.order_id.clone();
		let status = document.order.last_status_name;
		let created_at = document.order.created_at.unwrap_or_else(now_ms);

		let order = build_record(document, status, created_at);
		self.storage
			.store(ORDERS_NAMESPACE, &order_id, &order)
			.await
			.map_err(|e| StoreError::Storage(e.to_string()))
	}

	async fn fetch(&self, order_id: &str) -> Result<Order, StoreError> {
		match self
			.storage
			.retrieve::<Order>(ORDERS_NAMESPACE, order_id)
			.await
		{
			Ok(order) => Ok(order),
			Err(StorageError::NotFound) => Err(StoreError::NotFound(order_id.to_string())),
			Err(e) => Err(StoreError::Storage(e.to_string())),
		}
	}
}

/// Builds the stored record from a full document, extracting the
/// denormalized columns. This is the only place the flat columns are
/// derived from the document.
fn build_record(document: OrderDocument, status: OrderStatus, created_at: u64) -> Order {
	let details = &document.order;
	let (delivery_city, delivery_neighborhood) = details
		.delivery_address
		.as_ref()
		.map(|addr| (addr.city.clone(), addr.neighborhood.clone()))
		.unwrap_or_default();

	Order {
		order_id: document.order_id.clone(),
		store_id: document.store_id.clone(),
		customer_name: details.customer.name.clone(),
		customer_phone: details.customer.temporary_phone.clone(),
		total_price: details.total_price,
		created_at,
		status,
		delivery_city,
		delivery_neighborhood,
		document,
	}
}

/// Current time in milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> u64 {
	chrono::Utc::now().timestamp_millis() as u64
}


#[cfg(test)]
mod tests {
	use super::*;
	use pedidos_storage::implementations::memory::MemoryStorage;
	use pedidos_types::{Customer, DeliveryAddress, OrderDetails, OrderItem};
	use rust_decimal::Decimal;

	fn store() -> OrderStore {
		OrderStore::new(Arc::new(StorageService::new(Box::new(
			MemoryStorage::new(),
		))))
	}

	fn submission(order_id: &str) -> OrderDocument {
		submission_at(order_id, None)
	}

	fn submission_at(order_id: &str, created_at: Option<u64>) -> OrderDocument {
		OrderDocument {
			store_id: "store-1".to_string(),
			order_id: order_id.to_string(),
			order: OrderDetails {
				order_id: order_id.to_string(),
				last_status_name: OrderStatus::Received,
				total_price: Decimal::new(12990, 2),
				created_at,
				customer: Customer {
					name: "Ana Souza".to_string(),
					temporary_phone: Some("+55 61 99999-0000".to_string()),
				},
				store: None,
				items: vec![OrderItem {
					code: Some(101),
					name: "Camarão Internacional".to_string(),
					quantity: 1,
					price: Decimal::new(12990, 2),
					total_price: Decimal::new(12990, 2),
					observations: None,
					discount: None,
					condiments: vec![],
				}],
				payments: vec![],
				delivery_address: Some(DeliveryAddress {
					street_name: "SQN 210".to_string(),
					street_number: "15".to_string(),
					neighborhood: "Asa Norte".to_string(),
					city: "Brasília".to_string(),
					state: "DF".to_string(),
					postal_code: "70862-000".to_string(),
					country: "BR".to_string(),
					reference: None,
					coordinates: None,
				}),
				statuses: vec![],
			},
		}
	}

	#[tokio::test]
	async fn test_create_seeds_status_and_history() {
		let store = store();
		let view = store.create(submission("ord-1")).await.unwrap();

		assert_eq!(view.order.last_status_name, OrderStatus::Received);
		assert_eq!(view.order.statuses.len(), 1);
		assert_eq!(view.order.statuses[0].name, OrderStatus::Received);
		assert_eq!(view.order.statuses[0].order_id.as_deref(), Some("ord-1"));
		assert!(view.order.created_at.is_some());
	}

	#[tokio::test]
	async fn test_create_duplicate_leaves_prior_record_unchanged() {
		let store = store();
		store.create(submission("ord-1")).await.unwrap();
		let before = store.get_by_id("ord-1").await.unwrap();

		let mut second = submission("ord-1");
		second.order.customer.name = "Outro Cliente".to_string();
		let result = store.create(second).await;
		assert!(matches!(result, Err(StoreError::Duplicate(id)) if id == "ord-1"));

		let after = store.get_by_id("ord-1").await.unwrap();
		assert_eq!(before, after);
	}

	#[tokio::test]
	async fn test_update_status_appends_exactly_one_entry() {
		let store = store();
		store.create(submission("ord-1")).await.unwrap();

		let view = store
			.update_status("ord-1", OrderStatus::Confirmed)
			.await
			.unwrap();

		assert_eq!(view.order.last_status_name, OrderStatus::Confirmed);
		assert_eq!(view.order.statuses.len(), 2);
		assert_eq!(view.order.statuses[1].name, OrderStatus::Confirmed);

		// Authoritative status column agrees.
		assert_eq!(
			store.current_status("ord-1").await.unwrap(),
			OrderStatus::Confirmed
		);
	}

	#[tokio::test]
	async fn test_update_status_unknown_order() {
		let store = store();
		let result = store.update_status("nope", OrderStatus::Confirmed).await;
		assert!(matches!(result, Err(StoreError::NotFound(id)) if id == "nope"));
	}

	#[tokio::test]
	async fn test_delete_then_get_is_not_found() {
		let store = store();
		store.create(submission("ord-1")).await.unwrap();

		assert!(store.delete("ord-1").await.unwrap());
		assert!(!store.delete("ord-1").await.unwrap());

		let result = store.get_by_id("ord-1").await;
		assert!(matches!(result, Err(StoreError::NotFound(_))));
	}

	#[tokio::test]
	async fn test_list_orders_by_creation_time_descending() {
		let store = store();
		store
			.create(submission_at("ord-t1", Some(1_000)))
			.await
			.unwrap();
		store
			.create(submission_at("ord-t2", Some(2_000)))
			.await
			.unwrap();
		store
			.create(submission_at("ord-t3", Some(3_000)))
			.await
			.unwrap();

		let listed = store.list().await.unwrap();
		let ids: Vec<&str> = listed.iter().map(|d| d.order_id.as_str()).collect();
		assert_eq!(ids, vec!["ord-t3", "ord-t2", "ord-t1"]);
	}

	#[tokio::test]
	async fn test_list_empty_store() {
		let store = store();
		assert!(store.list().await.unwrap().is_empty());
		assert!(store.is_empty().await.unwrap());
	}

	#[tokio::test]
	async fn test_repeated_reads_are_identical() {
		let store = store();
		store.create(submission("ord-1")).await.unwrap();

		let first = store.get_by_id("ord-1").await.unwrap();
		let second = store.get_by_id("ord-1").await.unwrap();
		let third = store.get_by_id("ord-1").await.unwrap();
		assert_eq!(first, second);
		assert_eq!(second, third);
	}

	#[tokio::test]
	async fn test_denormalized_columns_extracted_once() {
		let store = store();
		store.create(submission("ord-1")).await.unwrap();
		store
			.update_status("ord-1", OrderStatus::Confirmed)
			.await
			.unwrap();

		// The flat columns still carry the creation-time values.
		let record: Order = store
			.storage
			.retrieve(ORDERS_NAMESPACE, "ord-1")
			.await
			.unwrap();
		assert_eq!(record.customer_name, "Ana Souza");
		assert_eq!(record.delivery_city, "Brasília");
		assert_eq!(record.delivery_neighborhood, "Asa Norte");
		assert_eq!(record.status, OrderStatus::Confirmed);
	}

	#[tokio::test]
	async fn test_full_workflow_to_delivery() {
		let store = store();
		store.create(submission("ord-1")).await.unwrap();

		for status in [
			OrderStatus::Confirmed,
			OrderStatus::Dispatched,
			OrderStatus::Delivered,
		] {
			crate::validate_transition(store.current_status("ord-1").await.unwrap(), status)
				.unwrap();
			store.update_status("ord-1", status).await.unwrap();
		}

		let view = store.get_by_id("ord-1").await.unwrap();
		assert_eq!(view.order.last_status_name, OrderStatus::Delivered);
		assert_eq!(view.order.statuses.len(), 4);
	}
}
