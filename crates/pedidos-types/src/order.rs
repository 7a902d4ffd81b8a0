//! Order domain types for the delivery system.
//!
//! This module defines the stored order record, the nested full-order
//! document that callers see, and the status enumeration that drives
//! the delivery workflow.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an order in the delivery workflow.
///
/// Orders move forward along Received -> Confirmed -> Dispatched ->
/// Delivered; Canceled is reachable from every non-delivered status.
/// Delivered and Canceled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
	/// Order has been received from the store and not yet confirmed.
	Received,
	/// Order has been confirmed by the restaurant.
	Confirmed,
	/// Order has left the restaurant and is out for delivery.
	Dispatched,
	/// Order has been handed to the customer.
	Delivered,
	/// Order was canceled before delivery.
	Canceled,
}

impl OrderStatus {
	/// Returns the sole forward successor of this status, or `None`
	/// for terminal statuses. Cancellation is not part of the forward
	/// flow and is handled separately by the transition validator.
	pub fn next(&self) -> Option<OrderStatus> {
		match self {
			OrderStatus::Received => Some(OrderStatus::Confirmed),
			OrderStatus::Confirmed => Some(OrderStatus::Dispatched),
			OrderStatus::Dispatched => Some(OrderStatus::Delivered),
			OrderStatus::Delivered | OrderStatus::Canceled => None,
		}
	}

	/// Whether this status has no outgoing transitions.
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
	}

	/// Returns the wire representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Received => "RECEIVED",
			OrderStatus::Confirmed => "CONFIRMED",
			OrderStatus::Dispatched => "DISPATCHED",
			OrderStatus::Delivered => "DELIVERED",
			OrderStatus::Canceled => "CANCELED",
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Actor type that originated a status change.
///
/// Every transition in this system is recorded as coming from the
/// store; the enum exists so the wire format stays closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusOrigin {
	#[default]
	Store,
}

/// One entry in an order's append-only status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
	/// The status the order moved to.
	pub name: OrderStatus,
	/// Millisecond timestamp of the transition.
	pub created_at: u64,
	/// Identifier of the order the entry belongs to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub order_id: Option<String>,
	/// Actor type that requested the transition.
	#[serde(default)]
	pub origin: StatusOrigin,
}

/// Customer information embedded in the order document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub temporary_phone: Option<String>,
}

/// A single line item of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<i64>,
	pub name: String,
	pub quantity: u32,
	pub price: Decimal,
	pub total_price: Decimal,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub observations: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub discount: Option<Decimal>,
	#[serde(default)]
	pub condiments: Vec<serde_json::Value>,
}

/// A payment recorded against an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
	pub origin: String,
	pub value: Decimal,
	#[serde(default = "default_prepaid")]
	pub prepaid: bool,
}

fn default_prepaid() -> bool {
	true
}

/// Geographic coordinates of a delivery address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryCoordinates {
	pub latitude: f64,
	pub longitude: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<i64>,
}

/// Delivery address embedded in the order document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAddress {
	pub street_name: String,
	pub street_number: String,
	pub neighborhood: String,
	#[serde(default = "default_city")]
	pub city: String,
	#[serde(default = "default_state")]
	pub state: String,
	#[serde(default = "default_postal_code")]
	pub postal_code: String,
	#[serde(default = "default_country")]
	pub country: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reference: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub coordinates: Option<DeliveryCoordinates>,
}

fn default_city() -> String {
	"Brasília".to_string()
}

fn default_state() -> String {
	"DF".to_string()
}

fn default_postal_code() -> String {
	"00000000".to_string()
}

fn default_country() -> String {
	"BR".to_string()
}

/// Identification of the store that originated the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreInfo {
	pub id: String,
	pub name: String,
}

/// The complete order detail: customer, items, payments, delivery
/// address and the ordered history of status changes.
///
/// `last_status_name` mirrors the authoritative `status` column of the
/// stored record; it is re-derived on every read and never trusted on
/// its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
	pub order_id: String,
	#[serde(default = "default_last_status")]
	pub last_status_name: OrderStatus,
	pub total_price: Decimal,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<u64>,
	pub customer: Customer,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub store: Option<StoreInfo>,
	pub items: Vec<OrderItem>,
	#[serde(default)]
	pub payments: Vec<Payment>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub delivery_address: Option<DeliveryAddress>,
	#[serde(default)]
	pub statuses: Vec<StatusEntry>,
}

fn default_last_status() -> OrderStatus {
	OrderStatus::Received
}

/// The full order document exchanged with callers and embedded in the
/// stored record. This is both the create-request body and the "full
/// view" returned by every read path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDocument {
	pub store_id: String,
	pub order_id: String,
	pub order: OrderDetails,
}

/// The stored order record.
///
/// The flat columns are denormalized copies extracted from the document
/// at creation time for indexing; they are never re-derived afterwards,
/// so a document edited through another path can drift from them. The
/// `status` column is the single authoritative workflow field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Globally unique external identifier, immutable once created.
	pub order_id: String,
	/// Identifier of the originating store, immutable.
	pub store_id: String,
	/// Denormalized customer name.
	pub customer_name: String,
	/// Denormalized customer phone, when one was supplied.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub customer_phone: Option<String>,
	/// Denormalized order total.
	pub total_price: Decimal,
	/// Millisecond creation timestamp, set once.
	pub created_at: u64,
	/// Authoritative workflow status.
	pub status: OrderStatus,
	/// Denormalized delivery city.
	pub delivery_city: String,
	/// Denormalized delivery neighborhood.
	pub delivery_neighborhood: String,
	/// The complete order document; its `last_status_name` and
	/// `statuses` are kept in sync with `status` by the store.
	pub document: OrderDocument,
}

impl Order {
	/// Projects the stored record to the full view returned to callers.
	///
	/// The embedded document's `last_status_name` is forcibly
	/// overwritten from the authoritative `status` column at call time,
	/// independent of whether the document was already consistent, so
	/// any historical drift is tolerated.
	pub fn project_view(&self) -> OrderDocument {
		let mut view = self.document.clone();
		view.order.last_status_name = self.status;
		view
	}
}
