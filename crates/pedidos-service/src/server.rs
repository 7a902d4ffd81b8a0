//! HTTP server for the delivery-order API.
//!
//! Exposes the order store over the `/pedidos` routes. Handlers run the
//! status transition validator before asking the store to mutate
//! anything; a rejected transition never reaches storage.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	response::Json,
	routing::{get, patch},
	Router,
};
use pedidos_config::ApiConfig;
use pedidos_store::{validate_transition, OrderStore, StoreError, TransitionError};
use pedidos_types::{
	ApiError, MessageResponse, OrderDocument, OrderStatus, StatusUpdateResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the order store for processing requests.
	pub store: Arc<OrderStore>,
}

/// Builds the application router.
///
/// Kept separate from [`start_server`] so tests can drive the routes
/// without binding a socket.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/pedidos", get(list_orders).post(create_order))
		.route(
			"/pedidos/{order_id}",
			get(get_order_by_id).delete(delete_order),
		)
		.route("/pedidos/{order_id}/status", patch(update_order_status))
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(state)
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	store: Arc<OrderStore>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(AppState { store });

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Delivery-order API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Query parameters for the status update endpoint. The parameter name
/// is part of the public API contract.
#[derive(Debug, Deserialize)]
struct StatusQuery {
	novo_status: OrderStatus,
}

/// Handles GET /pedidos requests.
///
/// Returns the full view of every order, newest first.
async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<OrderDocument>>, ApiError> {
	state.store.list().await.map(Json).map_err(map_store_error)
}

/// Handles GET /pedidos/{order_id} requests.
async fn get_order_by_id(
	Path(order_id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<OrderDocument>, ApiError> {
	state
		.store
		.get_by_id(&order_id)
		.await
		.map(Json)
		.map_err(map_store_error)
}

/// Handles POST /pedidos requests.
///
/// Creates a new order; the initial status is always RECEIVED and the
/// history is seeded by the store, regardless of what the body carries.
async fn create_order(
	State(state): State<AppState>,
	Json(submission): Json<OrderDocument>,
) -> Result<(StatusCode, Json<OrderDocument>), ApiError> {
	match state.store.create(submission).await {
		Ok(view) => Ok((StatusCode::CREATED, Json(view))),
		Err(e) => {
			tracing::warn!("Order creation failed: {}", e);
			Err(map_store_error(e))
		}
	}
}

/// Handles PATCH /pedidos/{order_id}/status requests.
///
/// Validates the requested transition against the current authoritative
/// status before persisting; a rejection produces a 400 with the
/// validator's message and no state change.
async fn update_order_status(
	Path(order_id): Path<String>,
	Query(query): Query<StatusQuery>,
	State(state): State<AppState>,
) -> Result<Json<StatusUpdateResponse>, ApiError> {
	let current = state
		.store
		.current_status(&order_id)
		.await
		.map_err(map_store_error)?;

	validate_transition(current, query.novo_status).map_err(|e| {
		tracing::warn!(
			order_id = %order_id,
			"Rejected status change: {}",
			e
		);
		map_transition_error(e)
	})?;

	let pedido = state
		.store
		.update_status(&order_id, query.novo_status)
		.await
		.map_err(map_store_error)?;

	Ok(Json(StatusUpdateResponse {
		message: format!("Order changed from {} to {}", current, query.novo_status),
		pedido,
	}))
}

/// Handles DELETE /pedidos/{order_id} requests.
async fn delete_order(
	Path(order_id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
	let found = state
		.store
		.delete(&order_id)
		.await
		.map_err(map_store_error)?;

	if found {
		Ok(Json(MessageResponse {
			message: "Order removed successfully".to_string(),
		}))
	} else {
		Err(ApiError::NotFound {
			error_type: "ORDER_NOT_FOUND".to_string(),
			message: format!("order not found: {}", order_id),
		})
	}
}

/// Maps store errors to API errors with appropriate status codes.
fn map_store_error(e: StoreError) -> ApiError {
	match e {
		StoreError::NotFound(id) => ApiError::NotFound {
			error_type: "ORDER_NOT_FOUND".to_string(),
			message: format!("order not found: {}", id),
		},
		StoreError::Duplicate(id) => ApiError::Conflict {
			error_type: "DUPLICATE_ORDER".to_string(),
			message: format!("order id already registered: {}", id),
		},
		StoreError::Storage(message) => ApiError::InternalServerError {
			error_type: "STORAGE_ERROR".to_string(),
			message,
		},
	}
}

/// Maps validator rejections to 400 responses carrying the validator's
/// message.
fn map_transition_error(e: TransitionError) -> ApiError {
	let error_type = match e {
		TransitionError::CannotCancelDelivered => "CANNOT_CANCEL_DELIVERED",
		TransitionError::InvalidTransition { .. } => "INVALID_TRANSITION",
	};
	ApiError::BadRequest {
		error_type: error_type.to_string(),
		message: e.to_string(),
		details: None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::body::{to_bytes, Body};
	use axum::http::{header, Request};
	use pedidos_storage::implementations::memory::MemoryStorage;
	use pedidos_storage::StorageService;
	use tower::util::ServiceExt;

	fn app() -> Router {
		let store = OrderStore::new(Arc::new(StorageService::new(Box::new(
			MemoryStorage::new(),
		))));
		router(AppState {
			store: Arc::new(store),
		})
	}

	fn create_body(order_id: &str) -> String {
		serde_json::json!({
			"store_id": "store-1",
			"order_id": order_id,
			"order": {
				"order_id": order_id,
				"total_price": 89.5,
				"customer": { "name": "Bruno Lima" },
				"items": [
					{ "name": "Filé à Parmegiana", "quantity": 1, "price": 89.5, "total_price": 89.5 }
				]
			}
		})
		.to_string()
	}

	fn post(uri: &str, body: String) -> Request<Body> {
		Request::builder()
			.method("POST")
			.uri(uri)
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body))
			.unwrap()
	}

	fn request(method: &str, uri: &str) -> Request<Body> {
		Request::builder()
			.method(method)
			.uri(uri)
			.body(Body::empty())
			.unwrap()
	}

	async fn json_body(response: axum::response::Response) -> serde_json::Value {
		let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		serde_json::from_slice(&bytes).unwrap()
	}

	#[tokio::test]
	async fn test_create_then_duplicate_conflict() {
		let app = app();

		let response = app
			.clone()
			.oneshot(post("/pedidos", create_body("ord-1")))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::CREATED);
		let body = json_body(response).await;
		assert_eq!(body["order"]["last_status_name"], "RECEIVED");
		assert_eq!(body["order"]["statuses"].as_array().unwrap().len(), 1);

		let response = app
			.oneshot(post("/pedidos", create_body("ord-1")))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::CONFLICT);
		let body = json_body(response).await;
		assert_eq!(body["error"], "DUPLICATE_ORDER");
	}

	#[tokio::test]
	async fn test_get_by_id_and_missing() {
		let app = app();
		app.clone()
			.oneshot(post("/pedidos", create_body("ord-1")))
			.await
			.unwrap();

		let response = app
			.clone()
			.oneshot(request("GET", "/pedidos/ord-1"))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);

		let response = app
			.oneshot(request("GET", "/pedidos/ord-404"))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_status_update_happy_path() {
		let app = app();
		app.clone()
			.oneshot(post("/pedidos", create_body("ord-1")))
			.await
			.unwrap();

		let response = app
			.oneshot(request(
				"PATCH",
				"/pedidos/ord-1/status?novo_status=CONFIRMED",
			))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		let body = json_body(response).await;
		assert_eq!(body["pedido"]["order"]["last_status_name"], "CONFIRMED");
		assert_eq!(
			body["pedido"]["order"]["statuses"].as_array().unwrap().len(),
			2
		);
		assert_eq!(body["message"], "Order changed from RECEIVED to CONFIRMED");
	}

	#[tokio::test]
	async fn test_status_update_rejected_transition() {
		let app = app();
		app.clone()
			.oneshot(post("/pedidos", create_body("ord-1")))
			.await
			.unwrap();

		// RECEIVED -> DELIVERED skips two steps.
		let response = app
			.clone()
			.oneshot(request(
				"PATCH",
				"/pedidos/ord-1/status?novo_status=DELIVERED",
			))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		let body = json_body(response).await;
		assert_eq!(body["error"], "INVALID_TRANSITION");

		// The rejection left no trace in the record.
		let response = app
			.oneshot(request("GET", "/pedidos/ord-1"))
			.await
			.unwrap();
		let body = json_body(response).await;
		assert_eq!(body["order"]["last_status_name"], "RECEIVED");
		assert_eq!(body["order"]["statuses"].as_array().unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_cancel_delivered_rejected() {
		let app = app();
		app.clone()
			.oneshot(post("/pedidos", create_body("ord-1")))
			.await
			.unwrap();

		for status in ["CONFIRMED", "DISPATCHED", "DELIVERED"] {
			let uri = format!("/pedidos/ord-1/status?novo_status={}", status);
			let response = app.clone().oneshot(request("PATCH", &uri)).await.unwrap();
			assert_eq!(response.status(), StatusCode::OK);
		}

		let response = app
			.oneshot(request(
				"PATCH",
				"/pedidos/ord-1/status?novo_status=CANCELED",
			))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		let body = json_body(response).await;
		assert_eq!(body["error"], "CANNOT_CANCEL_DELIVERED");
	}

	#[tokio::test]
	async fn test_status_update_unknown_order() {
		let app = app();
		let response = app
			.oneshot(request(
				"PATCH",
				"/pedidos/ord-404/status?novo_status=CONFIRMED",
			))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_delete_then_not_found() {
		let app = app();
		app.clone()
			.oneshot(post("/pedidos", create_body("ord-1")))
			.await
			.unwrap();

		let response = app
			.clone()
			.oneshot(request("DELETE", "/pedidos/ord-1"))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);

		let response = app
			.oneshot(request("DELETE", "/pedidos/ord-1"))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_list_returns_all_orders() {
		let app = app();
		for id in ["ord-1", "ord-2"] {
			app.clone()
				.oneshot(post("/pedidos", create_body(id)))
				.await
				.unwrap();
		}

		let response = app.oneshot(request("GET", "/pedidos")).await.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		let body = json_body(response).await;
		assert_eq!(body.as_array().unwrap().len(), 2);
	}
}
