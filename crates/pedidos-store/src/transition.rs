//! Status transition validation.
//!
//! Orders move through a strict linear workflow: RECEIVED ->
//! CONFIRMED -> DISPATCHED -> DELIVERED. Cancellation is the single
//! exception path, reachable from every status except DELIVERED.
//! The validator is pure and has no knowledge of persistence; callers
//! must consult it before mutating anything.

use once_cell::sync::Lazy;
use pedidos_types::OrderStatus;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors produced when a requested status change is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
	#[error("invalid status change: {from} -> {to}")]
	InvalidTransition { from: OrderStatus, to: OrderStatus },
	#[error("cannot cancel an order that was already delivered")]
	CannotCancelDelivered,
}

// Static transition table - each status maps to its allowed forward
// successors. Cancellation is handled separately and never appears here.
static FORWARD_TRANSITIONS: Lazy<HashMap<OrderStatus, HashSet<OrderStatus>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	m.insert(
		OrderStatus::Received,
		HashSet::from([OrderStatus::Confirmed]),
	);
	m.insert(
		OrderStatus::Confirmed,
		HashSet::from([OrderStatus::Dispatched]),
	);
	m.insert(
		OrderStatus::Dispatched,
		HashSet::from([OrderStatus::Delivered]),
	);
	m.insert(OrderStatus::Delivered, HashSet::new()); // terminal
	m.insert(OrderStatus::Canceled, HashSet::new()); // terminal
	m
});

/// Decides whether a status change is legal given the current status.
///
/// Rules:
/// - a request for CANCELED is allowed from any status except
///   DELIVERED, which fails with [`TransitionError::CannotCancelDelivered`];
/// - any other request is allowed only along the fixed forward path;
///   same-status, skipped-step and backward pairs all fail with
///   [`TransitionError::InvalidTransition`].
///
/// No implicit transition is inferred; callers always supply the exact
/// target status.
pub fn validate_transition(
	current: OrderStatus,
	requested: OrderStatus,
) -> Result<(), TransitionError> {
	if requested == OrderStatus::Canceled {
		if current == OrderStatus::Delivered {
			return Err(TransitionError::CannotCancelDelivered);
		}
		return Ok(());
	}

	let allowed = FORWARD_TRANSITIONS
		.get(&current)
		.is_some_and(|set| set.contains(&requested));

	if allowed {
		Ok(())
	} else {
		Err(TransitionError::InvalidTransition {
			from: current,
			to: requested,
		})
	}
}
