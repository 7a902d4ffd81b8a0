//! Configuration validation utilities for the delivery-order system.
//!
//! This module provides a small type-safe framework for validating the
//! TOML tables that configure storage backends. Each backend exposes a
//! [`ConfigSchema`] describing the fields it understands.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// Error that occurs when a required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// Error that occurs when a field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// Error that occurs when field type is incorrect.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// Represents the type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	/// A string value.
	String,
	/// An integer value with optional minimum and maximum bounds.
	Integer {
		/// Minimum allowed value (inclusive).
		min: Option<i64>,
		/// Maximum allowed value (inclusive).
		max: Option<i64>,
	},
	/// A boolean value (true/false).
	Boolean,
}

/// Represents a field in a configuration schema.
#[derive(Debug)]
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
}

impl Field {
	/// Creates a new field with the given name and type.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
		}
	}
}

/// Defines a validation schema for a TOML configuration table.
///
/// A schema consists of required fields that must be present and
/// optional fields that may be present.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	/// Creates a new schema with required and optional fields.
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	///
	/// Checks that all required fields are present and that every
	/// known field, required or optional, carries a value of the
	/// declared type.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config.as_table().ok_or_else(|| ValidationError::TypeMismatch {
			field: "<root>".to_string(),
			expected: "table".to_string(),
			actual: toml_type_name(config).to_string(),
		})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			Self::validate_field(field, value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				Self::validate_field(field, value)?;
			}
		}

		Ok(())
	}

	fn validate_field(field: &Field, value: &toml::Value) -> Result<(), ValidationError> {
		match &field.field_type {
			FieldType::String => {
				if !value.is_str() {
					return Err(Self::mismatch(field, "string", value));
				}
			}
			FieldType::Integer { min, max } => {
				let n = value
					.as_integer()
					.ok_or_else(|| Self::mismatch(field, "integer", value))?;
				if let Some(min) = min {
					if n < *min {
						return Err(ValidationError::InvalidValue {
							field: field.name.clone(),
							message: format!("{} is below the minimum of {}", n, min),
						});
					}
				}
				if let Some(max) = max {
					if n > *max {
						return Err(ValidationError::InvalidValue {
							field: field.name.clone(),
							message: format!("{} is above the maximum of {}", n, max),
						});
					}
				}
			}
			FieldType::Boolean => {
				if !value.is_bool() {
					return Err(Self::mismatch(field, "boolean", value));
				}
			}
		}
		Ok(())
	}

	fn mismatch(field: &Field, expected: &str, actual: &toml::Value) -> ValidationError {
		ValidationError::TypeMismatch {
			field: field.name.clone(),
			expected: expected.to_string(),
			actual: toml_type_name(actual).to_string(),
		}
	}
}

fn toml_type_name(value: &toml::Value) -> &'static str {
	match value {
		toml::Value::String(_) => "string",
		toml::Value::Integer(_) => "integer",
		toml::Value::Float(_) => "float",
		toml::Value::Boolean(_) => "boolean",
		toml::Value::Datetime(_) => "datetime",
		toml::Value::Array(_) => "array",
		toml::Value::Table(_) => "table",
	}
}

/// Trait implemented by storage backends to validate their own
/// configuration tables before construction.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
