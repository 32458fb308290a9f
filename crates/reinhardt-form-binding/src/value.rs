//! Value model shared by the element tree
//!
//! Values are plain [`serde_json::Value`]s. `Null` means "undefined",
//! strings, numbers and booleans are scalars and objects are composites.
//! Arrays are accepted on input and normalised into objects keyed by their
//! index, so every composite is a key to value mapping.

use serde_json::{Map, Value};
use std::fmt;

/// The fixed shape of an element.
///
/// An element starts out [`ValueKind::Undetermined`]. The first defined value
/// it receives (or the first child materialized under it) fixes it as
/// [`ValueKind::Scalar`] or [`ValueKind::Composite`] for the rest of its
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueKind {
	#[default]
	Undetermined,
	Scalar,
	Composite,
}

impl ValueKind {
	/// Classify a raw value. `Null` carries no shape information.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_binding::ValueKind;
	/// use serde_json::json;
	///
	/// assert_eq!(ValueKind::of(&json!(null)), ValueKind::Undetermined);
	/// assert_eq!(ValueKind::of(&json!("abc")), ValueKind::Scalar);
	/// assert_eq!(ValueKind::of(&json!(["a", "b"])), ValueKind::Composite);
	/// ```
	pub fn of(value: &Value) -> Self {
		match value {
			Value::Null => Self::Undetermined,
			Value::Array(_) | Value::Object(_) => Self::Composite,
			_ => Self::Scalar,
		}
	}

	/// Whether a value of kind `other` may be stored under this kind.
	pub fn accepts(self, other: ValueKind) -> bool {
		self == ValueKind::Undetermined || other == ValueKind::Undetermined || self == other
	}
}

impl fmt::Display for ValueKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			Self::Undetermined => "undetermined",
			Self::Scalar => "scalar",
			Self::Composite => "composite",
		};
		f.write_str(s)
	}
}

/// Runtime category of a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
	Null,
	Boolean,
	Number,
	String,
	Composite,
}

impl ValueType {
	pub fn of(value: &Value) -> Self {
		match value {
			Value::Null => Self::Null,
			Value::Bool(_) => Self::Boolean,
			Value::Number(_) => Self::Number,
			Value::String(_) => Self::String,
			Value::Array(_) | Value::Object(_) => Self::Composite,
		}
	}
}

impl fmt::Display for ValueType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			Self::Null => "null",
			Self::Boolean => "boolean",
			Self::Number => "number",
			Self::String => "string",
			Self::Composite => "composite",
		};
		f.write_str(s)
	}
}

/// Returns `true` if `key` is the canonical decimal form of an integer.
///
/// Such keys address list slots (`tags[0]`, `tags[1]`, ...) rather than
/// named members.
///
/// # Examples
///
/// ```
/// use reinhardt_form_binding::value::is_index_key;
///
/// assert!(is_index_key("0"));
/// assert!(is_index_key("-12"));
/// assert!(!is_index_key("01"));
/// assert!(!is_index_key("name"));
/// ```
pub fn is_index_key(key: &str) -> bool {
	match key.parse::<i64>() {
		Ok(n) => n.to_string() == key,
		Err(_) => false,
	}
}

/// Normalise a raw value: arrays become index-keyed objects and `null`
/// members are dropped, recursively.
///
/// # Examples
///
/// ```
/// use reinhardt_form_binding::value::normalize;
/// use serde_json::json;
///
/// assert_eq!(
///     normalize(json!({"tags": ["a", "b"], "gone": null})),
///     json!({"tags": {"0": "a", "1": "b"}})
/// );
/// ```
pub fn normalize(value: Value) -> Value {
	match value {
		Value::Array(items) => Value::Object(
			items
				.into_iter()
				.enumerate()
				.filter(|(_, v)| !v.is_null())
				.map(|(i, v)| (i.to_string(), normalize(v)))
				.collect(),
		),
		Value::Object(map) => Value::Object(
			map.into_iter()
				.filter(|(_, v)| !v.is_null())
				.map(|(k, v)| (k, normalize(v)))
				.collect(),
		),
		other => other,
	}
}

/// Recursively merge `overrides` into `base`.
///
/// Every key of `overrides` replaces the value in `base`, or is merged into
/// it when both sides hold a mapping. Index keys that appear only in `base`
/// are dropped: they are list slots the override has replaced, not sparse
/// entries to keep. `null` entries in `overrides` count as absent.
///
/// # Examples
///
/// ```
/// use reinhardt_form_binding::value::merge;
/// use serde_json::json;
///
/// let base = json!({"0": "x", "1": "y", "name": "a", "opts": {"k": 1, "j": 2}});
/// let overrides = json!({"0": "z", "opts": {"k": 5}});
///
/// let merged = merge(
///     base.as_object().unwrap(),
///     overrides.as_object().unwrap(),
/// );
/// assert_eq!(
///     serde_json::Value::Object(merged),
///     json!({"0": "z", "name": "a", "opts": {"k": 5, "j": 2}})
/// );
/// ```
pub fn merge(base: &Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
	merge_with(base, overrides, true)
}

/// [`merge`] with control over dropping base-only index keys.
///
/// With `replace_indexed` off this is a plain recursive merge.
pub fn merge_with(
	base: &Map<String, Value>,
	overrides: &Map<String, Value>,
	replace_indexed: bool,
) -> Map<String, Value> {
	let overridden = |key: &str| overrides.get(key).is_some_and(|v| !v.is_null());

	let mut merged: Map<String, Value> = base
		.iter()
		.filter(|(key, _)| !(replace_indexed && is_index_key(key) && !overridden(key)))
		.map(|(key, value)| (key.clone(), value.clone()))
		.collect();

	for (key, value) in overrides {
		if value.is_null() {
			continue;
		}
		let resolved = match (merged.get(key), value) {
			(Some(Value::Object(base_map)), Value::Object(override_map)) => {
				Value::Object(merge_with(base_map, override_map, replace_indexed))
			}
			_ => value.clone(),
		};
		merged.insert(key.clone(), resolved);
	}
	merged
}

/// Merge two optional composites, the way an element reconciles its
/// submitted value with its default.
pub(crate) fn reconcile(default: Value, submitted: Value, replace_indexed: bool) -> Value {
	match (default, submitted) {
		(Value::Object(base), Value::Object(overrides)) => {
			Value::Object(merge_with(&base, &overrides, replace_indexed))
		}
		(default, Value::Null) => default,
		(_, submitted) => submitted,
	}
}

/// String form of a scalar as a form control would carry it.
///
/// `null` becomes the empty string, booleans become `"1"` / `""`.
/// Composites have no string form.
pub fn scalar_to_string(value: &Value) -> Option<String> {
	match value {
		Value::Null => Some(String::new()),
		Value::Bool(true) => Some("1".to_string()),
		Value::Bool(false) => Some(String::new()),
		Value::Number(n) => Some(n.to_string()),
		Value::String(s) => Some(s.clone()),
		Value::Array(_) | Value::Object(_) => None,
	}
}

/// Loose scalar equality: two scalars match when their string forms match,
/// so a submitted `"1"` matches a numeric `1`.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
	match (scalar_to_string(a), scalar_to_string(b)) {
		(Some(a), Some(b)) => a == b,
		_ => false,
	}
}
