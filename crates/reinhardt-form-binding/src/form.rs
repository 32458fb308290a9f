use crate::container::Container;
use crate::context;
use crate::element::{Element, Slot};
use crate::error::BindingResult;
use crate::settings::FormSettings;
use crate::value;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Root of a form tree: one submission reconciled with its defaults.
///
/// A form is built once per request from the submitted data, receives its
/// defaults, and then hands out [`Element`]s for its fields on demand.
/// Validation attaches messages to those elements; afterwards the tree can be
/// exported as resolved values, hidden fields or a query string.
///
/// # Examples
///
/// ```
/// use reinhardt_form_binding::{Container, Form};
/// use serde_json::json;
///
/// let mut form = Form::from_submission(json!({"username": "joe"}), "", None).unwrap();
/// form.set_defaults(json!({"remember": 0})).unwrap();
///
/// assert!(form.is_submitted());
/// assert_eq!(form.child("username").unwrap().get_value(), json!("joe"));
/// assert_eq!(
///     serde_json::Value::Object(form.get_values()),
///     json!({"username": "joe", "remember": 0})
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Form {
	root: Element,
	submitted: bool,
}

impl Form {
	/// Build a form from submitted data.
	///
	/// `name` is the root name children are nested under (`""` for none).
	/// Without an explicit `submitted` flag the form counts as submitted when
	/// the submission has any keys; pass `Some(true)` to treat replayed data
	/// as a fresh submission.
	///
	/// Fails with [`BindingError::TypeConflict`](crate::BindingError) if the
	/// submission is a scalar.
	pub fn from_submission(
		submission: Value,
		name: &str,
		submitted: Option<bool>,
	) -> BindingResult<Self> {
		Self::with_settings(FormSettings::default(), submission, name, submitted)
	}

	/// [`Form::from_submission`] with explicit settings.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_binding::{Form, FormSettings};
	/// use serde_json::json;
	///
	/// let settings = FormSettings::new().with_hidden_separator("");
	/// let form = Form::with_settings(settings, json!({"a": "1", "b": "2"}), "", None).unwrap();
	/// assert_eq!(
	///     form.serialize_hidden(),
	///     r#"<input type="hidden" name="a" value="1"><input type="hidden" name="b" value="2">"#
	/// );
	/// ```
	pub fn with_settings(
		settings: FormSettings,
		submission: Value,
		name: &str,
		submitted: Option<bool>,
	) -> BindingResult<Self> {
		let mut root = Element::root(name, Arc::new(settings));
		root.assign(Slot::Submitted, submission)?;
		let submitted = submitted.unwrap_or_else(|| !root.keys.is_empty());
		tracing::debug!(
			name = %name,
			submitted,
			fields = root.keys.len(),
			"bound form submission"
		);
		Ok(Self { root, submitted })
	}

	/// Build a form from query and body data of one request.
	///
	/// Body values take precedence over query values. `context` selects the
	/// part of the merged data that belongs to this form and becomes its
	/// root name.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_binding::{Container, Form};
	/// use serde_json::json;
	///
	/// let query = json!({"login": {"username": "from-query", "next": "/home"}});
	/// let body = json!({"login": {"username": "from-body"}});
	///
	/// let mut form = Form::from_request(query, body, "login").unwrap();
	/// let username = form.child("username").unwrap();
	/// assert_eq!(username.name(), "login[username]");
	/// assert_eq!(username.get_value(), json!("from-body"));
	/// assert_eq!(form.child("next").unwrap().get_value(), json!("/home"));
	/// ```
	pub fn from_request(query: Value, body: Value, context: &str) -> BindingResult<Self> {
		let merged = value::merge(&into_map(query), &into_map(body));
		let submission = context::resolve_context(&Value::Object(merged), context);
		Self::from_submission(submission, context, None)
	}

	/// Build a form from a raw urlencoded query string.
	pub fn from_query_string(raw: &str, context: &str) -> BindingResult<Self> {
		let parsed = context::parse_query_string(raw)?;
		let submission = context::resolve_context(&parsed, context);
		Self::from_submission(submission, context, None)
	}

	/// Apply declared defaults to the whole tree.
	///
	/// May be called repeatedly; already materialized children are kept and
	/// receive their slice of the new defaults.
	pub fn set_defaults(&mut self, defaults: Value) -> BindingResult<&mut Self> {
		self.root.assign(Slot::Default, defaults)?;
		tracing::debug!(name = %self.root.name, fields = self.root.keys.len(), "applied form defaults");
		Ok(self)
	}

	pub fn is_submitted(&self) -> bool {
		self.submitted
	}

	/// Resolved values of the whole tree.
	pub fn get_values(&self) -> Map<String, Value> {
		into_map(self.root.get_value())
	}

	/// One hidden input per defined scalar leaf, for carrying the form state
	/// over to another request.
	pub fn serialize_hidden(&self) -> String {
		self.root.serialize_hidden()
	}

	/// The resolved values as a query string, nested under the root name if
	/// the form has one.
	pub fn serialize_query(&self) -> BindingResult<String> {
		self.root.serialize_query()
	}

	pub fn settings(&self) -> &FormSettings {
		self.root.settings()
	}
}

fn into_map(value: Value) -> Map<String, Value> {
	match value::normalize(value) {
		Value::Object(map) => map,
		_ => Map::new(),
	}
}

impl Container for Form {
	fn element(&self) -> &Element {
		&self.root
	}

	fn element_mut(&mut self) -> &mut Element {
		&mut self.root
	}
}
