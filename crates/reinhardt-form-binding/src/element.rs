use crate::container::Container;
use crate::error::{BindingError, BindingResult};
use crate::messages::ErrorMessages;
use crate::render;
use crate::settings::FormSettings;
use crate::value::{self, ValueKind, ValueType};
use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};
use regex::{NoExpand, Regex};
use serde_json::{Map, Value};
use std::sync::{Arc, LazyLock};

// Characters that cannot appear in a derived identifier.
static NON_ALPHANUMERIC: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"[^A-Za-z0-9]+").expect("NON_ALPHANUMERIC: invalid regex pattern")
});

/// Which of the two value slots an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
	Submitted,
	Default,
}

/// Build the name of a child element: `key` at the root, `parent[key]` below.
pub(crate) fn join_name(parent: &str, key: &str) -> String {
	if parent.is_empty() {
		key.to_string()
	} else {
		format!("{}[{}]", parent, key)
	}
}

fn slice(value: &Value, key: &str) -> Value {
	value.get(key).cloned().unwrap_or(Value::Null)
}

/// Check that `incoming` can be stored next to `existing` without a
/// scalar/composite clash anywhere in the two trees.
fn check_compatible(name: &str, existing: &Value, incoming: &Value) -> BindingResult<()> {
	let expected = ValueKind::of(existing);
	let found = ValueKind::of(incoming);
	if !expected.accepts(found) {
		return Err(BindingError::type_conflict(name, expected, found));
	}
	if let (Value::Object(existing), Value::Object(incoming)) = (existing, incoming) {
		for (key, sub) in incoming {
			if let Some(current) = existing.get(key) {
				check_compatible(&join_name(name, key), current, sub)?;
			}
		}
	}
	Ok(())
}

/// Fold `value` into the shape record `seen`, keeping every key either value
/// ever held. Callers must have checked the two for compatibility.
fn remember(seen: &mut Value, value: &Value) {
	match (seen, value) {
		(_, Value::Null) => {}
		(Value::Object(seen), Value::Object(value)) => {
			for (key, sub) in value {
				remember(seen.entry(key.clone()).or_insert(Value::Null), sub);
			}
		}
		(seen, value) => *seen = value.clone(),
	}
}

/// Collect every defined scalar leaf of `value` with its full field name.
fn flatten<'v>(name: String, value: &'v Value, out: &mut Vec<(String, &'v Value)>) {
	match value {
		Value::Null => {}
		Value::Object(map) => {
			for (key, sub) in map {
				flatten(join_name(&name, key), sub, out);
			}
		}
		Value::Array(items) => {
			for (index, sub) in items.iter().enumerate() {
				flatten(join_name(&name, &index.to_string()), sub, out);
			}
		}
		scalar => out.push((name, scalar)),
	}
}

/// A named node of a form tree.
///
/// An element holds the value submitted for its field and the declared
/// default, and resolves its effective value from the two: the submitted
/// value when it is defined, the default otherwise. Composite elements
/// materialize a child element for a key the first time it is addressed and
/// keep it for their whole lifetime.
///
/// Tree navigation and validation messages are provided by the
/// [`Container`] trait.
///
/// # Examples
///
/// ```
/// use reinhardt_form_binding::{Container, Element};
/// use serde_json::json;
///
/// let mut address = Element::with_values(
///     "address",
///     json!({"city": "Sofia"}),
///     json!({"city": "Plovdiv", "zip": "4000"}),
/// )
/// .unwrap();
///
/// let city = address.child("city").unwrap();
/// assert_eq!(city.name(), "address[city]");
/// assert_eq!(city.get_value(), json!("Sofia"));
/// assert_eq!(address.get_value(), json!({"city": "Sofia", "zip": "4000"}));
/// ```
#[derive(Debug, Clone)]
pub struct Element {
	pub(crate) name: String,
	pub(crate) submitted: Value,
	pub(crate) default: Value,
	pub(crate) kind: ValueKind,
	// Every value either slot has held, so keys without a child keep their kind.
	seen: Value,
	pub(crate) children: IndexMap<String, Element>,
	pub(crate) keys: IndexSet<String>,
	pub(crate) errors: ErrorMessages,
	pub(crate) settings: Arc<FormSettings>,
}

impl Element {
	/// Create an element with no values.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_binding::{Container, Element, ValueKind};
	///
	/// let element = Element::new("email");
	/// assert_eq!(element.name(), "email");
	/// assert_eq!(element.kind(), ValueKind::Undetermined);
	/// assert!(element.get_value().is_null());
	/// ```
	pub fn new(name: impl Into<String>) -> Self {
		Self::from_parts(
			name.into(),
			Value::Null,
			Value::Null,
			Arc::new(FormSettings::default()),
		)
	}

	/// Create an element from a submitted value and a default value.
	///
	/// Fails with [`BindingError::TypeConflict`] when the two disagree on
	/// being scalar or composite anywhere in their trees.
	pub fn with_values(
		name: impl Into<String>,
		submitted: Value,
		default: Value,
	) -> BindingResult<Self> {
		let name = name.into();
		let submitted = value::normalize(submitted);
		let default = value::normalize(default);
		check_compatible(&name, &submitted, &default)?;
		Ok(Self::from_parts(
			name,
			submitted,
			default,
			Arc::new(FormSettings::default()),
		))
	}

	/// Root element of a form: always composite.
	pub(crate) fn root(name: &str, settings: Arc<FormSettings>) -> Self {
		let mut root = Self::from_parts(name.to_string(), Value::Null, Value::Null, settings);
		root.kind = ValueKind::Composite;
		root
	}

	fn from_parts(name: String, submitted: Value, default: Value, settings: Arc<FormSettings>) -> Self {
		let mut seen = Value::Null;
		remember(&mut seen, &default);
		remember(&mut seen, &submitted);
		let mut element = Self {
			name,
			submitted,
			default,
			kind: ValueKind::of(&seen),
			seen,
			children: IndexMap::new(),
			keys: IndexSet::new(),
			errors: ErrorMessages::new(),
			settings,
		};
		element.recompute_keys();
		element
	}

	fn slot(&self, slot: Slot) -> &Value {
		match slot {
			Slot::Submitted => &self.submitted,
			Slot::Default => &self.default,
		}
	}

	fn slot_mut(&mut self, slot: Slot) -> &mut Value {
		match slot {
			Slot::Submitted => &mut self.submitted,
			Slot::Default => &mut self.default,
		}
	}

	/// Store `value` in `slot`, distributing it into materialized children.
	///
	/// The whole assignment is validated before anything is written, so a
	/// rejected value leaves the tree untouched.
	pub(crate) fn assign(&mut self, slot: Slot, value: Value) -> BindingResult<()> {
		let value = value::normalize(value);
		self.check_assignable(slot, &value)?;
		self.apply(slot, value);
		Ok(())
	}

	fn check_assignable(&self, slot: Slot, value: &Value) -> BindingResult<()> {
		let found = ValueKind::of(value);
		if !self.kind.accepts(found) {
			return Err(BindingError::type_conflict(&self.name, self.kind, found));
		}
		if let Value::Object(map) = value {
			for (key, sub) in map {
				self.check_key(slot, key, sub)?;
			}
		}
		Ok(())
	}

	/// Check one member of an incoming value: against its child if there is
	/// one, otherwise against every value ever stored under the key.
	fn check_key(&self, slot: Slot, key: &str, value: &Value) -> BindingResult<()> {
		match self.children.get(key) {
			Some(child) => child.check_assignable(slot, value),
			None => check_compatible(
				&join_name(&self.name, key),
				self.seen.get(key).unwrap_or(&Value::Null),
				value,
			),
		}
	}

	fn apply(&mut self, slot: Slot, value: Value) {
		let kind = ValueKind::of(&value);
		if kind != ValueKind::Undetermined {
			self.kind = kind;
		}
		for (key, child) in self.children.iter_mut() {
			child.apply(slot, slice(&value, key));
		}
		remember(&mut self.seen, &value);
		*self.slot_mut(slot) = value;
		self.recompute_keys();
	}

	/// Keys are the union of submitted keys, default keys and materialized
	/// children, in that order.
	fn recompute_keys(&mut self) {
		let mut keys = IndexSet::new();
		for source in [&self.submitted, &self.default] {
			if let Value::Object(map) = source {
				keys.extend(map.keys().cloned());
			}
		}
		keys.extend(self.children.keys().cloned());
		self.keys = keys;
	}

	/// Return the child for `key`, creating it from this element's values on
	/// first access. Callers must have ruled out a scalar element.
	pub(crate) fn ensure_child(&mut self, key: &str) -> &mut Element {
		self.kind = ValueKind::Composite;
		match self.children.entry(key.to_string()) {
			Entry::Occupied(entry) => entry.into_mut(),
			Entry::Vacant(entry) => {
				let mut child = Element::from_parts(
					join_name(&self.name, key),
					slice(&self.submitted, key),
					slice(&self.default, key),
					Arc::clone(&self.settings),
				);
				// A value replaced before the child existed still fixes its kind.
				remember(&mut child.seen, &slice(&self.seen, key));
				child.kind = ValueKind::of(&child.seen);
				tracing::trace!(name = %child.name, kind = %child.kind, "materialized child element");
				self.keys.insert(key.to_string());
				entry.insert(child)
			}
		}
	}

	/// Materialize a child for every key, ordering children by key order.
	pub(crate) fn materialize_children(&mut self) {
		if self.keys.is_empty() {
			return;
		}
		let keys: Vec<String> = self.keys.iter().cloned().collect();
		for key in &keys {
			self.ensure_child(key);
		}
		let order = &self.keys;
		self.children
			.sort_by(|a, _, b, _| order.get_index_of(a).cmp(&order.get_index_of(b)));
	}

	pub(crate) fn assign_child(&mut self, key: &str, value: Value) -> BindingResult<&mut Element> {
		if self.kind == ValueKind::Scalar {
			return Err(BindingError::type_conflict(
				&self.name,
				ValueKind::Scalar,
				ValueKind::Composite,
			));
		}
		let value = value::normalize(value);
		self.check_key(Slot::Submitted, key, &value)?;

		if !self.submitted.is_object() {
			self.submitted = Value::Object(Map::new());
		}
		if let Value::Object(map) = &mut self.submitted {
			if value.is_null() {
				map.shift_remove(key);
			} else {
				map.insert(key.to_string(), value.clone());
			}
		}
		let mut member = Map::new();
		member.insert(key.to_string(), value.clone());
		remember(&mut self.seen, &Value::Object(member));
		self.recompute_keys();

		let child = self.ensure_child(key);
		child.apply(Slot::Submitted, value);
		Ok(child)
	}

	pub(crate) fn remove_child(&mut self, key: &str) -> Option<Element> {
		if let Value::Object(map) = &mut self.submitted {
			map.shift_remove(key);
		}
		let removed = self.children.shift_remove(key);
		if let Value::Object(seen) = &mut self.seen {
			match self.default.get(key) {
				Some(default) => {
					seen.insert(key.to_string(), default.clone());
				}
				None => {
					seen.shift_remove(key);
				}
			}
		}
		self.recompute_keys();
		removed
	}

	/// Rebuild a slot from the children so child-level changes show through.
	fn resolve(&self, slot: Slot) -> Value {
		let raw = self.slot(slot);
		if self.kind != ValueKind::Composite {
			return raw.clone();
		}
		let mut present = !raw.is_null();
		let mut resolved = Map::new();
		for key in &self.keys {
			let value = match self.children.get(key) {
				Some(child) => child.resolve(slot),
				None => slice(raw, key),
			};
			if !value.is_null() {
				present = true;
				resolved.insert(key.clone(), value);
			}
		}
		if present {
			Value::Object(resolved)
		} else {
			Value::Null
		}
	}

	/// The submitted value, `null` when nothing was submitted.
	pub fn get_submitted(&self) -> Value {
		self.resolve(Slot::Submitted)
	}

	/// The default value, `null` when no default was declared.
	pub fn get_default(&self) -> Value {
		self.resolve(Slot::Default)
	}

	/// The effective value: submitted if defined, default otherwise.
	///
	/// For composite elements the two are reconciled recursively, so default
	/// members the submission does not mention still show through (except
	/// list slots, see [`value::merge`]).
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_binding::Element;
	/// use serde_json::json;
	///
	/// let submitted = Element::with_values("name", json!("Joe"), json!("Anonymous")).unwrap();
	/// assert_eq!(submitted.get_value(), json!("Joe"));
	///
	/// let defaulted = Element::with_values("name", json!(null), json!("Anonymous")).unwrap();
	/// assert_eq!(defaulted.get_value(), json!("Anonymous"));
	/// ```
	pub fn get_value(&self) -> Value {
		match self.kind {
			ValueKind::Composite => value::reconcile(
				self.get_default(),
				self.get_submitted(),
				self.settings.replace_indexed_defaults,
			),
			_ if !self.submitted.is_null() => self.submitted.clone(),
			_ => self.default.clone(),
		}
	}

	pub fn get_type(&self) -> ValueType {
		ValueType::of(&self.get_value())
	}

	/// Derive an identifier safe for `id` attributes from the element name.
	///
	/// Every run of characters outside `[A-Za-z0-9]` in
	/// `prefix + name + suffix` collapses to one separator, and separators at
	/// either end are trimmed.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_binding::Element;
	///
	/// let element = Element::new("address[city]");
	/// assert_eq!(element.identifier("pfx-", "-sfx"), "pfx-address-city-sfx");
	/// assert_eq!(element.identifier("", ""), "address-city");
	/// ```
	pub fn identifier(&self, prefix: &str, suffix: &str) -> String {
		let raw = format!("{}{}{}", prefix, self.name, suffix);
		let separator = self.settings.identifier_separator.as_str();
		let replaced = NON_ALPHANUMERIC.replace_all(&raw, NoExpand(separator));
		if separator.is_empty() {
			return replaced.into_owned();
		}
		replaced
			.trim_start_matches(separator)
			.trim_end_matches(separator)
			.to_string()
	}

	/// The effective value if it is a scalar.
	pub fn as_scalar(&self) -> Option<Value> {
		match self.get_value() {
			value @ (Value::Bool(_) | Value::Number(_) | Value::String(_)) => Some(value),
			_ => None,
		}
	}

	/// The effective value as a mapping: composites as they are, a scalar as
	/// a single slot `{"0": value}`, nothing as an empty mapping.
	pub fn as_array(&self) -> Map<String, Value> {
		match self.get_value() {
			Value::Object(map) => map,
			Value::Null => Map::new(),
			scalar => {
				let mut map = Map::new();
				map.insert("0".to_string(), scalar);
				map
			}
		}
	}

	/// Whether the effective value is `target` (scalar) or contains it
	/// (composite). Comparison is loose, see [`value::loose_eq`].
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_binding::Element;
	/// use serde_json::json;
	///
	/// let subs = Element::with_values("subs", json!(["list1", "list3"]), json!(null)).unwrap();
	/// assert!(subs.matches_any("list3"));
	/// assert!(!subs.matches_any("list2"));
	///
	/// let remember = Element::with_values("remember", json!(null), json!(1)).unwrap();
	/// assert!(remember.matches_any("1"));
	/// ```
	pub fn matches_any(&self, target: impl Into<Value>) -> bool {
		let target = target.into();
		match self.get_value() {
			Value::Null => false,
			Value::Object(map) => map.values().any(|v| value::loose_eq(v, &target)),
			current => value::loose_eq(&current, &target),
		}
	}

	/// String form of a scalar effective value; undefined renders as `""`.
	pub fn as_string(&self) -> BindingResult<String> {
		value::scalar_to_string(&self.get_value()).ok_or_else(|| BindingError::NonScalar {
			name: self.name.clone(),
		})
	}

	/// Value for a `name` attribute: the name path, with `[]` appended when
	/// the effective value is composite.
	pub fn html_name(&self) -> String {
		if self.get_type() == ValueType::Composite {
			format!("{}[]", self.name)
		} else {
			self.name.clone()
		}
	}

	/// Render one hidden input per defined scalar leaf of the effective value.
	pub fn serialize_hidden(&self) -> String {
		let value = self.get_value();
		let mut leaves = Vec::new();
		flatten(self.name.clone(), &value, &mut leaves);
		leaves
			.into_iter()
			.map(|(name, leaf)| {
				render::hidden_input(&name, &value::scalar_to_string(leaf).unwrap_or_default())
			})
			.collect::<Vec<_>>()
			.join(&self.settings.hidden_separator)
	}

	/// Encode the effective value as a query string under the element name.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_binding::Element;
	/// use serde_json::json;
	///
	/// let sub = Element::with_values("sub", json!({"user": "joe"}), json!(null)).unwrap();
	/// assert_eq!(sub.serialize_query().unwrap(), "sub%5Buser%5D=joe");
	/// ```
	pub fn serialize_query(&self) -> BindingResult<String> {
		let value = self.get_value();
		let mut leaves = Vec::new();
		flatten(self.name.clone(), &value, &mut leaves);
		let pairs: Vec<(String, String)> = leaves
			.into_iter()
			.map(|(name, leaf)| (name, query_scalar(leaf)))
			.collect();
		Ok(serde_urlencoded::to_string(pairs)?)
	}

	pub fn settings(&self) -> &FormSettings {
		&self.settings
	}
}

// Query strings carry `false` as "0" rather than dropping it.
fn query_scalar(value: &Value) -> String {
	match value {
		Value::Bool(false) => "0".to_string(),
		other => value::scalar_to_string(other).unwrap_or_default(),
	}
}

impl Container for Element {
	fn element(&self) -> &Element {
		self
	}

	fn element_mut(&mut self) -> &mut Element {
		self
	}
}
