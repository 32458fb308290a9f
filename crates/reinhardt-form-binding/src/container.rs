//! Tree navigation and validation-message API shared by elements and forms

use crate::element::{Element, Slot};
use crate::error::{BindingError, BindingResult};
use crate::value::ValueKind;
use serde_json::Value;

/// A node of a form tree that can hold named children and error state.
///
/// Implemented by [`Element`] and by the root [`Form`](crate::Form). All
/// behaviour is provided on top of [`Container::element`] and
/// [`Container::element_mut`].
///
/// Error codes default to [`DEFAULT_ERROR_CODE`](crate::DEFAULT_ERROR_CODE)
/// when `None` is passed; messages and codes accept either a `&str` or an
/// `Option<&str>`.
///
/// # Examples
///
/// ```
/// use reinhardt_form_binding::{Container, Form};
/// use serde_json::json;
///
/// let mut form = Form::from_submission(json!({"user": {"name": ""}}), "", None).unwrap();
/// form.child("user").unwrap().child("name").unwrap().add_error("Required", "req");
///
/// assert!(!form.has_errors(None));
/// assert!(form.contains_errors("req"));
/// assert!(!form.contains_errors("other"));
/// ```
pub trait Container {
	fn element(&self) -> &Element;

	fn element_mut(&mut self) -> &mut Element;

	/// Full name path of this node (`""` for an unnamed root).
	fn name(&self) -> &str {
		&self.element().name
	}

	fn kind(&self) -> ValueKind {
		self.element().kind
	}

	/// Replace the submitted value, distributing it into materialized
	/// children. Fails with [`BindingError::TypeConflict`] without changing
	/// anything if the value clashes with the node's fixed kind.
	fn set_submitted(&mut self, value: Value) -> BindingResult<()> {
		self.element_mut().assign(Slot::Submitted, value)
	}

	/// Replace the default value; same rules as [`Container::set_submitted`].
	fn set_default(&mut self, value: Value) -> BindingResult<()> {
		self.element_mut().assign(Slot::Default, value)
	}

	/// Return the child named `key`, materializing it on first access.
	///
	/// The same child is returned on every call. Fails with
	/// [`BindingError::TypeConflict`] if this node is scalar.
	fn child(&mut self, key: &str) -> BindingResult<&mut Element> {
		let element = self.element_mut();
		if element.kind == ValueKind::Scalar {
			return Err(BindingError::type_conflict(
				&element.name,
				ValueKind::Scalar,
				ValueKind::Composite,
			));
		}
		Ok(element.ensure_child(key))
	}

	/// An already materialized child.
	fn get(&self, key: &str) -> Option<&Element> {
		self.element().children.get(key)
	}

	/// Assign a submitted value to one child, creating it if needed.
	fn set_child_value(&mut self, key: &str, value: Value) -> BindingResult<&mut Element> {
		self.element_mut().assign_child(key, value)
	}

	/// Drop a child and its submitted value. A default for the same key
	/// keeps the key enumerable.
	fn remove(&mut self, key: &str) -> Option<Element> {
		self.element_mut().remove_child(key)
	}

	/// Whether a defined value was submitted for `key`.
	fn is_set(&self, key: &str) -> bool {
		let element = self.element();
		match element.children.get(key) {
			Some(child) => !child.get_submitted().is_null(),
			None => element.submitted.get(key).is_some_and(|v| !v.is_null()),
		}
	}

	fn count(&self) -> usize {
		self.element().keys.len()
	}

	fn is_empty(&self) -> bool {
		self.count() == 0
	}

	fn keys(&self) -> Vec<&str> {
		self.element().keys.iter().map(String::as_str).collect()
	}

	/// Iterate `(key, child)` pairs in key order.
	///
	/// A child is materialized for every key of this node; grandchildren are
	/// left alone until they are iterated or addressed themselves. Each call
	/// starts a fresh iteration.
	fn iter(&mut self) -> Children<'_> {
		let element = self.element_mut();
		element.materialize_children();
		Children {
			inner: element.children.iter(),
		}
	}

	/// Like [`Container::iter`], yielding mutable children so nested loops
	/// can descend with their own `iter`.
	fn iter_mut(&mut self) -> ChildrenMut<'_> {
		let element = self.element_mut();
		element.materialize_children();
		ChildrenMut {
			inner: element.children.iter_mut(),
		}
	}

	/// Iterate the children materialized so far, without creating any.
	fn children(&self) -> Children<'_> {
		Children {
			inner: self.element().children.iter(),
		}
	}

	/// Clear `code` on this node, then register it with `message`.
	fn set_error<'a>(
		&mut self,
		message: impl Into<Option<&'a str>>,
		code: impl Into<Option<&'a str>>,
	) -> &mut Self {
		self.element_mut()
			.errors
			.set(message.into(), code.into());
		self
	}

	/// Register `code` on this node, appending `message` if given.
	fn add_error<'a>(
		&mut self,
		message: impl Into<Option<&'a str>>,
		code: impl Into<Option<&'a str>>,
	) -> &mut Self {
		self.element_mut()
			.errors
			.add(message.into(), code.into());
		self
	}

	/// Whether this node has `code` registered, or any code at all.
	fn has_errors<'a>(&self, code: impl Into<Option<&'a str>>) -> bool {
		self.element().errors.has(code.into())
	}

	/// [`Container::has_errors`] extended to every descendant.
	fn contains_errors<'a>(&self, code: impl Into<Option<&'a str>>) -> bool {
		fn walk(element: &Element, code: Option<&str>) -> bool {
			element.errors.has(code) || element.children.values().any(|child| walk(child, code))
		}
		walk(self.element(), code.into())
	}

	/// Messages of one code, or all messages in code order.
	fn get_errors<'a>(&self, code: impl Into<Option<&'a str>>) -> Vec<&str> {
		self.element().errors.get(code.into())
	}

	fn get_error_codes(&self) -> Vec<&str> {
		self.element().errors.codes()
	}

	/// Remove one code, or all codes, from this node only.
	fn clear_errors<'a>(&mut self, code: impl Into<Option<&'a str>>) -> &mut Self {
		self.element_mut().errors.clear(code.into());
		self
	}

	/// [`Container::clear_errors`] applied to this node and every descendant.
	fn clear_errors_deep<'a>(&mut self, code: impl Into<Option<&'a str>>) -> &mut Self {
		fn walk(element: &mut Element, code: Option<&str>) {
			element.errors.clear(code);
			for child in element.children.values_mut() {
				walk(child, code);
			}
		}
		walk(self.element_mut(), code.into());
		self
	}
}

/// Iterator over `(key, child)` pairs of a container.
pub struct Children<'a> {
	inner: indexmap::map::Iter<'a, String, Element>,
}

impl<'a> Iterator for Children<'a> {
	type Item = (&'a str, &'a Element);

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|(key, child)| (key.as_str(), child))
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.inner.size_hint()
	}
}

impl ExactSizeIterator for Children<'_> {}

/// Iterator over `(key, child)` pairs with mutable children.
pub struct ChildrenMut<'a> {
	inner: indexmap::map::IterMut<'a, String, Element>,
}

impl<'a> Iterator for ChildrenMut<'a> {
	type Item = (&'a str, &'a mut Element);

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|(key, child)| (key.as_str(), child))
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.inner.size_hint()
	}
}

impl ExactSizeIterator for ChildrenMut<'_> {}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::messages::DEFAULT_ERROR_CODE;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn profile() -> Element {
		Element::with_values(
			"",
			json!({"name": "joe", "address": {"city": "Sofia", "zip": "1000"}}),
			json!({"tags": ["a", "b"]}),
		)
		.unwrap()
	}

	#[rstest]
	fn test_child_memoized(mut profile: Element) {
		let first = profile.child("name").unwrap() as *const Element;
		let keys_before = profile.keys().len();
		let second = profile.child("name").unwrap() as *const Element;

		assert_eq!(first, second);
		assert_eq!(profile.keys().len(), keys_before);
	}

	#[rstest]
	fn test_child_state_persists(mut profile: Element) {
		profile.child("name").unwrap().add_error("Taken", None);

		assert!(profile.child("name").unwrap().has_errors(None));
	}

	#[rstest]
	fn test_count_and_keys(profile: Element) {
		assert_eq!(profile.count(), 3);
		assert_eq!(profile.keys(), vec!["name", "address", "tags"]);
	}

	#[rstest]
	fn test_iter_in_key_order(mut profile: Element) {
		profile.child("tags").unwrap();
		profile.child("extra").unwrap();

		let keys: Vec<&str> = profile.iter().map(|(key, _)| key).collect();
		assert_eq!(keys, vec!["name", "address", "tags", "extra"]);
	}

	#[rstest]
	fn test_iter_restarts(mut profile: Element) {
		let first: Vec<String> = profile.iter().map(|(k, _)| k.to_string()).collect();
		let second: Vec<String> = profile.iter().map(|(k, _)| k.to_string()).collect();

		assert_eq!(first, second);
	}

	#[rstest]
	fn test_nested_iteration_keeps_outer_position(mut profile: Element) {
		let mut visited = Vec::new();
		for (key, child) in profile.iter_mut() {
			visited.push(key.to_string());
			for (inner_key, grandchild) in child.iter() {
				visited.push(format!("{}={}", inner_key, grandchild.get_value()));
			}
		}

		assert_eq!(
			visited,
			vec![
				"name",
				"address",
				"city=\"Sofia\"",
				"zip=\"1000\"",
				"tags",
				"0=\"a\"",
				"1=\"b\"",
			]
		);
	}

	#[rstest]
	fn test_iter_materializes_direct_children_only(mut profile: Element) {
		assert_eq!(profile.iter().count(), 3);

		let address = profile.get("address").unwrap();
		assert_eq!(address.count(), 2);
		assert_eq!(address.children().count(), 0);
		assert_eq!(profile.get("tags").unwrap().children().count(), 0);
	}

	#[rstest]
	fn test_iter_mut_allows_nested_mutation(mut profile: Element) {
		for (_, child) in profile.iter_mut() {
			for (_, grandchild) in child.iter_mut() {
				grandchild.add_error("checked", "audit");
			}
		}

		let address = profile.get("address").unwrap();
		assert!(address.get("city").unwrap().has_errors("audit"));
		assert!(!address.has_errors(None));
		assert!(profile.contains_errors("audit"));
	}

	#[rstest]
	fn test_iter_on_scalar_is_empty() {
		let mut scalar = Element::with_values("x", json!("1"), json!(null)).unwrap();

		assert_eq!(scalar.iter().count(), 0);
	}

	#[rstest]
	fn test_set_child_value(mut profile: Element) {
		let city = profile
			.child("address")
			.unwrap()
			.set_child_value("city", json!("Varna"))
			.unwrap();
		assert_eq!(city.get_value(), json!("Varna"));

		profile.set_child_value("nickname", json!("jj")).unwrap();

		assert_eq!(profile.get_submitted()["address"]["city"], json!("Varna"));
		assert!(profile.keys().contains(&"nickname"));
		assert_eq!(profile.get_value()["nickname"], json!("jj"));
	}

	#[rstest]
	fn test_set_child_value_on_scalar_fails() {
		let mut scalar = Element::with_values("x", json!("1"), json!(null)).unwrap();

		assert!(scalar.set_child_value("a", json!("b")).unwrap_err().is_type_conflict());
	}

	#[rstest]
	fn test_set_child_value_conflict_with_default(mut profile: Element) {
		let err = profile.set_child_value("tags", json!("flat")).unwrap_err();

		assert!(err.is_type_conflict());
		assert!(!profile.is_set("tags"));
	}

	#[rstest]
	fn test_remove(mut profile: Element) {
		profile.child("name").unwrap();

		let removed = profile.remove("name");

		assert!(removed.is_some());
		assert!(profile.get("name").is_none());
		assert!(!profile.keys().contains(&"name"));
		assert!(profile.remove("missing").is_none());
	}

	#[rstest]
	fn test_remove_keeps_default_key(mut profile: Element) {
		profile.remove("tags");

		assert!(profile.keys().contains(&"tags"));
	}

	#[rstest]
	fn test_is_set(mut profile: Element) {
		assert!(profile.is_set("name"));
		assert!(!profile.is_set("tags"));
		assert!(!profile.is_set("missing"));

		profile.child("missing").unwrap();
		assert!(!profile.is_set("missing"));
	}

	#[rstest]
	fn test_no_errors_after_construction(profile: Element) {
		assert!(!profile.has_errors(None));
		assert!(!profile.contains_errors(None));
		assert!(profile.get_errors(None).is_empty());
		assert!(profile.get_error_codes().is_empty());
	}

	#[rstest]
	fn test_add_error_with_code(mut profile: Element) {
		profile.add_error("Required", "req");

		assert!(profile.has_errors("req"));
		assert!(!profile.has_errors("other"));
		assert!(profile.has_errors(None));
		assert!(profile.get_errors(None).contains(&"Required"));
		assert_eq!(profile.get_error_codes(), vec!["req"]);
	}

	#[rstest]
	fn test_add_error_without_message(mut profile: Element) {
		profile.add_error(None, None);

		assert!(profile.has_errors(DEFAULT_ERROR_CODE));
		assert!(profile.get_errors(None).is_empty());
	}

	#[rstest]
	fn test_set_error_replaces(mut profile: Element) {
		profile
			.add_error("one", None)
			.add_error("two", None)
			.set_error("three", None);

		assert_eq!(profile.get_errors(None), vec!["three"]);
	}

	#[rstest]
	fn test_contains_errors_deep(mut profile: Element) {
		profile
			.child("address")
			.unwrap()
			.child("zip")
			.unwrap()
			.add_error("Invalid zip", "format");

		assert!(!profile.has_errors(None));
		assert!(profile.contains_errors(None));
		assert!(profile.contains_errors("format"));
		assert!(!profile.contains_errors("req"));
	}

	#[rstest]
	fn test_clear_errors_shallow_and_deep(mut profile: Element) {
		profile.add_error("top", "a");
		profile.child("name").unwrap().add_error("inner", "a");
		profile.child("name").unwrap().add_error("inner b", "b");

		profile.clear_errors("a");
		assert!(!profile.has_errors("a"));
		assert!(profile.contains_errors("a"));

		profile.clear_errors_deep("a");
		assert!(!profile.contains_errors("a"));
		assert!(profile.contains_errors("b"));

		profile.clear_errors_deep(None);
		assert!(!profile.contains_errors(None));
	}
}
