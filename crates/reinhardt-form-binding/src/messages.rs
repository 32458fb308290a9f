//! Per-element validation message registry

use indexmap::IndexMap;

/// Error code used when the caller does not name one.
pub const DEFAULT_ERROR_CODE: &str = ":default";

/// Validation messages grouped by error code.
///
/// A code may be registered with no messages at all, which marks a raised
/// but unmessaged condition. Codes keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMessages {
	codes: IndexMap<String, Vec<String>>,
}

fn code_or_default(code: Option<&str>) -> &str {
	code.unwrap_or(DEFAULT_ERROR_CODE)
}

impl ErrorMessages {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replace the messages registered under `code` with `message`, or with
	/// nothing when `message` is `None`.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_binding::ErrorMessages;
	///
	/// let mut messages = ErrorMessages::new();
	/// messages.add(Some("first"), None);
	/// messages.set(Some("second"), None);
	/// assert_eq!(messages.get(None), vec!["second"]);
	/// ```
	pub fn set(&mut self, message: Option<&str>, code: Option<&str>) {
		self.clear(code);
		self.add(message, code);
	}

	/// Append `message` under `code`, registering the code if needed.
	pub fn add(&mut self, message: Option<&str>, code: Option<&str>) {
		let entry = self
			.codes
			.entry(code_or_default(code).to_string())
			.or_default();
		if let Some(message) = message {
			entry.push(message.to_string());
		}
	}

	/// With a code, whether that code is registered; without, whether any is.
	pub fn has(&self, code: Option<&str>) -> bool {
		match code {
			Some(code) => self.codes.contains_key(code),
			None => !self.codes.is_empty(),
		}
	}

	/// Messages of one code, or every message in code order.
	pub fn get(&self, code: Option<&str>) -> Vec<&str> {
		match code {
			Some(code) => self
				.codes
				.get(code)
				.map(|messages| messages.iter().map(String::as_str).collect())
				.unwrap_or_default(),
			None => self
				.codes
				.values()
				.flatten()
				.map(String::as_str)
				.collect(),
		}
	}

	pub fn codes(&self) -> Vec<&str> {
		self.codes.keys().map(String::as_str).collect()
	}

	/// Remove one code, or all of them.
	pub fn clear(&mut self, code: Option<&str>) {
		match code {
			Some(code) => {
				self.codes.shift_remove(code);
			}
			None => self.codes.clear(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.codes.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_new_registry_is_empty() {
		let messages = ErrorMessages::new();

		assert!(messages.is_empty());
		assert!(!messages.has(None));
		assert!(messages.get(None).is_empty());
	}

	#[rstest]
	fn test_add_without_message_registers_code() {
		let mut messages = ErrorMessages::new();
		messages.add(None, Some("req"));

		assert!(messages.has(Some("req")));
		assert!(messages.has(None));
		assert!(messages.get(Some("req")).is_empty());
		assert_eq!(messages.codes(), vec!["req"]);
	}

	#[rstest]
	fn test_default_code_sentinel() {
		let mut messages = ErrorMessages::new();
		messages.add(Some("Invalid"), None);

		assert!(messages.has(Some(DEFAULT_ERROR_CODE)));
		assert_eq!(messages.get(Some(DEFAULT_ERROR_CODE)), vec!["Invalid"]);
	}

	#[rstest]
	fn test_get_all_in_code_order() {
		let mut messages = ErrorMessages::new();
		messages.add(Some("b1"), Some("b"));
		messages.add(Some("a1"), Some("a"));
		messages.add(Some("b2"), Some("b"));

		assert_eq!(messages.get(None), vec!["b1", "b2", "a1"]);
		assert_eq!(messages.codes(), vec!["b", "a"]);
	}

	#[rstest]
	fn test_set_replaces_only_its_code() {
		let mut messages = ErrorMessages::new();
		messages.add(Some("one"), Some("x"));
		messages.add(Some("two"), Some("x"));
		messages.add(Some("other"), Some("y"));
		messages.set(Some("three"), Some("x"));

		assert_eq!(messages.get(Some("x")), vec!["three"]);
		assert_eq!(messages.get(Some("y")), vec!["other"]);
	}

	#[rstest]
	fn test_clear_one_and_all() {
		let mut messages = ErrorMessages::new();
		messages.add(Some("one"), Some("x"));
		messages.add(Some("two"), Some("y"));

		messages.clear(Some("x"));
		assert!(!messages.has(Some("x")));
		assert!(messages.has(Some("y")));

		messages.clear(None);
		assert!(messages.is_empty());
	}
}
