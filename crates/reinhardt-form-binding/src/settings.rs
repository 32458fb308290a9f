//! Form binding configuration

use serde::{Deserialize, Serialize};

/// Settings shared by a form and every element in its tree.
///
/// All fields have defaults, so a partial configuration source deserializes
/// cleanly.
///
/// # Examples
///
/// ```
/// use reinhardt_form_binding::FormSettings;
///
/// let settings: FormSettings = serde_json::from_str(r#"{"hidden_separator": ""}"#).unwrap();
/// assert_eq!(settings.hidden_separator, "");
/// assert_eq!(settings.identifier_separator, "-");
/// assert!(settings.replace_indexed_defaults);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSettings {
	/// Joins the hidden-field tokens of a serialized tree.
	pub hidden_separator: String,
	/// Replaces runs of non-alphanumeric characters in derived identifiers.
	pub identifier_separator: String,
	/// Drop default list slots (index keys) that a submission does not carry.
	/// Turning this off reconciles with a plain recursive merge.
	pub replace_indexed_defaults: bool,
}

impl Default for FormSettings {
	fn default() -> Self {
		Self {
			hidden_separator: "\n".to_string(),
			identifier_separator: "-".to_string(),
			replace_indexed_defaults: true,
		}
	}
}

impl FormSettings {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_hidden_separator(mut self, separator: impl Into<String>) -> Self {
		self.hidden_separator = separator.into();
		self
	}

	pub fn with_identifier_separator(mut self, separator: impl Into<String>) -> Self {
		self.identifier_separator = separator.into();
		self
	}

	pub fn with_replace_indexed_defaults(mut self, replace: bool) -> Self {
		self.replace_indexed_defaults = replace;
		self
	}
}
