//! HTML control helpers over resolved element values
//!
//! These are thin templates around an element's name, identifier and
//! effective value. Every attribute value is escaped with
//! [`escape_attribute`]; the free-form `attributes` argument is emitted as
//! given.

use crate::container::Container;
use crate::element::Element;
use crate::error::BindingResult;

/// Escape a string for use inside a double-quoted HTML attribute.
///
/// # Examples
///
/// ```
/// use reinhardt_form_binding::render::escape_attribute;
///
/// assert_eq!(escape_attribute(r#"a<b>&"c""#), "a&lt;b&gt;&amp;&quot;c&quot;");
/// ```
pub fn escape_attribute(s: &str) -> String {
	let mut escaped = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#x27;"),
			_ => escaped.push(c),
		}
	}
	escaped
}

pub(crate) fn hidden_input(name: &str, value: &str) -> String {
	format!(
		"<input type=\"hidden\" name=\"{}\" value=\"{}\">",
		escape_attribute(name),
		escape_attribute(value)
	)
}

fn extra(attributes: &str) -> String {
	let attributes = attributes.trim();
	if attributes.is_empty() {
		String::new()
	} else {
		format!(" {}", attributes)
	}
}

fn flag(set: bool, attribute: &str) -> &str {
	if set { attribute } else { "" }
}

/// `text` when the container has errors (of `code`, or of any code).
///
/// Useful for conditional CSS classes.
///
/// # Examples
///
/// ```
/// use reinhardt_form_binding::render::if_errors;
/// use reinhardt_form_binding::{Container, Element};
///
/// let mut field = Element::new("email");
/// assert_eq!(if_errors(&field, "class=\"error\"", None), "");
///
/// field.add_error("Invalid address", None);
/// assert_eq!(if_errors(&field, "class=\"error\"", None), "class=\"error\"");
/// ```
pub fn if_errors<'a, C: Container>(container: &C, text: &'a str, code: Option<&str>) -> &'a str {
	if container.has_errors(code) { text } else { "" }
}

impl Element {
	fn id_attribute(&self, suffix: &str) -> String {
		escape_attribute(&self.identifier("", suffix))
	}

	/// `<input type="text">` carrying the effective value.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_binding::Element;
	/// use serde_json::json;
	///
	/// let name = Element::with_values("user[name]", json!("Joe"), json!(null)).unwrap();
	/// assert_eq!(
	///     name.input("").unwrap(),
	///     r#"<input type="text" id="user-name" name="user[name]" value="Joe">"#
	/// );
	/// ```
	pub fn input(&self, attributes: &str) -> BindingResult<String> {
		Ok(format!(
			"<input type=\"text\" id=\"{}\" name=\"{}\" value=\"{}\"{}>",
			self.id_attribute(""),
			escape_attribute(&self.html_name()),
			escape_attribute(&self.as_string()?),
			extra(attributes)
		))
	}

	/// `<input type="password">`; the value is never echoed back.
	pub fn password(&self, attributes: &str) -> String {
		format!(
			"<input type=\"password\" id=\"{}\" name=\"{}\"{}>",
			self.id_attribute(""),
			escape_attribute(&self.html_name()),
			extra(attributes)
		)
	}

	pub fn textarea(&self, attributes: &str) -> BindingResult<String> {
		Ok(format!(
			"<textarea id=\"{}\" name=\"{}\"{}>{}</textarea>",
			self.id_attribute(""),
			escape_attribute(&self.html_name()),
			extra(attributes),
			escape_attribute(&self.as_string()?)
		))
	}

	/// Checkbox for `value`, checked when the effective value is or contains it.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_form_binding::Element;
	/// use serde_json::json;
	///
	/// let subs = Element::with_values("subs", json!(["list2"]), json!(null)).unwrap();
	/// assert_eq!(
	///     subs.checkbox("list2", ""),
	///     r#"<input type="checkbox" id="subs-list2" name="subs[]" value="list2" checked>"#
	/// );
	/// ```
	pub fn checkbox(&self, value: &str, attributes: &str) -> String {
		self.choice_input("checkbox", value, attributes)
	}

	pub fn radio(&self, value: &str, attributes: &str) -> String {
		self.choice_input("radio", value, attributes)
	}

	fn choice_input(&self, kind: &str, value: &str, attributes: &str) -> String {
		format!(
			"<input type=\"{}\" id=\"{}\" name=\"{}\" value=\"{}\"{}{}>",
			kind,
			self.id_attribute(&format!("-{}", value)),
			escape_attribute(&self.html_name()),
			escape_attribute(value),
			flag(self.matches_any(value), " checked"),
			extra(attributes)
		)
	}

	/// `<select>` over `(value, label)` options, selecting every option the
	/// effective value matches.
	pub fn select(&self, options: &[(&str, &str)], attributes: &str) -> String {
		let options: Vec<String> = options
			.iter()
			.map(|(value, label)| {
				format!(
					"<option id=\"{}\" value=\"{}\"{}>{}</option>",
					self.id_attribute(&format!("-{}", value)),
					escape_attribute(value),
					flag(self.matches_any(*value), " selected"),
					escape_attribute(label)
				)
			})
			.collect();
		format!(
			"<select id=\"{}\" name=\"{}\"{}>{}</select>",
			self.id_attribute(""),
			escape_attribute(&self.html_name()),
			extra(attributes),
			options.join("\n")
		)
	}

	pub fn submit(&self, label: &str, attributes: &str) -> String {
		format!(
			"<input type=\"submit\" id=\"{}\" name=\"{}\" value=\"{}\"{}>",
			self.id_attribute(""),
			escape_attribute(&self.html_name()),
			escape_attribute(label),
			extra(attributes)
		)
	}
}
