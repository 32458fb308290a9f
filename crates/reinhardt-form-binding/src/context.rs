//! Bracket-path parsing and request data extraction
//!
//! Field names such as `user[address][city]` describe a path into nested
//! submission data. This module splits such paths, resolves a form's data
//! context inside a larger submission, and decodes
//! `application/x-www-form-urlencoded` input into nested mappings. The
//! request data itself is always passed in by the caller.

use crate::error::BindingResult;
use crate::value::{self, is_index_key};
use serde_json::{Map, Value};

/// Split a bracket path into its segments.
///
/// Empty brackets produce empty segments; anything after an unterminated
/// bracket is ignored.
///
/// # Examples
///
/// ```
/// use reinhardt_form_binding::context::parse_path;
///
/// assert_eq!(parse_path("foo[bar][baz]"), vec!["foo", "bar", "baz"]);
/// assert_eq!(parse_path("tags[]"), vec!["tags", ""]);
/// assert_eq!(parse_path("plain"), vec!["plain"]);
/// assert!(parse_path("").is_empty());
/// ```
pub fn parse_path(path: &str) -> Vec<String> {
	if path.is_empty() {
		return Vec::new();
	}
	let Some(open) = path.find('[') else {
		return vec![path.to_string()];
	};

	let mut segments = vec![path[..open].to_string()];
	let mut rest = &path[open..];
	while let Some(inner) = rest.strip_prefix('[') {
		let Some(close) = inner.find(']') else {
			break;
		};
		segments.push(inner[..close].to_string());
		rest = &inner[close + 1..];
	}
	segments
}

/// Descend into `submission` along the bracket path `context`.
///
/// An empty context yields the whole submission. A missing segment, or a
/// scalar where a mapping is expected, yields an empty mapping.
///
/// # Examples
///
/// ```
/// use reinhardt_form_binding::context::resolve_context;
/// use serde_json::json;
///
/// let submission = json!({"foo": {"bar": {"baz": {"username": "joe"}}}});
///
/// assert_eq!(resolve_context(&submission, "foo[bar][baz]"), json!({"username": "joe"}));
/// assert_eq!(resolve_context(&submission, "foo[nope]"), json!({}));
/// ```
pub fn resolve_context(submission: &Value, context: &str) -> Value {
	let mut current = value::normalize(submission.clone());
	for segment in parse_path(context) {
		match current {
			Value::Object(mut map) => match map.remove(&segment) {
				Some(next) => current = next,
				None => return Value::Object(Map::new()),
			},
			_ => return Value::Object(Map::new()),
		}
	}
	match current {
		Value::Object(_) => current,
		_ => Value::Object(Map::new()),
	}
}

/// Decode a urlencoded string into a nested mapping, honouring bracket
/// names. `name[]` appends at the next free index; a later value for the
/// same name wins.
///
/// # Examples
///
/// ```
/// use reinhardt_form_binding::context::parse_query_string;
/// use serde_json::json;
///
/// let value = parse_query_string("user%5Bname%5D=joe&subs[]=a&subs[]=b&remember=1").unwrap();
/// assert_eq!(
///     value,
///     json!({"user": {"name": "joe"}, "subs": {"0": "a", "1": "b"}, "remember": "1"})
/// );
/// ```
pub fn parse_query_string(raw: &str) -> BindingResult<Value> {
	let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw)?;
	let mut root = Map::new();
	for (name, value) in pairs {
		let segments = parse_path(&name);
		match segments.first() {
			Some(head) if !head.is_empty() => insert_path(&mut root, &segments, Value::String(value)),
			_ => tracing::debug!(name = %name, "skipping query parameter without a name"),
		}
	}
	Ok(Value::Object(root))
}

/// The slot `name[]` appends to, or `None` once the largest index is taken.
fn next_index(map: &Map<String, Value>) -> Option<String> {
	let next = match map
		.keys()
		.filter(|key| is_index_key(key))
		.filter_map(|key| key.parse::<i64>().ok())
		.filter(|index| *index >= 0)
		.max()
	{
		Some(max) => max.checked_add(1)?,
		None => 0,
	};
	Some(next.to_string())
}

fn insert_path(map: &mut Map<String, Value>, segments: &[String], value: Value) {
	let Some((head, rest)) = segments.split_first() else {
		return;
	};
	let key = if head.is_empty() {
		match next_index(map) {
			Some(key) => key,
			None => {
				tracing::debug!("skipping query parameter appended past the largest index");
				return;
			}
		}
	} else {
		head.clone()
	};
	if rest.is_empty() {
		map.insert(key, value);
		return;
	}
	let slot = map.entry(key).or_insert_with(|| Value::Object(Map::new()));
	if !slot.is_object() {
		*slot = Value::Object(Map::new());
	}
	if let Value::Object(inner) = slot {
		insert_path(inner, rest, value);
	}
}
