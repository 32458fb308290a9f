use crate::value::ValueKind;

/// Errors raised while binding data to an element tree.
///
/// Validation problems are not represented here: they are attached to the
/// tree itself through the [`Container`](crate::Container) error API.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
	/// An element fixed as scalar was asked to hold a composite value, or the
	/// other way round.
	#[error("Type conflict at '{name}': element is {expected}, cannot hold a {found} value")]
	TypeConflict {
		name: String,
		expected: ValueKind,
		found: ValueKind,
	},
	/// A composite value was requested where only a scalar can be rendered.
	#[error("Non-scalar value encountered for element '{name}'")]
	NonScalar { name: String },
	#[error("Query string encoding failed: {0}")]
	Query(#[from] serde_urlencoded::ser::Error),
	#[error("Query string decoding failed: {0}")]
	QueryDecode(#[from] serde_urlencoded::de::Error),
}

pub type BindingResult<T> = Result<T, BindingError>;

impl BindingError {
	pub(crate) fn type_conflict(name: impl Into<String>, expected: ValueKind, found: ValueKind) -> Self {
		let name = name.into();
		tracing::warn!(name = %name, %expected, %found, "rejected type-conflicting assignment");
		Self::TypeConflict {
			name,
			expected,
			found,
		}
	}

	/// Returns `true` for [`BindingError::TypeConflict`].
	pub fn is_type_conflict(&self) -> bool {
		matches!(self, Self::TypeConflict { .. })
	}
}
