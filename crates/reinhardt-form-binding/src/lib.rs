//! Nested form data binding for Reinhardt
//!
//! This crate binds request data with bracket-notation field names
//! (`user[address][city]`) to a tree of elements:
//! - Lazy child materialization with stable per-field state
//! - Reconciliation of submitted values with declared defaults
//! - Scalar/composite type tracking with atomic conflict detection
//! - Per-field error messages grouped by error code
//! - Export as resolved values, hidden inputs or a query string
//! - Small HTML control helpers over resolved values
//!
//! # Example
//!
//! ```
//! use reinhardt_form_binding::prelude::*;
//! use serde_json::json;
//!
//! let mut form = Form::from_query_string(
//!     "login%5Busername%5D=&login%5Bpassword%5D=ab",
//!     "login",
//! )
//! .unwrap();
//! form.set_defaults(json!({"remember": 0})).unwrap();
//!
//! let username = form.child("username").unwrap();
//! if username.as_string().unwrap().is_empty() {
//!     username.add_error("Username is required", "required");
//! }
//!
//! assert!(form.contains_errors("required"));
//! assert_eq!(
//!     form.serialize_query().unwrap(),
//!     "login%5Bremember%5D=0&login%5Busername%5D=&login%5Bpassword%5D=ab"
//! );
//! ```

pub mod container;
pub mod context;
pub mod element;
pub mod error;
pub mod form;
pub mod messages;
pub mod render;
pub mod settings;
pub mod value;

pub use container::{Children, ChildrenMut, Container};
pub use element::Element;
pub use error::{BindingError, BindingResult};
pub use form::Form;
pub use messages::{DEFAULT_ERROR_CODE, ErrorMessages};
pub use settings::FormSettings;
pub use value::{ValueKind, ValueType};

/// Types needed by most callers.
pub mod prelude {
	pub use crate::container::Container;
	pub use crate::element::Element;
	pub use crate::error::{BindingError, BindingResult};
	pub use crate::form::Form;
	pub use crate::settings::FormSettings;
}
