//! Allow-list cleaner for markup and styles supplied by embedded scripts.
//!
//! The lists in [`policy`] are the security boundary. Everything not named
//! there is dropped or unwrapped; nothing is inferred.

pub mod css;
pub mod html;
pub mod policy;

pub use css::{is_safe_style_value, sanitize_style_attr, sanitize_style_object};
pub use html::{is_safe_url, sanitize};
