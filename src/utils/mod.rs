pub mod text;

pub use text::{camel_to_kebab, escape_attr, escape_text, truncate_with_ellipsis};
