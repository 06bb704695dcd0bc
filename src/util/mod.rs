//! Utility functions shared by the client and the terminal UI.
//!
//! - **Text**: control-character stripping, width-aware truncation and wrapping
//! - **URLs**: endpoint validation and checks before handing a URL to the OS

mod text;
mod url_validator;

pub use text::{sanitize, truncate_to_width, wrap_to_width};
pub use url_validator::{validate_endpoint, validate_url_for_open, UrlValidationError};
