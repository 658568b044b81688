//! AI Response Validation
//!
//! Boundary checks for model output:
//! - JSON object extraction from responses with surrounding prose
//! - Code fence stripping for plain-text corrections
//! - Typed validation of the generated post payload
//!
//! Structural errors fail fast as `ForgeError::Parse`.

mod json_extract;
mod post;

pub use json_extract::{excerpt, extract_json_object, strip_code_fences};
pub use post::GeneratedPost;
