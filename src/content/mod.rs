//! Content measurement: word counting and length validation.

mod length;
mod word_count;

pub use length::{LengthCheck, tolerance_bounds, validate_length};
pub use word_count::{count_words, plain_text};
