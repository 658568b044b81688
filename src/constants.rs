//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Word-count tolerance band
pub mod length {
    /// Lower bound is `floor(min_words * 9 / 10)`
    pub const LOWER_TOLERANCE_NUM: u32 = 9;
    /// Upper bound is `ceil(max_words * 11 / 10)`
    pub const UPPER_TOLERANCE_NUM: u32 = 11;
    /// Shared denominator for both tolerance ratios
    pub const TOLERANCE_DEN: u32 = 10;
}

/// Correction loop constants
pub mod correction {
    /// Hard ceiling for correction attempts per run
    pub const MAX_CORRECTIONS_LIMIT: u8 = 3;

    /// Default correction budget
    pub const DEFAULT_MAX_CORRECTIONS: u8 = 2;
}

/// Model defaults and quirks
pub mod models {
    /// Model families that only accept the provider default temperature
    pub const REASONING_MODEL_PREFIXES: &[&str] = &["gpt-5", "o1", "o3", "o4"];

    /// How the provider default temperature is shown in debug output
    pub const DEFAULT_TEMPERATURE_LABEL: &str = "1 (default)";

    /// Model used when a prompt template leaves it empty
    pub const DEFAULT_MODEL: &str = "gpt-5-mini";

    /// Temperature used when a prompt template leaves it empty
    pub const DEFAULT_TEMPERATURE: f32 = 0.2;
}

/// Prompt store constants
pub mod prompts {
    /// Cache entry lifetime for prompt lookups (24 hours)
    pub const CACHE_TTL_SECS: u64 = 86_400;

    pub const SYSTEM_POST_GENERATION: &str = "system-post-generation";
    pub const SYSTEM_CORRECTION: &str = "system-correction";
    pub const POST_GENERATION: &str = "post-generation";
    pub const CORRECTION_EXPAND: &str = "correction-expand";
    pub const CORRECTION_SHORTEN: &str = "correction-shorten";
    pub const IMAGE_GENERATION: &str = "image-generation";

    /// Slugs that must resolve before a generation run
    pub const REQUIRED_SLUGS: &[&str] = &[
        SYSTEM_POST_GENERATION,
        SYSTEM_CORRECTION,
        POST_GENERATION,
        CORRECTION_EXPAND,
        CORRECTION_SHORTEN,
        IMAGE_GENERATION,
    ];
}

/// Featured image constants
pub mod image {
    pub const DEFAULT_MODEL: &str = "gpt-image-1";
    pub const DEFAULT_SIZE: &str = "1024x1024";

    /// Images per request are clamped to 1..=MAX_IMAGES
    pub const MAX_IMAGES: u8 = 4;
}

/// HTTP/Network constants
pub mod network {
    pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

    /// Default request timeout (seconds). Long articles take minutes.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;
}

/// Log and display truncation
pub mod display {
    /// Characters of a raw body or content kept in logs and debug records
    pub const BODY_EXCERPT_CHARS: usize = 600;

    /// Characters of plain text shown as a content preview
    pub const PREVIEW_CHARS: usize = 500;
}
