//! Word-count validation against a target band
//!
//! The band is widened by 10% on both sides before a correction is
//! triggered: lower bound `floor(min * 0.9)`, upper bound `ceil(max * 1.1)`,
//! both inclusive. Integer arithmetic keeps the bounds exact.

use serde::{Deserialize, Serialize};

use crate::constants::length::{LOWER_TOLERANCE_NUM, TOLERANCE_DEN, UPPER_TOLERANCE_NUM};
use crate::types::Direction;

/// Classification of one word count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthCheck {
    pub valid: bool,
    /// Required correction when invalid
    pub direction: Option<Direction>,
    pub word_count: u32,
    pub lower_bound: u32,
    pub upper_bound: u32,
    pub message: String,
}

/// Inclusive tolerance bounds for a target band
pub fn tolerance_bounds(min_words: u32, max_words: u32) -> (u32, u32) {
    let lower = u64::from(min_words) * u64::from(LOWER_TOLERANCE_NUM) / u64::from(TOLERANCE_DEN);
    let upper = (u64::from(max_words) * u64::from(UPPER_TOLERANCE_NUM) + u64::from(TOLERANCE_DEN)
        - 1)
        / u64::from(TOLERANCE_DEN);

    (
        u32::try_from(lower).unwrap_or(u32::MAX),
        u32::try_from(upper).unwrap_or(u32::MAX),
    )
}

/// Classify `word_count` against `[min_words, max_words]` with tolerance
pub fn validate_length(word_count: u32, min_words: u32, max_words: u32) -> LengthCheck {
    let (lower_bound, upper_bound) = tolerance_bounds(min_words, max_words);

    let (valid, direction, message) = if word_count < lower_bound {
        (
            false,
            Some(Direction::Expand),
            format!(
                "Too short: {} words (target {}-{}, at least {} accepted)",
                word_count, min_words, max_words, lower_bound
            ),
        )
    } else if word_count > upper_bound {
        (
            false,
            Some(Direction::Shorten),
            format!(
                "Too long: {} words (target {}-{}, at most {} accepted)",
                word_count, min_words, max_words, upper_bound
            ),
        )
    } else {
        (
            true,
            None,
            format!(
                "{} words, within target {}-{}",
                word_count, min_words, max_words
            ),
        )
    };

    LengthCheck {
        valid,
        direction,
        word_count,
        lower_bound,
        upper_bound,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bounds_for_default_bands() {
        assert_eq!(tolerance_bounds(300, 500), (270, 550));
        assert_eq!(tolerance_bounds(800, 1200), (720, 1320));
        assert_eq!(tolerance_bounds(1500, 2000), (1350, 2200));
        assert_eq!(tolerance_bounds(2500, 3000), (2250, 3300));
    }

    #[test]
    fn test_rounding_direction() {
        // floor(0.9 * 305) = 274, ceil(1.1 * 505) = 556
        assert_eq!(tolerance_bounds(305, 505), (274, 556));
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        assert!(validate_length(270, 300, 500).valid);
        assert!(validate_length(550, 300, 500).valid);

        let below = validate_length(269, 300, 500);
        assert_eq!(below.direction, Some(Direction::Expand));

        let above = validate_length(551, 300, 500);
        assert_eq!(above.direction, Some(Direction::Shorten));
    }

    #[test]
    fn test_short_article_needs_expansion() {
        let check = validate_length(200, 300, 500);
        assert!(!check.valid);
        assert_eq!(check.direction, Some(Direction::Expand));
        assert!(check.message.contains("Too short"));

        let check = validate_length(420, 300, 500);
        assert!(check.valid);
        assert_eq!(check.direction, None);
    }

    proptest! {
        #[test]
        fn prop_classification_matches_bounds(
            min in 1u32..10_000,
            span in 1u32..10_000,
            w in 0u32..25_000,
        ) {
            let max = min + span;
            let (lower, upper) = tolerance_bounds(min, max);
            let check = validate_length(w, min, max);

            if w < lower {
                prop_assert_eq!(check.direction, Some(Direction::Expand));
            } else if w > upper {
                prop_assert_eq!(check.direction, Some(Direction::Shorten));
            } else {
                prop_assert!(check.valid);
            }
            prop_assert_eq!(check.valid, check.direction.is_none());
        }

        #[test]
        fn prop_bounds_bracket_band(min in 0u32..100_000, span in 0u32..100_000) {
            let max = min + span;
            let (lower, upper) = tolerance_bounds(min, max);
            prop_assert!(lower <= min);
            prop_assert!(upper >= max);
            prop_assert_eq!(lower, min * 9 / 10);
            prop_assert!(u64::from(upper) * 10 >= u64::from(max) * 11);
            prop_assert!((u64::from(upper) * 10) < u64::from(max) * 11 + 10);
        }

        #[test]
        fn prop_revalidation_is_idempotent(w in 0u32..10_000, min in 1u32..5_000, span in 1u32..5_000) {
            let max = min + span;
            prop_assert_eq!(validate_length(w, min, max), validate_length(w, min, max));
        }
    }
}
