//! # Matching Module - Whitespace-Insensitive Prefix Matching
//!
//! Measures how much of the target the learner has reproduced. Only non-whitespace
//! characters are compared, in order, from the start of both texts. Comparison stops at
//! the first mismatch: correct characters beyond it do not count, the target has to be
//! reproduced left to right.
//!
//! ```rust
//! use stylus::matching::compute_match;
//! use stylus::target::Target;
//!
//! let target = Target::new("x = 1");
//! let state = compute_match("x=1", target.stripped());
//!
//! assert_eq!(state.matched_chars, 3);
//! assert!(state.completed);
//! ```

use crate::metrics;
use crate::target::Target;

/// How much of the target has been reproduced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchState {
    /// Length of the matched non-whitespace prefix
    pub matched_chars: usize,
    /// Number of non-whitespace characters in the target
    pub total_chars: usize,
    /// True once the whole target is matched. Never true for an empty target.
    pub completed: bool,
}

impl MatchState {
    pub fn new(matched_chars: usize, total_chars: usize) -> Self {
        Self {
            matched_chars,
            total_chars,
            completed: matched_chars >= total_chars && total_chars > 0,
        }
    }

    /// Matched share of the target in percent (`0.0` for an empty target)
    pub fn percentage(&self) -> f64 {
        if self.total_chars == 0 {
            return 0.0;
        }

        (self.matched_chars as f64 / self.total_chars as f64) * 100.0
    }
}

/// Compare a learner's text against a stripped target
///
/// Total over all inputs. Excess input past the end of the target is not penalized.
pub fn compute_match(user_text: &str, target_stripped: &[char]) -> MatchState {
    let matched_chars = user_text
        .chars()
        .filter(|char| !metrics::is_ignorable(*char))
        .zip(target_stripped)
        .take_while(|(typed, expected)| typed == *expected)
        .count();

    MatchState::new(matched_chars, target_stripped.len())
}

impl Target {
    /// Match a learner's text against this target
    pub fn compute_match(&self, user_text: &str) -> MatchState {
        compute_match(user_text, self.stripped())
    }
}
