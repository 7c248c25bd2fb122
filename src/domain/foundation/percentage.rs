//! Whole-number percentages, used for report completeness.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 0 to 100, rounded down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(u8);

impl Percentage {
    pub const HUNDRED: Self = Self(100);

    /// `part / whole`; `part` is capped at `whole`, and an empty whole is 100%.
    pub fn from_ratio(part: usize, whole: usize) -> Self {
        if whole == 0 {
            return Self::HUNDRED;
        }
        Self((part.min(whole) * 100 / whole) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_down() {
        assert_eq!(Percentage::from_ratio(12, 14).value(), 85);
        assert_eq!(Percentage::from_ratio(1, 14).value(), 7);
        assert_eq!(Percentage::from_ratio(0, 14).value(), 0);
    }

    #[test]
    fn caps_at_hundred() {
        assert_eq!(Percentage::from_ratio(14, 14), Percentage::HUNDRED);
        assert_eq!(Percentage::from_ratio(20, 14), Percentage::HUNDRED);
    }

    #[test]
    fn empty_whole_is_complete() {
        assert_eq!(Percentage::from_ratio(0, 0), Percentage::HUNDRED);
    }

    #[test]
    fn displays_with_percent_sign() {
        assert_eq!(Percentage::from_ratio(3, 4).to_string(), "75%");
    }
}
