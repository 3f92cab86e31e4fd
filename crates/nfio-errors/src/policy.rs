//! Reserved-range classification.

use serde::{Deserialize, Serialize};

use crate::codes::RESERVED_BASE;

/// How an error code is compared against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeMode {
    /// `code > threshold`
    #[default]
    Signed,
    /// `|code| > threshold`; negative codes index by magnitude.
    Absolute,
}

impl std::str::FromStr for RangeMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("signed") {
            Ok(RangeMode::Signed)
        } else if s.eq_ignore_ascii_case("absolute") || s.eq_ignore_ascii_case("abs") {
            Ok(RangeMode::Absolute)
        } else {
            Err(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Handled locally; `index` is `code - threshold` and may exceed the table.
    Reserved { index: usize },
    PassThrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePolicy {
    pub threshold: i32,
    pub mode: RangeMode,
}

impl RangePolicy {
    pub const fn new(threshold: i32, mode: RangeMode) -> Self {
        Self { threshold, mode }
    }

    pub fn classify(&self, code: i32) -> Classification {
        let magnitude = match self.mode {
            RangeMode::Signed => i64::from(code),
            RangeMode::Absolute => i64::from(code.unsigned_abs()),
        };
        let threshold = i64::from(self.threshold);
        if magnitude > threshold {
            Classification::Reserved {
                index: (magnitude - threshold) as usize,
            }
        } else {
            Classification::PassThrough
        }
    }

    pub fn is_reserved(&self, code: i32) -> bool {
        matches!(self.classify(code), Classification::Reserved { .. })
    }
}

impl Default for RangePolicy {
    fn default() -> Self {
        Self::new(RESERVED_BASE, RangeMode::Signed)
    }
}
