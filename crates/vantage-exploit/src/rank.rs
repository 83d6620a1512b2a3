//! Module reliability ranks and their ordering.
//!
//! Catalog entries carry either a rank label or the framework's numeric
//! rank. Labels order from most to least reliable; anything unrecognized
//! sorts last.

use std::fmt;

/// Order assigned to labels that are not a known rank.
pub const UNKNOWN_RANK_ORDER: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Excellent,
    Great,
    Good,
    Normal,
    Average,
    Low,
    Manual,
}

impl Rank {
    /// Parse a label, ignoring case and surrounding whitespace.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "excellent" => Some(Self::Excellent),
            "great" => Some(Self::Great),
            "good" => Some(Self::Good),
            "normal" => Some(Self::Normal),
            "average" => Some(Self::Average),
            "low" => Some(Self::Low),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }

    /// Map a numeric framework rank (600 down to 0 in steps of 100).
    pub fn from_numeric(value: i64) -> Option<Self> {
        match value {
            600 => Some(Self::Excellent),
            500 => Some(Self::Great),
            400 => Some(Self::Good),
            300 => Some(Self::Normal),
            200 => Some(Self::Average),
            100 => Some(Self::Low),
            0 => Some(Self::Manual),
            _ => None,
        }
    }

    /// Sort position, 1 for excellent through 7 for manual.
    pub fn order(self) -> u8 {
        match self {
            Self::Excellent => 1,
            Self::Great => 2,
            Self::Good => 3,
            Self::Normal => 4,
            Self::Average => 5,
            Self::Low => 6,
            Self::Manual => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Great => "great",
            Self::Good => "good",
            Self::Normal => "normal",
            Self::Average => "average",
            Self::Low => "low",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort position of an arbitrary rank label.
pub fn rank_order(label: &str) -> u8 {
    Rank::parse(label)
        .map(Rank::order)
        .unwrap_or(UNKNOWN_RANK_ORDER)
}
