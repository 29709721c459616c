use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::RegionError;

/// Strand of a genomic feature.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strand {
    #[default]
    Plus,
    Minus,
}

impl Strand {
    pub fn is_plus(&self) -> bool {
        matches!(self, Strand::Plus)
    }

    pub fn is_minus(&self) -> bool {
        matches!(self, Strand::Minus)
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
        }
    }
}

impl FromStr for Strand {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" | "1" | "+1" => Ok(Strand::Plus),
            "-" | "-1" => Ok(Strand::Minus),
            _ => Err(RegionError::InvalidStrand(s.to_string())),
        }
    }
}
