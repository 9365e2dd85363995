use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::frame::present;

pub const CONSISTENCY_COLUMN: &str = "Item No. Consistency";

/// Whether every known regional item number for a product/color agrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Consistency {
    Match,
    Mismatch,
}

impl Consistency {
    /// Absent values are ignored; two or more distinct present values mismatch.
    pub fn classify<'a, I>(values: I) -> Consistency
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut first: Option<&str> = None;
        for value in values.into_iter().flatten().filter_map(present) {
            match first {
                None => first = Some(value),
                Some(seen) if seen != value => return Consistency::Mismatch,
                Some(_) => {}
            }
        }
        Consistency::Match
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Consistency::Match => "Match",
            Consistency::Mismatch => "Mismatch",
        }
    }
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Consistency {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "match" => Ok(Consistency::Match),
            "mismatch" => Ok(Consistency::Mismatch),
            other => Err(format!("Unknown consistency value '{other}'")),
        }
    }
}
