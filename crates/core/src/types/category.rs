//! Product category enum.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the two product lines, each backed by an independent remote source.
///
/// Apparel products arrive through the signal feed (fetch on change
/// notification); prints arrive through the snapshot feed (full collection
/// push). That wiring lives in the catalog crate; the type itself carries no
/// transport knowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Apparel,
    Prints,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Self; 2] = [Self::Apparel, Self::Prints];

    /// The lowercase wire/storage name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Apparel => "apparel",
            Self::Prints => "prints",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Error)]
#[error("unknown category: {0}")]
pub struct ParseCategoryError(String);

impl std::str::FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "apparel" => Ok(Self::Apparel),
            "prints" => Ok(Self::Prints),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}
