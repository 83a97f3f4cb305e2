//! Daily picks payload types.
//!
//! The picks record is a singleton: one key, fully overwritten on every
//! write, no merge and no history. The internal store endpoint persists
//! the submitted JSON verbatim, so these types are only used on the read
//! side. Every field defaults so a payload with extra, missing, or oddly
//! shaped nested fields still renders as much as possible.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The day's curated picks, grouped by meal slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPicks {
    /// Human-readable date label (e.g. "Friday, August 29").
    #[serde(default)]
    pub date_str: String,
    /// Meal slot name (breakfast, lunch, ...) to its picks.
    #[serde(default)]
    pub meals: BTreeMap<String, MealSlot>,
    /// Eatery name to location string.
    #[serde(default)]
    pub location_map: BTreeMap<String, String>,
}

/// The picks for a single meal slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealSlot {
    /// Ordered picks, best first.
    #[serde(default)]
    pub picks: Vec<EateryPicks>,
}

/// One eatery's picked dishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EateryPicks {
    /// Eatery name, used to look up the location in
    /// [`DailyPicks::location_map`].
    #[serde(default)]
    pub eatery: String,
    /// Ordered dish names.
    #[serde(default)]
    pub dishes: Vec<String>,
}

impl DailyPicks {
    /// Look up the location for an eatery, if the payload carried one.
    #[must_use]
    pub fn location_of(&self, eatery: &str) -> Option<&str> {
        self.location_map.get(eatery).map(String::as_str)
    }
}
