//! Typed fragments extracted from a free-text daily log

use crate::{OstomateError, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Extraction confidence levels used by the local pass
pub mod confidence {
    /// Grounded against a known food or an explicit keyword with qualifiers
    pub const HIGH: f32 = 0.9;
    /// Keyword hit without supporting context
    pub const MEDIUM: f32 = 0.6;
    /// Weak signal; flag for user review
    pub const LOW: f32 = 0.3;
}

/// Meal slot of a food entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    /// Breakfast
    Breakfast,
    /// Lunch
    Lunch,
    /// Dinner
    Dinner,
    /// Snack
    Snack,
    /// Drink
    Drink,
}

impl MealSlot {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
            MealSlot::Snack => "snack",
            MealSlot::Drink => "drink",
        }
    }

    /// Slot implied by the hour of day
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=10 => MealSlot::Breakfast,
            11..=15 => MealSlot::Lunch,
            16..=20 => MealSlot::Dinner,
            _ => MealSlot::Snack,
        }
    }
}

/// Category of a parsed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntryCategory {
    /// Something eaten or drunk, with its slot
    Meal(MealSlot),
    /// A symptom
    Symptom,
    /// Stoma output or pouch event
    Output,
    /// Irrigation session
    Irrigation,
    /// Medication taken
    Medication,
}

impl EntryCategory {
    /// Lowercase name; meal categories use the slot name
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryCategory::Meal(slot) => slot.as_str(),
            EntryCategory::Symptom => "symptom",
            EntryCategory::Output => "output",
            EntryCategory::Irrigation => "irrigation",
            EntryCategory::Medication => "medication",
        }
    }

    /// Whether this is a meal-slot category
    pub fn is_meal(&self) -> bool {
        matches!(self, EntryCategory::Meal(_))
    }
}

impl fmt::Display for EntryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryCategory {
    type Err = OstomateError;

    fn from_str(s: &str) -> Result<Self> {
        let category = match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "breakfast" => EntryCategory::Meal(MealSlot::Breakfast),
            "lunch" => EntryCategory::Meal(MealSlot::Lunch),
            "dinner" | "supper" => EntryCategory::Meal(MealSlot::Dinner),
            "snack" | "snacks" => EntryCategory::Meal(MealSlot::Snack),
            "drink" | "drinks" | "beverage" => EntryCategory::Meal(MealSlot::Drink),
            "symptom" | "symptoms" => EntryCategory::Symptom,
            "output" | "outputs" | "bowel_movement" | "stoma_output" => EntryCategory::Output,
            "irrigation" => EntryCategory::Irrigation,
            "medication" | "medications" | "meds" => EntryCategory::Medication,
            other => {
                return Err(OstomateError::validation(format!(
                    "Unknown entry category '{}'",
                    other
                )))
            }
        };
        Ok(category)
    }
}

impl TryFrom<String> for EntryCategory {
    type Error = OstomateError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<EntryCategory> for String {
    fn from(value: EntryCategory) -> Self {
        value.as_str().to_string()
    }
}

/// One typed fragment of a daily log description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedLogEntry {
    /// Entry id, unique per extraction
    pub id: Uuid,
    /// Category
    pub category: EntryCategory,
    /// Short human-readable description
    pub description: String,
    /// When it happened
    pub timestamp: DateTime<FixedOffset>,
    /// Extraction certainty in [0, 1]; UI triage only
    pub confidence: f32,
    /// Category-specific details (foods, severity, consistency, ...)
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl ParsedLogEntry {
    /// Create an entry; confidence is clamped into [0, 1]
    pub fn new(
        category: EntryCategory,
        description: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
        confidence: f32,
    ) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            id: Uuid::new_v4(),
            category,
            description: description.into(),
            timestamp,
            confidence,
            details: serde_json::Map::new(),
        }
    }

    /// Add a detail value
    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Whether the entry should be flagged for user review
    pub fn needs_review(&self) -> bool {
        self.confidence < confidence::MEDIUM
    }
}
