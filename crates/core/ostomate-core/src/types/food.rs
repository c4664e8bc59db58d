//! Canonical food record shared by every provider

use crate::{OstomateError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Identifies where a food record came from.
///
/// Variant order is the deduplication priority: when two providers return a
/// food with the same normalized name, the earlier variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Crowd-sourced product database (Open Food Facts)
    Crowd,
    /// Hand-authored curated dataset shipped with the crate
    Local,
    /// Government nutrition database (USDA FoodData Central)
    Government,
    /// Premium ingredient database (Spoonacular)
    Premium,
}

impl ProviderId {
    /// All providers in priority order
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Crowd,
        ProviderId::Local,
        ProviderId::Government,
        ProviderId::Premium,
    ];

    /// Stable lowercase name, also used as the id prefix of records
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Crowd => "crowd",
            ProviderId::Local => "local",
            ProviderId::Government => "government",
            ProviderId::Premium => "premium",
        }
    }

    /// Position in the deduplication priority order (lower wins)
    pub fn priority(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = OstomateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "crowd" | "openfoodfacts" | "off" => Ok(ProviderId::Crowd),
            "local" | "curated" => Ok(ProviderId::Local),
            "government" | "usda" | "fdc" => Ok(ProviderId::Government),
            "premium" | "spoonacular" => Ok(ProviderId::Premium),
            other => Err(OstomateError::validation(format!(
                "Unknown provider '{}'",
                other
            ))),
        }
    }
}

/// A set of providers, iterated in priority order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSet(BTreeSet<ProviderId>);

impl ProviderSet {
    /// No providers
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Every provider
    pub fn all() -> Self {
        Self(ProviderId::ALL.into_iter().collect())
    }

    /// A single provider
    pub fn only(id: ProviderId) -> Self {
        Self(std::iter::once(id).collect())
    }

    /// Add a provider
    pub fn insert(&mut self, id: ProviderId) {
        self.0.insert(id);
    }

    /// Whether the provider is in the set
    pub fn contains(&self, id: ProviderId) -> bool {
        self.0.contains(&id)
    }

    /// Number of providers
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Providers in priority order
    pub fn iter(&self) -> impl Iterator<Item = ProviderId> + '_ {
        self.0.iter().copied()
    }

    /// Providers present in both sets
    pub fn intersection(&self, other: &ProviderSet) -> ProviderSet {
        Self(self.0.intersection(&other.0).copied().collect())
    }
}

impl FromIterator<ProviderId> for ProviderSet {
    fn from_iter<I: IntoIterator<Item = ProviderId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Nutrients tracked per 100 g
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    /// Energy, kcal
    Calories,
    /// Protein, g
    Protein,
    /// Carbohydrates, g
    Carbs,
    /// Total fat, g
    Fat,
    /// Dietary fiber, g
    Fiber,
    /// Total sugars, g
    Sugar,
    /// Sodium, mg
    Sodium,
}

/// Partial nutrient table; absent nutrients are simply unknown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NutritionPer100g(BTreeMap<Nutrient, f64>);

impl NutritionPer100g {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value; non-finite and negative values are dropped
    pub fn set(&mut self, nutrient: Nutrient, value: f64) {
        if value.is_finite() && value >= 0.0 {
            self.0.insert(nutrient, value);
        }
    }

    /// Builder-style [`set`](Self::set)
    pub fn with(mut self, nutrient: Nutrient, value: f64) -> Self {
        self.set(nutrient, value);
        self
    }

    /// Record a value when one is present
    pub fn set_opt(&mut self, nutrient: Nutrient, value: Option<f64>) {
        if let Some(v) = value {
            self.set(nutrient, v);
        }
    }

    /// Look up a nutrient
    pub fn get(&self, nutrient: Nutrient) -> Option<f64> {
        self.0.get(&nutrient).copied()
    }

    /// Whether nothing is known
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of known nutrients
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// A reconciled food or product, independent of the provider that supplied it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    /// Provider-qualified id, e.g. `crowd:3017620422003`
    pub id: String,
    /// Display name
    pub name: String,
    /// Brand or manufacturer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Ingredients in label order
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// Declared allergens
    #[serde(default)]
    pub allergens: BTreeSet<String>,
    /// Nutrition per 100 g
    #[serde(default)]
    pub nutrition: NutritionPer100g,
    /// Category labels
    #[serde(default)]
    pub categories: BTreeSet<String>,
    /// Provider that produced this record
    pub source: ProviderId,
    /// EAN/UPC barcode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    /// Product image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl FoodRecord {
    /// Create a record with a provider-qualified id and no optional data
    pub fn new(source: ProviderId, source_id: impl fmt::Display, name: impl Into<String>) -> Self {
        Self {
            id: format!("{}:{}", source, source_id),
            name: name.into(),
            brand: None,
            ingredients: Vec::new(),
            allergens: BTreeSet::new(),
            nutrition: NutritionPer100g::new(),
            categories: BTreeSet::new(),
            source,
            barcode: None,
            image_url: None,
        }
    }

    /// Case-folded, trimmed name used for cross-provider deduplication
    pub fn normalized_name(&self) -> String {
        crate::nlp::fold(&self.name)
    }

    /// Set the brand, ignoring blank values
    pub fn with_brand(mut self, brand: Option<String>) -> Self {
        self.brand = brand.filter(|b| !b.trim().is_empty());
        self
    }

    /// Set the nutrition table
    pub fn with_nutrition(mut self, nutrition: NutritionPer100g) -> Self {
        self.nutrition = nutrition;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_priority_order() {
        let mut ids = vec![
            ProviderId::Premium,
            ProviderId::Government,
            ProviderId::Crowd,
            ProviderId::Local,
        ];
        ids.sort();
        assert_eq!(ids, ProviderId::ALL.to_vec());
        assert!(ProviderId::Crowd.priority() < ProviderId::Local.priority());
    }

    #[test]
    fn test_provider_aliases_parse() {
        assert_eq!("usda".parse::<ProviderId>().unwrap(), ProviderId::Government);
        assert_eq!("OFF".parse::<ProviderId>().unwrap(), ProviderId::Crowd);
        assert!("nope".parse::<ProviderId>().is_err());
    }

    #[test]
    fn test_record_id_is_provider_qualified() {
        let record = FoodRecord::new(ProviderId::Government, 171077, "  Chicken Breast ");
        assert_eq!(record.id, "government:171077");
        assert_eq!(record.normalized_name(), "chicken breast");
    }

    #[test]
    fn test_nutrition_drops_invalid_values() {
        let mut n = NutritionPer100g::new();
        n.set(Nutrient::Protein, 31.0);
        n.set(Nutrient::Fat, f64::NAN);
        n.set(Nutrient::Sugar, -1.0);
        assert_eq!(n.len(), 1);
        assert_eq!(n.get(Nutrient::Protein), Some(31.0));
    }

    #[test]
    fn test_nutrition_serializes_as_plain_map() {
        let n = NutritionPer100g::new().with(Nutrient::Calories, 165.0);
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json, serde_json::json!({ "calories": 165.0 }));
    }
}
