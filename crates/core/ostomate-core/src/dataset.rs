//! Hand-authored table of foods with nutrition and ostomy annotations
//!
//! The table is embedded in the binary and parsed once on first use. It is
//! never mutated afterwards, so it is shared freely across tasks.

use crate::nlp::{self, similarity};
use crate::provider::FoodProvider;
use crate::types::{ConditionAnnotation, FoodRecord, NutritionPer100g, ProviderId};
use crate::{OstomateError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::sync::Arc;

static CURATED_FOODS_JSON: &str = include_str!("../data/curated_foods.json");

static GLOBAL: Lazy<Arc<CuratedDataset>> = Lazy::new(|| {
    match CuratedDataset::from_json(CURATED_FOODS_JSON) {
        Ok(dataset) => Arc::new(dataset),
        Err(e) => {
            tracing::error!(error = %e, "embedded curated dataset failed to parse");
            Arc::new(CuratedDataset::default())
        }
    }
});

/// One curated food
#[derive(Debug, Clone, Deserialize)]
pub struct CuratedFood {
    /// Stable slug, prefixed with `local:` when turned into a record
    pub id: String,
    /// Canonical name
    pub name: String,
    /// Alternative spellings, plurals and common typos
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Category labels
    #[serde(default)]
    pub categories: Vec<String>,
    /// Nutrition per 100 g
    #[serde(default)]
    pub nutrition: NutritionPer100g,
    /// Ostomy annotation
    pub annotation: ConditionAnnotation,
}

impl CuratedFood {
    /// Convert into the canonical record shape
    pub fn to_record(&self) -> FoodRecord {
        let mut record = FoodRecord::new(ProviderId::Local, &self.id, &self.name)
            .with_nutrition(self.nutrition.clone());
        record.categories = self.categories.iter().cloned().collect();
        record
    }
}

/// How a curated entry was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Canonical name equal after folding
    Exact,
    /// An alias equal after folding
    Alias,
    /// Similarity at or above the caller's threshold
    Fuzzy,
}

/// Result of [`CuratedDataset::find`]
#[derive(Debug, Clone, Copy)]
pub struct CuratedMatch<'a> {
    /// Matched entry
    pub food: &'a CuratedFood,
    /// How it matched
    pub kind: MatchKind,
    /// Similarity score (1.0 for exact and alias matches)
    pub score: f32,
}

/// The curated table
#[derive(Debug, Clone, Default)]
pub struct CuratedDataset {
    foods: Vec<CuratedFood>,
}

impl CuratedDataset {
    /// Process-wide table parsed from the embedded JSON
    pub fn global() -> Arc<CuratedDataset> {
        GLOBAL.clone()
    }

    /// Parse a table from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let foods: Vec<CuratedFood> = serde_json::from_str(json)?;
        Self::from_foods(foods)
    }

    /// Build a table from entries; ids must be unique
    pub fn from_foods(foods: Vec<CuratedFood>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for food in &foods {
            if !seen.insert(food.id.as_str()) {
                return Err(OstomateError::validation(format!(
                    "duplicate curated food id '{}'",
                    food.id
                )));
            }
        }
        Ok(Self { foods })
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.foods.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    /// All entries in table order
    pub fn foods(&self) -> &[CuratedFood] {
        &self.foods
    }

    /// Find the best single entry for a name: exact, then alias, then fuzzy.
    ///
    /// The fuzzy step compares against every canonical name and alias and
    /// keeps the highest score; ties go to the earlier entry.
    pub fn find(&self, query: &str, threshold: f32) -> Option<CuratedMatch<'_>> {
        let q = nlp::fold(query);
        if q.is_empty() {
            return None;
        }

        if let Some(food) = self.foods.iter().find(|f| nlp::fold(&f.name) == q) {
            return Some(CuratedMatch {
                food,
                kind: MatchKind::Exact,
                score: 1.0,
            });
        }

        if let Some(food) = self
            .foods
            .iter()
            .find(|f| f.aliases.iter().any(|a| nlp::fold(a) == q))
        {
            return Some(CuratedMatch {
                food,
                kind: MatchKind::Alias,
                score: 1.0,
            });
        }

        let mut best: Option<CuratedMatch<'_>> = None;
        for food in &self.foods {
            let score = self.best_score(food, &q);
            if score >= threshold && best.map_or(true, |b| score > b.score) {
                best = Some(CuratedMatch {
                    food,
                    kind: MatchKind::Fuzzy,
                    score,
                });
            }
        }
        best
    }

    /// Search for every entry related to a query, best first.
    ///
    /// Ranking: exact name, alias, all query words present in name or alias,
    /// then fuzzy matches by descending score. Table order breaks ties.
    pub fn search(&self, query: &str, limit: usize, threshold: f32) -> Vec<FoodRecord> {
        let q = nlp::fold(query);
        if q.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut ranked: Vec<(u8, f32, usize)> = Vec::new();
        for (idx, food) in self.foods.iter().enumerate() {
            let rank = if nlp::fold(&food.name) == q {
                Some((0, 1.0))
            } else if food.aliases.iter().any(|a| nlp::fold(a) == q) {
                Some((1, 1.0))
            } else if nlp::contains_all_tokens(&food.name, &q)
                || food.aliases.iter().any(|a| nlp::contains_all_tokens(a, &q))
            {
                Some((2, 1.0))
            } else {
                let score = self.best_score(food, &q);
                (score >= threshold).then_some((3, score))
            };
            if let Some((tier, score)) = rank {
                ranked.push((tier, score, idx));
            }
        }

        ranked.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then(b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal))
                .then(a.2.cmp(&b.2))
        });
        ranked
            .into_iter()
            .take(limit)
            .map(|(_, _, idx)| self.foods[idx].to_record())
            .collect()
    }

    /// Entry for a `local:` record id
    pub fn get_by_record_id(&self, record_id: &str) -> Option<&CuratedFood> {
        let slug = record_id.strip_prefix("local:")?;
        self.foods.iter().find(|f| f.id == slug)
    }

    fn best_score(&self, food: &CuratedFood, folded_query: &str) -> f32 {
        std::iter::once(&food.name)
            .chain(food.aliases.iter())
            .map(|candidate| similarity(candidate, folded_query))
            .fold(0.0, f32::max)
    }
}

/// Exposes the curated table through the provider seam
pub struct LocalDatasetProvider {
    dataset: Arc<CuratedDataset>,
    threshold: f32,
}

impl LocalDatasetProvider {
    /// Wrap a table with the similarity threshold used for fuzzy search
    pub fn new(dataset: Arc<CuratedDataset>, threshold: f32) -> Self {
        Self { dataset, threshold }
    }
}

#[async_trait]
impl FoodProvider for LocalDatasetProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Local
    }

    fn name(&self) -> &str {
        "curated"
    }

    async fn search_by_query(&self, query: &str, limit: usize) -> Result<Vec<FoodRecord>> {
        Ok(self.dataset.search(query, limit, self.threshold))
    }

    async fn get_by_barcode(&self, _code: &str) -> Result<Option<FoodRecord>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_dataset_parses() {
        let dataset = CuratedDataset::from_json(CURATED_FOODS_JSON).unwrap();
        assert!(dataset.len() >= 20);
        assert_eq!(CuratedDataset::global().len(), dataset.len());
    }

    #[test]
    fn test_embedded_scores_are_in_range() {
        for food in CuratedDataset::global().foods() {
            let score = food.annotation.digestibility_score;
            assert!((1..=10).contains(&score), "{} has score {}", food.name, score);
        }
    }

    #[test]
    fn test_find_exact_then_alias_then_fuzzy() {
        let dataset = CuratedDataset::global();

        let m = dataset.find("chicken breast", 0.7).unwrap();
        assert_eq!(m.kind, MatchKind::Exact);
        assert_eq!(m.food.name, "Chicken Breast");

        let m = dataset.find("Chiken", 0.7).unwrap();
        assert_eq!(m.kind, MatchKind::Alias);
        assert_eq!(m.food.name, "Chicken Breast");

        let m = dataset.find("bananna", 0.7).unwrap();
        assert_eq!(m.kind, MatchKind::Fuzzy);
        assert_eq!(m.food.name, "Banana");
        assert!(m.score >= 0.7);
    }

    #[test]
    fn test_find_respects_threshold() {
        let dataset = CuratedDataset::global();
        assert!(dataset.find("quinoa salad", 0.7).is_none());
        assert!(dataset.find("   ", 0.0).is_none());
    }

    #[test]
    fn test_search_ranks_exact_before_token_matches() {
        let dataset = CuratedDataset::global();
        let results = dataset.search("rice", 10, 0.7);
        assert_eq!(results[0].name, "White Rice");
        assert_eq!(results[0].id, "local:white-rice");
        assert_eq!(results[0].source, ProviderId::Local);
    }

    #[test]
    fn test_search_token_match() {
        let dataset = CuratedDataset::global();
        let names: Vec<String> = dataset
            .search("peanut", 10, 0.7)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Smooth Peanut Butter".to_string()]);
    }

    #[test]
    fn test_search_honours_limit() {
        let dataset = CuratedDataset::global();
        assert!(dataset.search("tea", 1, 0.0).len() <= 1);
        assert!(dataset.search("tea", 0, 0.7).is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"[
            {"id": "x", "name": "X", "annotation": {
                "fodmap_level": "low", "fiber_content": "low", "spice_level": "none",
                "processing_level": "minimal", "friendliness": "good",
                "digestibility_score": 7, "gas_production": "low"}},
            {"id": "x", "name": "Y", "annotation": {
                "fodmap_level": "low", "fiber_content": "low", "spice_level": "none",
                "processing_level": "minimal", "friendliness": "good",
                "digestibility_score": 7, "gas_production": "low"}}
        ]"#;
        assert!(CuratedDataset::from_json(json).is_err());
    }

    #[test]
    fn test_record_id_round_trip() {
        let dataset = CuratedDataset::global();
        let food = dataset.get_by_record_id("local:banana").unwrap();
        assert_eq!(food.name, "Banana");
        assert!(dataset.get_by_record_id("crowd:banana").is_none());
    }

    #[tokio::test]
    async fn test_provider_wraps_search() {
        let provider = LocalDatasetProvider::new(CuratedDataset::global(), 0.7);
        assert_eq!(provider.id(), ProviderId::Local);
        let results = provider.search_by_query("chiken", 5).await.unwrap();
        assert_eq!(results[0].name, "Chicken Breast");
        assert!(provider.get_by_barcode("0123").await.unwrap().is_none());
    }
}
