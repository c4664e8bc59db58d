//! Ostomy-specific overlay attached to food records

use super::food::FoodRecord;
use serde::{Deserialize, Serialize};

/// FODMAP load
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FodmapLevel {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
}

/// Dietary fiber content
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FiberContent {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
}

/// How spicy a food is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpiceLevel {
    /// Not spicy
    None,
    /// Mild
    Mild,
    /// Medium
    Medium,
    /// Hot
    Hot,
}

/// Degree of industrial processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingLevel {
    /// Whole or minimally processed
    Minimal,
    /// Processed
    Processed,
    /// Ultra-processed
    UltraProcessed,
}

/// Qualitative rating of how well a food is tolerated with a stoma.
///
/// Declared from best to worst so `Ord` reads as "more cautious is greater".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Friendliness {
    /// Usually very well tolerated
    Excellent,
    /// Generally well tolerated
    Good,
    /// Fine in moderation
    Moderate,
    /// Try small amounts
    Caution,
    /// Known problem food
    Avoid,
}

/// Expected gas production
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GasProduction {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
}

/// Condition-specific annotation for one food
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionAnnotation {
    /// FODMAP load
    pub fodmap_level: FodmapLevel,
    /// Fiber content
    pub fiber_content: FiberContent,
    /// Spice level
    pub spice_level: SpiceLevel,
    /// Processing level
    pub processing_level: ProcessingLevel,
    /// Ingredients or properties known to cause symptoms
    #[serde(default)]
    pub common_triggers: Vec<String>,
    /// Overall rating
    pub friendliness: Friendliness,
    /// 1 (hard to digest) to 10 (very easy)
    pub digestibility_score: u8,
    /// Expected gas production
    pub gas_production: GasProduction,
    /// Recommended portion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portion_guidance: Option<String>,
    /// Preparation advice
    #[serde(default)]
    pub preparation_tips: Vec<String>,
    /// Better-tolerated substitutes
    #[serde(default)]
    pub alternatives: Vec<String>,
}

impl ConditionAnnotation {
    /// Neutral annotation used when nothing at all is known about a food
    pub fn neutral() -> Self {
        Self {
            fodmap_level: FodmapLevel::Low,
            fiber_content: FiberContent::Low,
            spice_level: SpiceLevel::None,
            processing_level: ProcessingLevel::Minimal,
            common_triggers: Vec::new(),
            friendliness: Friendliness::Good,
            digestibility_score: 7,
            gas_production: GasProduction::Low,
            portion_guidance: None,
            preparation_tips: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    /// Clamp the digestibility score into 1..=10
    pub fn with_digestibility(mut self, score: u8) -> Self {
        self.digestibility_score = score.clamp(1, 10);
        self
    }

    /// Ranking ordinal for this annotation
    pub fn friendliness_score(&self) -> u8 {
        friendliness_score(self)
    }
}

/// Map the qualitative rating onto a fixed ordinal used for ranking
pub fn friendliness_score(annotation: &ConditionAnnotation) -> u8 {
    match annotation.friendliness {
        Friendliness::Excellent => 10,
        Friendliness::Good => 8,
        Friendliness::Moderate => 6,
        Friendliness::Caution => 4,
        Friendliness::Avoid => 2,
    }
}

/// Which resolution step produced an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationSource {
    /// External annotation store
    Store,
    /// Curated table, canonical name
    CuratedExact,
    /// Curated table, alias
    CuratedAlias,
    /// Curated table, similarity match
    CuratedFuzzy,
    /// Keyword rules over the food name
    Inferred,
    /// Nothing known; neutral default
    Default,
}

/// A food record together with its resolved annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedFood {
    /// The reconciled record
    pub record: FoodRecord,
    /// Condition annotation
    pub annotation: ConditionAnnotation,
    /// Step that produced the annotation
    pub annotation_source: AnnotationSource,
}

impl AnnotatedFood {
    /// Ranking ordinal of the attached annotation
    pub fn friendliness_score(&self) -> u8 {
        friendliness_score(&self.annotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_friendliness_score_mapping() {
        let mut a = ConditionAnnotation::neutral();
        let expected = [
            (Friendliness::Excellent, 10),
            (Friendliness::Good, 8),
            (Friendliness::Moderate, 6),
            (Friendliness::Caution, 4),
            (Friendliness::Avoid, 2),
        ];
        for (rating, score) in expected {
            a.friendliness = rating;
            assert_eq!(friendliness_score(&a), score);
        }
    }

    #[test]
    fn test_friendliness_orders_by_caution() {
        assert!(Friendliness::Avoid > Friendliness::Caution);
        assert!(Friendliness::Good < Friendliness::Moderate);
    }

    #[test]
    fn test_digestibility_is_clamped() {
        assert_eq!(ConditionAnnotation::neutral().with_digestibility(0).digestibility_score, 1);
        assert_eq!(ConditionAnnotation::neutral().with_digestibility(42).digestibility_score, 10);
    }
}
