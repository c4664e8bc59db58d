//! Keyword inference over food names
//!
//! Each rule lists whole words or phrases. When several rules hit, the
//! results are merged toward caution: the worst rating, the lowest
//! digestibility and the highest gas and levels win.

use crate::nlp;
use crate::types::{
    ConditionAnnotation, FiberContent, FodmapLevel, Friendliness, GasProduction,
    ProcessingLevel, SpiceLevel,
};
use tracing::debug;

struct Rule {
    name: &'static str,
    terms: &'static [&'static str],
    trigger: &'static str,
    friendliness: Friendliness,
    digestibility: u8,
    gas: GasProduction,
    fodmap: FodmapLevel,
    fiber: FiberContent,
    spice: SpiceLevel,
    processing: ProcessingLevel,
    portion: Option<&'static str>,
    tip: Option<&'static str>,
    alternatives: &'static [&'static str],
}

impl Rule {
    fn annotation(&self) -> ConditionAnnotation {
        ConditionAnnotation {
            fodmap_level: self.fodmap,
            fiber_content: self.fiber,
            spice_level: self.spice,
            processing_level: self.processing,
            common_triggers: vec![self.trigger.to_string()],
            friendliness: self.friendliness,
            digestibility_score: self.digestibility,
            gas_production: self.gas,
            portion_guidance: self.portion.map(str::to_string),
            preparation_tips: self.tip.map(str::to_string).into_iter().collect(),
            alternatives: self.alternatives.iter().map(|a| a.to_string()).collect(),
        }
    }
}

const RULES: &[Rule] = &[
    Rule {
        name: "spice",
        terms: &[
            "chili", "chilli", "chilies", "chillies", "jalapeno", "jalapeño", "habanero",
            "cayenne", "curry", "vindaloo", "madras", "sriracha", "tabasco", "hot sauce",
            "hot wings", "buffalo", "spicy", "peri peri", "piri piri", "salsa", "wasabi",
            "harissa", "kimchi", "szechuan", "sichuan",
        ],
        trigger: "spice",
        friendliness: Friendliness::Caution,
        digestibility: 4,
        gas: GasProduction::Medium,
        fodmap: FodmapLevel::Medium,
        fiber: FiberContent::Low,
        spice: SpiceLevel::Hot,
        processing: ProcessingLevel::Processed,
        portion: Some("Small portion; try a few spoonfuls first"),
        tip: Some("Choose a milder version or reduce the chili"),
        alternatives: &["mild herbs", "plain version"],
    },
    Rule {
        name: "blockage",
        terms: &[
            "popcorn", "nut", "nuts", "peanuts", "almond", "almonds", "cashew", "cashews",
            "walnut", "walnuts", "pecan", "pecans", "pistachio", "pistachios", "corn",
            "sweetcorn", "celery", "coconut", "mushroom", "mushrooms", "dried fruit", "raisin",
            "raisins", "sultanas", "seed", "seeds", "seeded", "pineapple", "coleslaw", "kale",
            "crunchy", "sprouts",
        ],
        trigger: "fibrous or hard to break down",
        friendliness: Friendliness::Avoid,
        digestibility: 2,
        gas: GasProduction::Medium,
        fodmap: FodmapLevel::Medium,
        fiber: FiberContent::High,
        spice: SpiceLevel::None,
        processing: ProcessingLevel::Minimal,
        portion: Some("Avoid, or a very small amount chewed thoroughly"),
        tip: Some("Chew very well and drink fluids alongside"),
        alternatives: &["smooth nut butter", "peeled soft fruit"],
    },
    Rule {
        name: "wholegrain",
        terms: &[
            "wholegrain", "whole grain", "wholemeal", "whole wheat", "wholewheat", "bran",
            "granola", "muesli", "multigrain", "brown rice", "quinoa", "rye", "high fibre",
            "high fiber",
        ],
        trigger: "insoluble fiber",
        friendliness: Friendliness::Caution,
        digestibility: 4,
        gas: GasProduction::Medium,
        fodmap: FodmapLevel::Medium,
        fiber: FiberContent::High,
        spice: SpiceLevel::None,
        processing: ProcessingLevel::Minimal,
        portion: Some("Small portion"),
        tip: Some("Introduce gradually"),
        alternatives: &["white bread", "white rice"],
    },
    Rule {
        name: "gas",
        terms: &[
            "bean", "beans", "lentil", "lentils", "chickpea", "chickpeas", "hummus", "cabbage",
            "broccoli", "cauliflower", "brussels", "onion", "onions", "garlic", "leek",
            "leeks", "asparagus", "fizzy", "soda", "cola", "lemonade", "beer", "lager",
            "sparkling", "carbonated",
        ],
        trigger: "gas-forming",
        friendliness: Friendliness::Caution,
        digestibility: 5,
        gas: GasProduction::High,
        fodmap: FodmapLevel::High,
        fiber: FiberContent::Medium,
        spice: SpiceLevel::None,
        processing: ProcessingLevel::Minimal,
        portion: Some("Small portion"),
        tip: Some("Eat slowly; avoid close to social plans"),
        alternatives: &["carrots", "courgette"],
    },
    Rule {
        name: "fried",
        terms: &[
            "fried", "fries", "chips", "crisps", "battered", "tempura", "bacon", "sausage",
            "sausages", "hot dog", "nuggets", "burger", "pizza", "doughnut", "donut", "pastry",
            "processed", "ready meal", "salami", "pepperoni",
        ],
        trigger: "high fat",
        friendliness: Friendliness::Moderate,
        digestibility: 5,
        gas: GasProduction::Medium,
        fodmap: FodmapLevel::Low,
        fiber: FiberContent::Low,
        spice: SpiceLevel::None,
        processing: ProcessingLevel::UltraProcessed,
        portion: Some("Moderate portion"),
        tip: Some("Prefer baked or grilled"),
        alternatives: &["grilled version"],
    },
    Rule {
        name: "dairy",
        terms: &[
            "milk", "cream", "cheese", "ice cream", "milkshake", "custard", "lactose",
        ],
        trigger: "lactose",
        friendliness: Friendliness::Moderate,
        digestibility: 6,
        gas: GasProduction::Medium,
        fodmap: FodmapLevel::Medium,
        fiber: FiberContent::Low,
        spice: SpiceLevel::None,
        processing: ProcessingLevel::Processed,
        portion: None,
        tip: Some("Lactose-free versions are often easier"),
        alternatives: &["lactose-free milk", "hard cheese"],
    },
    Rule {
        name: "stimulant",
        terms: &[
            "coffee", "espresso", "caffeine", "energy drink", "alcohol", "wine", "whisky",
            "whiskey", "vodka", "gin", "rum", "cocktail",
        ],
        trigger: "stimulant",
        friendliness: Friendliness::Moderate,
        digestibility: 6,
        gas: GasProduction::Low,
        fodmap: FodmapLevel::Low,
        fiber: FiberContent::Low,
        spice: SpiceLevel::None,
        processing: ProcessingLevel::Processed,
        portion: Some("One serving"),
        tip: Some("Can increase output; keep hydrated"),
        alternatives: &["decaf", "herbal tea"],
    },
];

/// Infer an annotation from name keywords; `None` when no rule applies
pub fn infer(name: &str) -> Option<ConditionAnnotation> {
    let padded = format!(" {} ", nlp::tokens(name).join(" "));
    let mut merged: Option<ConditionAnnotation> = None;
    let mut applied = Vec::new();

    for rule in RULES {
        if !rule
            .terms
            .iter()
            .any(|term| padded.contains(&format!(" {} ", term)))
        {
            continue;
        }
        applied.push(rule.name);
        let annotation = rule.annotation();
        merged = Some(match merged {
            Some(previous) => merge(previous, annotation),
            None => annotation,
        });
    }

    if !applied.is_empty() {
        debug!(name, rules = ?applied, "inferred annotation from keywords");
    }
    merged
}

fn merge(mut a: ConditionAnnotation, b: ConditionAnnotation) -> ConditionAnnotation {
    a.friendliness = a.friendliness.max(b.friendliness);
    a.digestibility_score = a.digestibility_score.min(b.digestibility_score);
    a.gas_production = a.gas_production.max(b.gas_production);
    a.fodmap_level = a.fodmap_level.max(b.fodmap_level);
    a.fiber_content = a.fiber_content.max(b.fiber_content);
    a.spice_level = a.spice_level.max(b.spice_level);
    a.processing_level = a.processing_level.max(b.processing_level);
    a.portion_guidance = a.portion_guidance.or(b.portion_guidance);
    extend_unique(&mut a.common_triggers, b.common_triggers);
    extend_unique(&mut a.preparation_tips, b.preparation_tips);
    extend_unique(&mut a.alternatives, b.alternatives);
    a
}

fn extend_unique(into: &mut Vec<String>, from: Vec<String>) {
    for item in from {
        if !into.contains(&item) {
            into.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spice_rule() {
        let a = infer("Spicy Chicken Wings").unwrap();
        assert_eq!(a.spice_level, SpiceLevel::Hot);
        assert_eq!(a.friendliness, Friendliness::Caution);
        assert!(a.portion_guidance.is_some());
    }

    #[test]
    fn test_whole_words_only() {
        // "rye" must not fire inside "dryer", "nut" not inside "nutella"
        assert!(infer("Tumble dryer sheets").is_none());
        assert!(infer("Nutella").is_none());
        assert!(infer("Plain white fish").is_none());
    }

    #[test]
    fn test_rules_merge_toward_caution() {
        let a = infer("Spicy bean chili with corn").unwrap();
        assert_eq!(a.friendliness, Friendliness::Avoid);
        assert_eq!(a.digestibility_score, 2);
        assert_eq!(a.gas_production, GasProduction::High);
        assert_eq!(a.spice_level, SpiceLevel::Hot);
        assert!(a.common_triggers.contains(&"spice".to_string()));
        assert!(a.common_triggers.contains(&"gas-forming".to_string()));
    }

    #[test]
    fn test_wholegrain_and_fried() {
        assert_eq!(infer("Wholemeal Bread").unwrap().fiber_content, FiberContent::High);
        let fried = infer("Deep-fried fish").unwrap();
        assert_eq!(fried.processing_level, ProcessingLevel::UltraProcessed);
        assert_eq!(fried.friendliness, Friendliness::Moderate);
    }

    #[test]
    fn test_inferred_never_more_optimistic_than_default() {
        let neutral = ConditionAnnotation::neutral();
        for name in ["curry", "popcorn", "bran flakes", "lentil soup", "chips", "milk", "wine"] {
            let a = infer(name).unwrap();
            assert!(a.friendliness >= neutral.friendliness, "{}", name);
            assert!(a.digestibility_score <= neutral.digestibility_score, "{}", name);
        }
    }
}
