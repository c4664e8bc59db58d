//! Keyword tables for the local extraction pass

use once_cell::sync::Lazy;
use regex::Regex;

/// A named group of symptom or output phrases
#[derive(Debug)]
pub struct KeywordGroup {
    /// Machine key stored in entry details
    pub key: &'static str,
    /// Human label used as the entry description
    pub label: &'static str,
    /// Compiled alternation of the group's phrases
    pub pattern: Regex,
}

impl KeywordGroup {
    fn new(key: &'static str, label: &'static str, phrases: &[&str]) -> Self {
        let alternation = phrases
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        Self {
            key,
            label,
            pattern: Regex::new(&format!(r"\b(?:{})\b", alternation)).expect("valid regex"),
        }
    }
}

/// Symptom groups, checked in order
pub static SYMPTOM_GROUPS: Lazy<Vec<KeywordGroup>> = Lazy::new(|| {
    vec![
        KeywordGroup::new(
            "gas_bloating",
            "Gas / bloating",
            &[
                "gas", "gassy", "wind", "windy", "flatulence", "farting", "farted", "bloat",
                "bloated", "bloating", "ballooning", "pancaking",
            ],
        ),
        KeywordGroup::new(
            "pain_cramping",
            "Pain / cramping",
            &[
                "pain", "painful", "pains", "cramp", "cramps", "cramping", "crampy", "ache",
                "aching", "achy", "stomach ache", "sore", "tender",
            ],
        ),
        KeywordGroup::new(
            "nausea",
            "Nausea",
            &["nausea", "nauseous", "nauseated", "queasy", "sick to my stomach", "vomited", "vomiting", "threw up"],
        ),
        KeywordGroup::new(
            "heartburn",
            "Heartburn",
            &["heartburn", "acid reflux", "reflux", "indigestion", "acidic"],
        ),
        KeywordGroup::new(
            "diarrhea",
            "Diarrhea",
            &["diarrhea", "diarrhoea", "the runs", "high output"],
        ),
        KeywordGroup::new(
            "constipation",
            "Constipation",
            &["constipated", "constipation", "blocked", "blockage", "no output", "nothing coming out"],
        ),
    ]
});

/// Phrases that mark a bowel movement / stoma output event
pub static BOWEL_MOVEMENT: Lazy<KeywordGroup> = Lazy::new(|| {
    KeywordGroup::new(
        "bowel_movement",
        "Bowel movement",
        &[
            "bowel movement", "bm", "output", "emptied", "emptied my bag", "emptied my pouch",
            "emptied the bag", "emptied the pouch", "poop", "pooped", "stool", "stools",
        ],
    )
});

/// Consistency words indicating loose output
pub static LOOSE: Lazy<KeywordGroup> = Lazy::new(|| {
    KeywordGroup::new("loose", "Loose", &["loose", "watery", "liquid", "runny", "thin"])
});

/// Consistency words indicating normal output
pub static NORMAL: Lazy<KeywordGroup> = Lazy::new(|| {
    KeywordGroup::new(
        "normal",
        "Normal",
        &["normal", "formed", "solid", "firm", "thick", "porridge-like", "toothpaste"],
    )
});

/// Pouch or appliance change
pub static POUCH_CHANGE: Lazy<KeywordGroup> = Lazy::new(|| {
    KeywordGroup::new(
        "pouch_change",
        "Pouch change",
        &[
            "pouch change", "bag change", "changed my pouch", "changed the pouch", "changed pouch",
            "changed my bag", "changed the bag", "changed bag", "new pouch", "new bag",
            "changed my appliance", "changed the appliance", "changed appliance", "changed my flange",
        ],
    )
});

/// Irrigation session
pub static IRRIGATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\birrigat(?:e|ed|es|ing|ion)\b").expect("valid regex"));

/// Volume, e.g. "1000 ml", "1.5 litres"
pub static VOLUME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d+(?:\.\d+)?)\s*(ml|millilitres?|milliliters?|l|litres?|liters?)\b")
        .expect("valid regex")
});

/// Known medications and generic "took a pill" phrasing
pub static MEDICATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(loperamide|imodium|codeine|omeprazole|lansoprazole|gaviscon|simethicone|peppermint oil|buscopan|fybogel|paracetamol|acetaminophen|ibuprofen|laxative|antibiotics?|(?:took|take|taken|had)\s+(?:my|a|an|some|the)?\s*(?:pills?|tablets?|capsules?|meds|medication|medicine))\b",
    )
    .expect("valid regex")
});

/// Dose attached to a medication, e.g. "400 mg", "2 tablets"
pub static DOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d+(?:\.\d+)?\s*(?:mg|mcg|ml|tablets?|pills?|capsules?))\b").expect("valid regex")
});

/// Phrases reporting a successful irrigation
pub const IRRIGATION_SUCCESS: &[&str] = &[
    "worked", "successful", "good result", "good return", "productive", "went well",
];

/// Phrases reporting a failed irrigation
pub const IRRIGATION_FAILURE: &[&str] = &[
    "didn't work", "did not work", "no result", "no return", "unsuccessful", "nothing came",
];

/// Severity qualifiers: (words, label, score)
pub const SEVERITY_QUALIFIERS: [(&[&str], &str, u8); 3] = [
    (
        &[
            "very", "really", "severe", "severely", "terrible", "awful", "horrible", "extreme",
            "extremely", "bad", "badly", "intense", "unbearable", "lots of", "so much",
        ],
        "severe",
        8,
    ),
    (&["moderate", "quite", "fairly", "pretty"], "moderate", 5),
    (
        &["slight", "slightly", "mild", "mildly", "a bit", "a little", "little", "minor", "some"],
        "mild",
        3,
    ),
];

/// Output volume qualifiers: (words, label)
pub const VOLUME_QUALIFIERS: [(&[&str], &str); 3] = [
    (&["full", "a lot", "lots", "large", "big", "huge", "heavy"], "large"),
    (&["half", "medium", "moderate"], "medium"),
    (&["small", "little", "bit", "light", "barely"], "small"),
];

/// Words that cancel the keyword that follows them
pub const NEGATIONS: [&str; 8] = ["no", "not", "without", "never", "didn't", "wasn't", "hardly", "zero"];

/// Quantity with unit, e.g. "2 cups", "half a bowl"
pub static AMOUNT_WITH_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(\d+(?:[./]\d+)?|a|an|one|two|three|four|five|half(?:\s+a)?)\s*(cups?|mugs?|tbsps?|tablespoons?|tsps?|teaspoons?|g|grams?|kg|oz|ounces?|ml|slices?|pieces?|bowls?|plates?|glass(?:es)?|servings?|portions?|handfuls?|spoonfuls?|cans?|bottles?|pots?)\b",
    )
    .expect("valid regex")
});

/// Bare count, e.g. "2 eggs"
pub static AMOUNT_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d+(?:\.\d+)?)\s+([a-z]+)").expect("valid regex"));

/// Qualitative size, e.g. "small portion", "a few"
pub static AMOUNT_QUALITATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b((?:small|medium|large|big|huge|tiny|generous|modest)\s+(?:portion|serving|bowl|plate|amount|helping|piece|slice|cup|glass)s?|a\s+(?:few|little|lot\s+of|handful\s+of)|a\s+couple\s+of)\b",
    )
    .expect("valid regex")
});

/// Words never used as the edge of a food window
pub const STOPWORDS: &[&str] = &[
    "i", "im", "i'm", "me", "my", "we", "our", "you", "he", "she", "they", "it", "its", "a",
    "an", "the", "and", "or", "but", "with", "without", "at", "around", "about", "by", "for",
    "of", "in", "on", "to", "from", "then", "after", "before", "later", "again", "had", "have",
    "has", "having", "ate", "eat", "eaten", "eating", "drank", "drink", "drinking", "some",
    "any", "felt", "feel", "feeling", "feels", "was", "were", "is", "are", "be", "been", "so",
    "too", "also", "just", "like", "really", "very", "bit", "little", "lot", "lots", "today",
    "yesterday", "tonight", "morning", "afternoon", "evening", "night", "noon", "breakfast",
    "lunch", "dinner", "supper", "snack", "am", "pm", "no", "not", "got", "get", "went", "did",
    "this", "that", "these", "those", "there", "here", "up", "out", "off", "over", "into",
    "small", "medium", "large", "big", "half", "few", "couple", "plate", "bowl", "cup", "cups",
    "glass", "slice", "slices", "piece", "pieces", "portion", "serving", "mug", "can",
    "bottle", "handful", "spoonful", "g", "ml", "oz", "which", "made", "make", "more",
    "less", "much", "many", "bad", "good", "ok", "okay", "fine", "when", "while", "until", "since", "because", "time", "times", "once", "twice",
];

/// Whether a token is a stopword, unit, or number
pub fn is_filler(token: &str) -> bool {
    STOPWORDS.contains(&token) || token.chars().any(|c| c.is_ascii_digit())
}

/// Whether any of `words` appears as a whole word or phrase in folded text
pub fn mentions_any(folded: &str, words: &[&str]) -> bool {
    let padded = format!(" {} ", normalize_spacing(folded));
    words.iter().any(|w| padded.contains(&format!(" {} ", w)))
}

fn normalize_spacing(text: &str) -> String {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symptom_groups_match_whole_words() {
        let gas = &SYMPTOM_GROUPS[0];
        assert!(gas.pattern.is_match("felt gassy around 10am"));
        assert!(!gas.pattern.is_match("had gasoline smell"));
    }

    #[test]
    fn test_medication_pattern() {
        assert!(MEDICATION.is_match("took 2 imodium"));
        assert!(MEDICATION.is_match("took my meds after lunch"));
        assert!(!MEDICATION.is_match("took the dog out"));
    }

    #[test]
    fn test_amount_patterns() {
        let caps = AMOUNT_WITH_UNIT.captures("had half a bowl of porridge").unwrap();
        assert_eq!(&caps[0], "half a bowl");
        let caps = AMOUNT_COUNT.captures("i had 2 eggs").unwrap();
        assert_eq!(&caps[1], "2");
        assert!(AMOUNT_QUALITATIVE.is_match("a small portion of rice"));
    }

    #[test]
    fn test_mentions_any_respects_word_edges() {
        assert!(mentions_any("a little bit of pain", &["a little"]));
        assert!(!mentions_any("brittle", &["little"]));
    }

    #[test]
    fn test_filler() {
        assert!(is_filler("the"));
        assert!(is_filler("8am"));
        assert!(!is_filler("eggs"));
    }
}
