//! Deterministic extraction used when the language model is unavailable
//!
//! The description is split into clauses. Each clause gets its own time
//! (or inherits the previous one), keyword tables pick out symptoms,
//! outputs, irrigation and medication, and the remaining words are grounded
//! as foods by querying the aggregator with 1-3 word windows.

use super::timing::{self, TimeOfDay};
use super::vocabulary::{self, KeywordGroup};
use crate::aggregator::{Aggregator, SearchOptions};
use crate::config::CoreConfig;
use crate::dataset::{CuratedDataset, MatchKind};
use crate::nlp::{self, similarity};
use crate::types::{
    confidence, EntryCategory, FoodRecord, MealSlot, ParsedLogEntry, ProviderId, ProviderSet,
};
use chrono::{DateTime, FixedOffset, Timelike};
use futures_util::future::join_all;
use once_cell::sync::Lazy;
use regex::{Match, Regex};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::Arc;
use tracing::debug;

static CLAUSE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[,;!?\n]|\.(?:\s|$)|\b(?:and then|then|after that|later)\b").expect("valid regex")
});

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}']+").expect("valid regex"));

const MAX_WINDOW: usize = 3;
const GROUNDING_LIMIT: usize = 3;
/// Windows shorter than this only match exactly or by alias
const MIN_FUZZY_CHARS: usize = 5;
/// A bare number after one of these is a time, not a quantity
const COUNT_BLOCKERS: [&str; 8] = ["at", "around", "about", "by", "till", "until", "before", "after"];
const COUNT_UNIT_BLOCKERS: [&str; 8] = ["am", "pm", "a", "p", "minutes", "mins", "hours", "hrs"];

#[derive(Debug)]
struct Token {
    text: String,
    span: Range<usize>,
}

#[derive(Debug)]
struct Clause {
    text: String,
    time: Option<TimeOfDay>,
    tokens: Vec<Token>,
    masked: Vec<bool>,
}

#[derive(Debug)]
struct Window {
    clause: usize,
    start: usize,
    end: usize,
    text: String,
}

impl Window {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

#[derive(Debug)]
struct FoodMention {
    clause: usize,
    start: usize,
    record: FoodRecord,
    matched_text: String,
    amount: Option<String>,
}

/// Keyword, regex and grounding based extraction
pub struct LocalExtractor {
    aggregator: Arc<Aggregator>,
    dataset: Arc<CuratedDataset>,
    grounding: ProviderSet,
    threshold: f32,
}

impl LocalExtractor {
    /// Create an extractor that grounds food names through `aggregator`
    pub fn new(aggregator: Arc<Aggregator>, config: &CoreConfig) -> Self {
        Self {
            aggregator,
            dataset: CuratedDataset::global(),
            grounding: config.grounding_providers.clone(),
            threshold: config.fuzzy_threshold,
        }
    }

    /// Use a different curated table for accepting local hits
    pub fn with_dataset(mut self, dataset: Arc<CuratedDataset>) -> Self {
        self.dataset = dataset;
        self
    }

    /// Extract entries; never fails, unrecognised text yields no entries
    pub async fn extract(
        &self,
        description: &str,
        reference: DateTime<FixedOffset>,
    ) -> Vec<ParsedLogEntry> {
        let text = description.to_lowercase();
        if text.trim().is_empty() {
            return Vec::new();
        }

        let clauses = split_clauses(&text);
        let mut entries = Vec::new();
        for clause in &clauses {
            let at = stamp(reference, clause.time);
            entries.extend(symptom_entries(&clause.text, at));
            entries.extend(output_entries(&clause.text, at));
            entries.extend(irrigation_entry(&clause.text, at));
            entries.extend(medication_entries(&clause.text, at));
        }

        let mentions = self.ground_foods(&clauses).await;
        entries.extend(meal_entries(&text, &clauses, mentions, reference));

        entries.sort_by_key(|e| e.timestamp);
        debug!(
            clauses = clauses.len(),
            entries = entries.len(),
            "local extraction complete"
        );
        entries
    }

    async fn ground_foods(&self, clauses: &[Clause]) -> Vec<FoodMention> {
        let mut windows: Vec<Window> = clauses
            .iter()
            .enumerate()
            .flat_map(|(idx, clause)| food_windows(idx, clause))
            .collect();
        if windows.is_empty() {
            return Vec::new();
        }

        let mut queries: Vec<&str> = Vec::new();
        for window in &windows {
            if !queries.contains(&window.text.as_str()) {
                queries.push(window.text.as_str());
            }
        }
        let options = SearchOptions::default()
            .with_providers(self.grounding.clone())
            .with_limit(GROUNDING_LIMIT);
        let results = join_all(queries.iter().map(|q| self.aggregator.search(q, &options))).await;
        let hits: HashMap<String, Vec<FoodRecord>> = queries
            .iter()
            .map(|q| q.to_string())
            .zip(results)
            .collect();

        // longest windows claim their words first
        windows.sort_by(|a, b| {
            b.len()
                .cmp(&a.len())
                .then(a.clause.cmp(&b.clause))
                .then(a.start.cmp(&b.start))
        });

        let mut consumed: HashSet<(usize, usize)> = HashSet::new();
        let mut accepted_ids: HashSet<String> = HashSet::new();
        let mut mentions = Vec::new();
        for window in windows {
            if (window.start..window.end).any(|i| consumed.contains(&(window.clause, i))) {
                continue;
            }
            let Some(hit) = hits
                .get(&window.text)
                .and_then(|records| records.iter().find(|r| self.accepts(r, &window.text)))
            else {
                continue;
            };
            consumed.extend((window.start..window.end).map(|i| (window.clause, i)));
            if !accepted_ids.insert(hit.id.clone()) {
                continue;
            }
            mentions.push(FoodMention {
                clause: window.clause,
                start: window.start,
                record: hit.clone(),
                matched_text: window.text,
                amount: None,
            });
        }
        mentions.sort_by_key(|m| (m.clause, m.start));

        for (idx, clause) in clauses.iter().enumerate() {
            let Some(amount) = find_amount(&clause.text) else {
                continue;
            };
            if let Some(last) = mentions.iter_mut().filter(|m| m.clause == idx).last() {
                last.amount = Some(amount);
            }
        }
        mentions
    }

    fn accepts(&self, record: &FoodRecord, window: &str) -> bool {
        let long_enough = window.chars().count() >= MIN_FUZZY_CHARS;
        if record.source == ProviderId::Local {
            return match self.dataset.find(window, self.threshold) {
                Some(found) => {
                    format!("local:{}", found.food.id) == record.id
                        && (found.kind != MatchKind::Fuzzy || long_enough)
                }
                None => false,
            };
        }
        nlp::contains_all_tokens(&record.name, window)
            || (long_enough && similarity(&record.name, window) >= self.threshold)
    }
}

fn split_clauses(text: &str) -> Vec<Clause> {
    let global = timing::find_time(text);
    let mut carried: Option<TimeOfDay> = None;
    let mut clauses = Vec::new();

    for piece in CLAUSE_BREAK.split(text).map(str::trim).filter(|s| !s.is_empty()) {
        if let Some(own) = timing::find_time(piece) {
            carried = Some(own);
        }
        let mask = keyword_spans(piece);
        let tokens: Vec<Token> = WORD
            .find_iter(piece)
            .map(|m| Token {
                text: m.as_str().trim_matches('\'').to_string(),
                span: m.range(),
            })
            .collect();
        let masked = tokens
            .iter()
            .map(|t| mask.iter().any(|r| r.start < t.span.end && t.span.start < r.end))
            .collect();
        clauses.push(Clause {
            text: piece.to_string(),
            time: carried.or(global),
            tokens,
            masked,
        });
    }
    clauses
}

/// Byte ranges of non-food keywords; food windows never cross them
fn keyword_spans(clause: &str) -> Vec<Range<usize>> {
    let groups = vocabulary::SYMPTOM_GROUPS.iter().chain([
        &*vocabulary::BOWEL_MOVEMENT,
        &*vocabulary::LOOSE,
        &*vocabulary::NORMAL,
        &*vocabulary::POUCH_CHANGE,
    ]);
    let mut spans: Vec<Range<usize>> = groups
        .flat_map(|g| g.pattern.find_iter(clause).map(|m| m.range()))
        .collect();
    spans.extend(vocabulary::IRRIGATION.find_iter(clause).map(|m| m.range()));
    spans.extend(vocabulary::MEDICATION.find_iter(clause).map(|m| m.range()));
    spans
}

fn food_windows(clause_idx: usize, clause: &Clause) -> Vec<Window> {
    let n = clause.tokens.len();
    let mut windows = Vec::new();
    for start in 0..n {
        for size in 1..=MAX_WINDOW {
            let end = start + size;
            if end > n || clause.masked[start..end].iter().any(|&m| m) {
                break;
            }
            let first = &clause.tokens[start].text;
            let last = &clause.tokens[end - 1].text;
            if vocabulary::is_filler(first) || vocabulary::is_filler(last) {
                continue;
            }
            let text = clause.tokens[start..end]
                .iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            if text.chars().count() < 3 {
                continue;
            }
            windows.push(Window {
                clause: clause_idx,
                start,
                end,
                text,
            });
        }
    }
    windows
}

fn find_amount(clause: &str) -> Option<String> {
    if let Some(m) = vocabulary::AMOUNT_WITH_UNIT.find(clause) {
        return Some(m.as_str().to_string());
    }
    for caps in vocabulary::AMOUNT_COUNT.captures_iter(clause) {
        let (Some(whole), Some(number), Some(next)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if COUNT_UNIT_BLOCKERS.contains(&next.as_str()) {
            continue;
        }
        let before = clause[..whole.start()].split_whitespace().last();
        if before.map_or(false, |w| COUNT_BLOCKERS.contains(&w)) {
            continue;
        }
        return Some(number.as_str().to_string());
    }
    vocabulary::AMOUNT_QUALITATIVE
        .find(clause)
        .map(|m| m.as_str().to_string())
}

fn stamp(reference: DateTime<FixedOffset>, time: Option<TimeOfDay>) -> DateTime<FixedOffset> {
    time.map(|t| timing::on_reference_day(reference, t))
        .unwrap_or(reference)
}

fn is_negated(clause: &str, start: usize) -> bool {
    clause[..start]
        .split_whitespace()
        .rev()
        .take(2)
        .map(|w| w.trim_matches(|c: char| !(c.is_alphanumeric() || c == '\'')))
        .any(|w| vocabulary::NEGATIONS.contains(&w))
}

fn first_unnegated<'t>(pattern: &Regex, clause: &'t str) -> Option<Match<'t>> {
    pattern
        .find_iter(clause)
        .find(|m| !is_negated(clause, m.start()))
}

fn group_hit<'t>(group: &KeywordGroup, clause: &'t str) -> Option<Match<'t>> {
    first_unnegated(&group.pattern, clause)
}

fn severity(clause: &str) -> Option<(&'static str, u8)> {
    vocabulary::SEVERITY_QUALIFIERS
        .iter()
        .find(|(words, _, _)| vocabulary::mentions_any(clause, words))
        .map(|(_, label, score)| (*label, *score))
}

fn symptom_entries(clause: &str, at: DateTime<FixedOffset>) -> Vec<ParsedLogEntry> {
    let mut entries = Vec::new();
    for group in vocabulary::SYMPTOM_GROUPS.iter() {
        let Some(hit) = group_hit(group, clause) else {
            continue;
        };
        let qualifier = severity(clause);
        let confidence = if qualifier.is_some() {
            confidence::HIGH
        } else {
            confidence::MEDIUM
        };
        let mut entry = ParsedLogEntry::new(EntryCategory::Symptom, group.label, at, confidence)
            .with_detail("symptom", group.key)
            .with_detail("matched_text", hit.as_str());
        if let Some((label, score)) = qualifier {
            entry = entry
                .with_detail("severity", label)
                .with_detail("severity_score", score);
        }
        entries.push(entry);
    }
    entries
}

fn output_entries(clause: &str, at: DateTime<FixedOffset>) -> Vec<ParsedLogEntry> {
    let mut entries = Vec::new();

    if group_hit(&vocabulary::POUCH_CHANGE, clause).is_some() {
        entries.push(
            ParsedLogEntry::new(EntryCategory::Output, "Pouch change", at, confidence::HIGH)
                .with_detail("event", "pouch_change"),
        );
    }

    let movement = group_hit(&vocabulary::BOWEL_MOVEMENT, clause).is_some();
    let loose = group_hit(&vocabulary::LOOSE, clause).is_some();
    // "normal" on its own is too common a word to mean output
    let normal = movement && group_hit(&vocabulary::NORMAL, clause).is_some();
    if !movement && !loose {
        return entries;
    }

    let consistency = if loose {
        Some("loose")
    } else if normal {
        Some("normal")
    } else {
        None
    };
    let confidence = match (movement, consistency) {
        (true, Some(_)) => confidence::HIGH,
        (true, None) => confidence::MEDIUM,
        (false, _) => confidence::LOW,
    };
    let description = match consistency {
        Some(c) => format!("Bowel movement ({})", c),
        None => "Bowel movement".to_string(),
    };

    let mut entry = ParsedLogEntry::new(EntryCategory::Output, description, at, confidence)
        .with_detail("event", "bowel_movement");
    if let Some(c) = consistency {
        entry = entry.with_detail("consistency", c);
    }
    if let Some((_, label)) = vocabulary::VOLUME_QUALIFIERS
        .iter()
        .find(|(words, _)| vocabulary::mentions_any(clause, words))
    {
        entry = entry.with_detail("volume", *label);
    }
    entries.push(entry);
    entries
}

fn irrigation_entry(clause: &str, at: DateTime<FixedOffset>) -> Option<ParsedLogEntry> {
    first_unnegated(&vocabulary::IRRIGATION, clause)?;

    let volume_ml = vocabulary::VOLUME.captures(clause).and_then(|caps| {
        let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = caps.get(2)?.as_str();
        Some(if unit.starts_with('l') {
            amount * 1000.0
        } else {
            amount
        })
    });
    let result = if vocabulary::mentions_any(clause, vocabulary::IRRIGATION_FAILURE) {
        Some("unsuccessful")
    } else if vocabulary::mentions_any(clause, vocabulary::IRRIGATION_SUCCESS) {
        Some("successful")
    } else {
        None
    };

    let confidence = if volume_ml.is_some() {
        confidence::HIGH
    } else {
        confidence::MEDIUM
    };
    let mut entry = ParsedLogEntry::new(EntryCategory::Irrigation, "Irrigation", at, confidence);
    if let Some(ml) = volume_ml {
        entry = entry.with_detail("volume_ml", ml);
    }
    if let Some(result) = result {
        entry = entry.with_detail("result", result);
    }
    Some(entry)
}

fn medication_entries(clause: &str, at: DateTime<FixedOffset>) -> Vec<ParsedLogEntry> {
    let dose = vocabulary::DOSE
        .find(clause)
        .map(|m| m.as_str().to_string());
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for hit in vocabulary::MEDICATION.find_iter(clause) {
        if is_negated(clause, hit.start()) {
            continue;
        }
        let name = hit.as_str();
        let generic = ["took", "take", "taken", "had"]
            .iter()
            .any(|verb| name.starts_with(verb));
        let medication = if generic { "unspecified" } else { name };
        if !seen.insert(medication.to_string()) {
            continue;
        }

        // "took 2 imodium"
        let count = clause[..hit.start()]
            .split_whitespace()
            .last()
            .filter(|w| w.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string);

        let (description, confidence) = if generic {
            ("Medication".to_string(), confidence::MEDIUM)
        } else {
            (capitalize(name), confidence::HIGH)
        };
        let mut entry = ParsedLogEntry::new(EntryCategory::Medication, description, at, confidence)
            .with_detail("medication", medication);
        if let Some(dose) = dose.clone().or(count) {
            entry = entry.with_detail("dose", dose);
        }
        entries.push(entry);
    }
    entries
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn meal_entries(
    text: &str,
    clauses: &[Clause],
    mentions: Vec<FoodMention>,
    reference: DateTime<FixedOffset>,
) -> Vec<ParsedLogEntry> {
    if mentions.is_empty() {
        return Vec::new();
    }

    let text_slots = timing::explicit_slots(text);
    let only_slot = (text_slots.len() == 1).then(|| text_slots[0]);

    // slot and time per clause that mentions food
    let mut groups: Vec<(MealSlot, Option<TimeOfDay>, Vec<FoodMention>)> = Vec::new();
    let mut by_clause: Vec<(usize, Vec<FoodMention>)> = Vec::new();
    for mention in mentions {
        match by_clause.last_mut() {
            Some((idx, list)) if *idx == mention.clause => list.push(mention),
            _ => by_clause.push((mention.clause, vec![mention])),
        }
    }

    for (idx, foods) in by_clause {
        let clause = &clauses[idx];
        let explicit = timing::explicit_slot(&clause.text).or(only_slot);
        let slot = explicit.unwrap_or_else(|| {
            MealSlot::from_hour(clause.time.map(|t| t.hour).unwrap_or(reference.hour()))
        });
        let time = clause
            .time
            .or_else(|| explicit.and_then(timing::default_time_for_slot));

        // an untimed clause joins its slot; differently timed clauses stay apart
        let joins = |group_slot: MealSlot, group_time: Option<TimeOfDay>| {
            group_slot == slot && (time.is_none() || group_time.is_none() || group_time == time)
        };
        match groups.iter_mut().find(|(s, t, _)| joins(*s, *t)) {
            Some((_, group_time, list)) => {
                if group_time.is_none() {
                    *group_time = time;
                }
                list.extend(foods);
            }
            None => groups.push((slot, time, foods)),
        }
    }

    groups
        .into_iter()
        .map(|(slot, time, foods)| {
            let names: Vec<String> = foods.iter().map(|m| m.record.name.clone()).collect();
            let details: Vec<Value> = foods
                .iter()
                .map(|m| {
                    let mut food = json!({
                        "name": m.record.name,
                        "food_id": m.record.id,
                        "source": m.record.source,
                        "matched_text": m.matched_text,
                    });
                    if let (Some(amount), Some(obj)) = (&m.amount, food.as_object_mut()) {
                        obj.insert("amount".to_string(), Value::from(amount.as_str()));
                    }
                    food
                })
                .collect();
            ParsedLogEntry::new(
                EntryCategory::Meal(slot),
                names.join(", "),
                stamp(reference, time),
                confidence::HIGH,
            )
            .with_detail("meal_type", slot.as_str())
            .with_detail("foods", details)
            .with_detail("ingredients", names)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reference() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 14, 12, 0, 0)
            .unwrap()
    }

    fn extractor() -> LocalExtractor {
        let config = CoreConfig::default();
        LocalExtractor::new(Arc::new(Aggregator::new(&config)), &config)
    }

    fn of_category(entries: &[ParsedLogEntry], category: EntryCategory) -> Vec<&ParsedLogEntry> {
        entries.iter().filter(|e| e.category == category).collect()
    }

    #[tokio::test]
    async fn test_meal_and_symptom_with_times() {
        let entries = extractor()
            .extract("I had 2 eggs at 8am, felt gassy around 10am", reference())
            .await;

        let meals = of_category(&entries, EntryCategory::Meal(MealSlot::Breakfast));
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].timestamp.hour(), 8);
        assert_eq!(meals[0].description, "Eggs");
        assert_eq!(meals[0].details["foods"][0]["amount"], "2");
        assert_eq!(meals[0].confidence, confidence::HIGH);

        let symptoms = of_category(&entries, EntryCategory::Symptom);
        assert_eq!(symptoms.len(), 1);
        assert_eq!(symptoms[0].details["symptom"], "gas_bloating");
        assert_eq!(symptoms[0].timestamp.hour(), 10);
    }

    #[tokio::test]
    async fn test_unrecognised_text_yields_nothing() {
        assert!(extractor().extract("xyz qqq", reference()).await.is_empty());
        assert!(extractor().extract("   ", reference()).await.is_empty());
    }

    #[tokio::test]
    async fn test_negated_symptom_is_skipped() {
        let entries = extractor().extract("no pain today", reference()).await;
        assert!(of_category(&entries, EntryCategory::Symptom).is_empty());
    }

    #[tokio::test]
    async fn test_severity_qualifier() {
        let entries = extractor()
            .extract("really bad cramps in the evening", reference())
            .await;
        let symptom = &of_category(&entries, EntryCategory::Symptom)[0];
        assert_eq!(symptom.details["symptom"], "pain_cramping");
        assert_eq!(symptom.details["severity"], "severe");
        assert_eq!(symptom.details["severity_score"], 8);
        assert_eq!(symptom.timestamp.hour(), 18);
        assert_eq!(symptom.confidence, confidence::HIGH);
    }

    #[tokio::test]
    async fn test_named_slot_without_time_uses_slot_default() {
        let entries = extractor()
            .extract("had half a bowl of porridge for breakfast", reference())
            .await;
        let meal = &of_category(&entries, EntryCategory::Meal(MealSlot::Breakfast))[0];
        assert_eq!(meal.timestamp.hour(), 8);
        assert_eq!(meal.details["foods"][0]["name"], "Oatmeal");
        assert_eq!(meal.details["foods"][0]["amount"], "half a bowl");
    }

    #[tokio::test]
    async fn test_beverage_follows_the_clock() {
        let entries = extractor().extract("cup of tea at 3pm", reference()).await;
        let lunch = of_category(&entries, EntryCategory::Meal(MealSlot::Lunch));
        assert_eq!(lunch.len(), 1);
        assert_eq!(lunch[0].timestamp.hour(), 15);
        assert!(of_category(&entries, EntryCategory::Meal(MealSlot::Drink)).is_empty());

        let entries = extractor().extract("drank a cup of tea", reference()).await;
        assert_eq!(
            of_category(&entries, EntryCategory::Meal(MealSlot::Drink)).len(),
            1
        );
    }

    #[tokio::test]
    async fn test_same_slot_at_different_times_stays_apart() {
        let entries = extractor()
            .extract("toast at 7am, banana at 10am", reference())
            .await;
        let breakfasts = of_category(&entries, EntryCategory::Meal(MealSlot::Breakfast));
        assert_eq!(breakfasts.len(), 2);
        assert_eq!(breakfasts[0].timestamp.hour(), 7);
        assert_eq!(breakfasts[1].timestamp.hour(), 10);
        assert_ne!(breakfasts[0].description, breakfasts[1].description);
    }

    #[tokio::test]
    async fn test_misspelled_food_is_grounded() {
        let entries = extractor()
            .extract("grilled chiken and rice for dinner", reference())
            .await;
        let meal = &of_category(&entries, EntryCategory::Meal(MealSlot::Dinner))[0];
        let names: Vec<&str> = meal.details["ingredients"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(names, vec!["Chicken Breast", "White Rice"]);
    }

    #[tokio::test]
    async fn test_output_consistency() {
        let entries = extractor()
            .extract("emptied my bag, output was quite loose", reference())
            .await;
        let outputs = of_category(&entries, EntryCategory::Output);
        assert_eq!(outputs.len(), 2);
        assert!(outputs.iter().any(|e| e.details.get("consistency") == Some(&json!("loose"))));
    }

    #[tokio::test]
    async fn test_pouch_change() {
        let entries = extractor().extract("changed my pouch at 7:30pm", reference()).await;
        let outputs = of_category(&entries, EntryCategory::Output);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].details["event"], "pouch_change");
        assert_eq!(outputs[0].timestamp.hour(), 19);
    }

    #[tokio::test]
    async fn test_irrigation_volume_and_result() {
        let entries = extractor()
            .extract("irrigated with 1.5 litres this morning and it worked well", reference())
            .await;
        let irrigation = &of_category(&entries, EntryCategory::Irrigation)[0];
        assert_eq!(irrigation.details["volume_ml"], 1500.0);
        assert_eq!(irrigation.details["result"], "successful");
    }

    #[tokio::test]
    async fn test_medication_with_count() {
        let entries = extractor().extract("took 2 imodium at 9pm", reference()).await;
        let meds = of_category(&entries, EntryCategory::Medication);
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0].details["medication"], "imodium");
        assert_eq!(meds[0].details["dose"], "2");
        assert_eq!(meds[0].timestamp.hour(), 21);
    }

    #[tokio::test]
    async fn test_entries_are_time_ordered() {
        let entries = extractor()
            .extract("bloated at 4pm, toast at 9am", reference())
            .await;
        let hours: Vec<u32> = entries.iter().map(|e| e.timestamp.hour()).collect();
        let mut sorted = hours.clone();
        sorted.sort();
        assert_eq!(hours, sorted);
    }

    #[test]
    fn test_amount_skips_times() {
        assert_eq!(find_amount("at 8 am i had eggs"), None);
        assert_eq!(find_amount("2 slices of toast").as_deref(), Some("2 slices"));
        assert_eq!(find_amount("a small portion of rice").as_deref(), Some("small portion"));
    }

    #[test]
    fn test_negation_window() {
        let clause = "did not feel any pain";
        let start = clause.find("pain").unwrap();
        assert!(!is_negated(clause, start));
        let clause = "not much pain";
        assert!(is_negated(clause, clause.find("pain").unwrap()));
    }
}
