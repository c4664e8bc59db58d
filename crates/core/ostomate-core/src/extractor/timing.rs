//! Time-of-day and meal-slot cues in free text

use crate::types::MealSlot;
use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// A wall-clock time recovered from text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    /// Hour, 0-23
    pub hour: u32,
    /// Minute, 0-59
    pub minute: u32,
}

impl TimeOfDay {
    /// Construct, rejecting out-of-range values
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }
}

static CLOCK_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2}):([0-5]\d)\s*(a\.m\.?|p\.m\.?|am\b|pm\b)?").expect("valid regex")
});

static BARE_HOUR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})\s*(a\.m\.?|p\.m\.?|am\b|pm\b)").expect("valid regex")
});

static DOTTED_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})\.([0-5]\d)(?:\s*(a\.m\.?|p\.m\.?|am\b|pm\b)|\b)").expect("valid regex")
});

static DAY_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(early morning|morning|noon|midday|lunchtime|afternoon|evening|tonight|midnight|bedtime|night)\b")
        .expect("valid regex")
});

static SLOT_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(breakfast|brunch|lunch|dinner|supper|snack|snacks|snacked|drink|drank)\b")
        .expect("valid regex")
});

/// Words that, directly before a dotted number, mark it as a time
const DOTTED_LEADS: [&str; 5] = ["at", "around", "about", "by", "till"];

fn apply_meridiem(hour: u32, meridiem: Option<&str>) -> Option<u32> {
    match meridiem.map(|m| m.starts_with('p')) {
        None => (hour < 24).then_some(hour),
        Some(is_pm) => {
            if hour == 0 || hour > 12 {
                return None;
            }
            Some(match (is_pm, hour) {
                (false, 12) => 0,
                (false, h) => h,
                (true, 12) => 12,
                (true, h) => h + 12,
            })
        }
    }
}

fn from_captures(caps: &Captures<'_>, minute_group: Option<usize>, meridiem_group: usize) -> Option<TimeOfDay> {
    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = match minute_group {
        Some(g) => caps.get(g)?.as_str().parse().ok()?,
        None => 0,
    };
    let hour = apply_meridiem(hour, caps.get(meridiem_group).map(|m| m.as_str()))?;
    TimeOfDay::new(hour, minute)
}

fn clock_time(text: &str) -> Option<TimeOfDay> {
    CLOCK_TIME
        .captures_iter(text)
        .find_map(|caps| from_captures(&caps, Some(2), 3))
}

fn bare_hour(text: &str) -> Option<TimeOfDay> {
    BARE_HOUR.captures_iter(text).find_map(|caps| {
        let start = caps.get(0)?.start();
        // minutes of "8.10pm" are not an hour
        if matches!(text[..start].chars().last(), Some('.') | Some(':')) {
            return None;
        }
        from_captures(&caps, None, 2)
    })
}

fn dotted_time(text: &str) -> Option<TimeOfDay> {
    DOTTED_TIME.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        let has_meridiem = caps.get(3).is_some();
        let led = text[..whole.start()]
            .split_whitespace()
            .last()
            .map(|w| DOTTED_LEADS.contains(&w))
            .unwrap_or(false);
        if !has_meridiem && !led {
            // "1.25 cups" is a quantity, not a time
            return None;
        }
        from_captures(&caps, Some(2), 3)
    })
}

fn day_part(text: &str) -> Option<TimeOfDay> {
    let word = DAY_PART.captures(text)?.get(1)?.as_str();
    let (hour, minute) = match word {
        "early morning" => (6, 0),
        "morning" => (8, 0),
        "noon" | "midday" | "lunchtime" => (12, 0),
        "afternoon" => (15, 0),
        "evening" => (18, 0),
        "tonight" | "bedtime" | "night" => (21, 0),
        "midnight" => (0, 0),
        _ => return None,
    };
    TimeOfDay::new(hour, minute)
}

/// Ordered time matchers; the first one that finds anything wins
const MATCHERS: [fn(&str) -> Option<TimeOfDay>; 4] = [clock_time, bare_hour, dotted_time, day_part];

/// Find a time of day in (lowercased) text
pub fn find_time(text: &str) -> Option<TimeOfDay> {
    let text = text.to_lowercase();
    MATCHERS.iter().find_map(|matcher| matcher(&text))
}

/// The reference date at the given wall-clock time, in the reference offset
pub fn on_reference_day(reference: DateTime<FixedOffset>, time: TimeOfDay) -> DateTime<FixedOffset> {
    let Some(naive_time) = NaiveTime::from_hms_opt(time.hour, time.minute, 0) else {
        return reference;
    };
    let naive = reference.date_naive().and_time(naive_time);
    reference
        .offset()
        .from_local_datetime(&naive)
        .single()
        .unwrap_or(reference)
}

/// First meal slot named explicitly in the text
pub fn explicit_slot(text: &str) -> Option<MealSlot> {
    let text = text.to_lowercase();
    let word = SLOT_WORD.captures(&text)?.get(1)?.as_str().to_string();
    slot_for_word(&word)
}

/// Every distinct meal slot named in the text, in order of appearance
pub fn explicit_slots(text: &str) -> Vec<MealSlot> {
    let text = text.to_lowercase();
    let mut slots = Vec::new();
    for caps in SLOT_WORD.captures_iter(&text) {
        if let Some(slot) = caps.get(1).and_then(|m| slot_for_word(m.as_str())) {
            if !slots.contains(&slot) {
                slots.push(slot);
            }
        }
    }
    slots
}

fn slot_for_word(word: &str) -> Option<MealSlot> {
    match word {
        "breakfast" | "brunch" => Some(MealSlot::Breakfast),
        "lunch" => Some(MealSlot::Lunch),
        "dinner" | "supper" => Some(MealSlot::Dinner),
        "snack" | "snacks" | "snacked" => Some(MealSlot::Snack),
        "drink" | "drank" => Some(MealSlot::Drink),
        _ => None,
    }
}

/// Typical time for a slot, used when the text names a slot but no time
pub fn default_time_for_slot(slot: MealSlot) -> Option<TimeOfDay> {
    match slot {
        MealSlot::Breakfast => TimeOfDay::new(8, 0),
        MealSlot::Lunch => TimeOfDay::new(12, 30),
        MealSlot::Dinner => TimeOfDay::new(18, 30),
        MealSlot::Snack | MealSlot::Drink => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn t(hour: u32, minute: u32) -> Option<TimeOfDay> {
        TimeOfDay::new(hour, minute)
    }

    #[test]
    fn test_clock_time_variants() {
        assert_eq!(find_time("lunch at 12:45"), t(12, 45));
        assert_eq!(find_time("woke at 7:05am"), t(7, 5));
        assert_eq!(find_time("dinner 7:30 PM"), t(19, 30));
        assert_eq!(find_time("12:10 a.m. snack"), t(0, 10));
    }

    #[test]
    fn test_bare_hour() {
        assert_eq!(find_time("I had 2 eggs at 8am"), t(8, 0));
        assert_eq!(find_time("around 3 pm"), t(15, 0));
        assert_eq!(find_time("12pm"), t(12, 0));
        assert_eq!(find_time("8 amazing eggs"), None);
    }

    #[test]
    fn test_dotted_time_needs_context() {
        assert_eq!(find_time("at 8.30"), t(8, 30));
        assert_eq!(find_time("6.15pm walk"), t(18, 15));
        assert_eq!(find_time("at 8.10pm"), t(20, 10));
        assert_eq!(find_time("1.25 cups of rice"), None);
    }

    #[test]
    fn test_day_parts() {
        assert_eq!(find_time("this morning I had toast"), t(8, 0));
        assert_eq!(find_time("cramps in the evening"), t(18, 0));
        assert_eq!(find_time("woke at midnight"), t(0, 0));
    }

    #[test]
    fn test_matcher_order_beats_position() {
        // the day-part appears first but explicit times take precedence
        assert_eq!(find_time("morning coffee, then eggs at 9:15"), t(9, 15));
    }

    #[test]
    fn test_invalid_hours_are_skipped() {
        assert_eq!(find_time("at 25:00"), None);
        assert_eq!(find_time("13pm then 4pm"), t(16, 0));
    }

    #[test]
    fn test_on_reference_day_keeps_date_and_offset() {
        let reference = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 9, 12, 0, 0)
            .unwrap();
        let at = on_reference_day(reference, TimeOfDay::new(8, 0).unwrap());
        assert_eq!(at.date_naive(), reference.date_naive());
        assert_eq!(at.hour(), 8);
        assert_eq!(at.offset(), reference.offset());
    }

    #[test]
    fn test_explicit_slots() {
        assert_eq!(explicit_slot("toast for Breakfast"), Some(MealSlot::Breakfast));
        assert_eq!(explicit_slot("nothing here"), None);
        assert_eq!(
            explicit_slots("lunch was soup, dinner was pasta, lunch again"),
            vec![MealSlot::Lunch, MealSlot::Dinner]
        );
    }
}
