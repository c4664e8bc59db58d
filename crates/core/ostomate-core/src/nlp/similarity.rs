//! Edit-distance based string similarity

use std::cmp::{max, min};

/// Levenshtein distance over Unicode scalar values
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == *cb { 0 } else { 1 };
            curr[j + 1] = min(min(curr[j] + 1, prev[j + 1] + 1), prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Similarity in [0, 1] between two strings after case-folding and trimming.
///
/// `1 - distance / max(len)`; two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f32 {
    let a = super::fold(a);
    let b = super::fold(b);
    let max_len = max(a.chars().count(), b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let dist = edit_distance(&a, &b) as f32;
    1.0 - (dist / max_len as f32)
}
