//! Token-set string similarity.
//!
//! Scores are integers in 0..=100. Both inputs are normalized (non-alphanumeric
//! characters become spaces, everything is lower-cased), split into token sets,
//! and compared as:
//!
//! - the sorted intersection,
//! - the intersection followed by the tokens only in the first string,
//! - the intersection followed by the tokens only in the second string.
//!
//! The score is the best pairwise ratio among those three strings, so a line
//! whose tokens are a subset of another's scores 100.

use std::collections::BTreeSet;

/// Token-set similarity of two strings, 0..=100.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    let sect = join(tokens_a.intersection(&tokens_b));
    let diff_ab = join(tokens_a.difference(&tokens_b));
    let diff_ba = join(tokens_b.difference(&tokens_a));

    let combined_ab = concat(&sect, &diff_ab);
    let combined_ba = concat(&sect, &diff_ba);

    ratio(&sect, &combined_ab)
        .max(ratio(&sect, &combined_ba))
        .max(ratio(&combined_ab, &combined_ba))
}

/// Edit-based similarity of two strings, 0..=100.
///
/// Computed as `2 * M / T` where `M` is the length of the longest common
/// subsequence and `T` the combined length. Empty input scores 0.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let matches = lcs_len(&a, &b);
    ((200.0 * matches as f64) / total as f64).round() as u8
}

fn normalize(s: &str) -> String {
    let mapped: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.trim().to_lowercase()
}

fn join<'a>(tokens: impl Iterator<Item = &'a &'a str>) -> String {
    tokens.copied().collect::<Vec<_>>().join(" ")
}

fn concat(sect: &str, diff: &str) -> String {
    format!("{} {}", sect, diff).trim().to_string()
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
