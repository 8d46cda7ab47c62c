//! Near-duplicate line removal.

use super::similarity::token_set_ratio;
use tracing::{debug, info};

/// Default similarity above which two lines are considered duplicates.
pub const DEFAULT_THRESHOLD: u8 = 85;

/// Removes lines that repeat an earlier line with small variations.
///
/// Lines are visited in order. A line is dropped when its token-set similarity
/// to any line already kept is strictly greater than the threshold; the first
/// occurrence always wins. Running the deduplicator on its own output returns
/// the same lines.
#[derive(Debug, Clone, Copy)]
pub struct LineDeduplicator {
    threshold: u8,
}

impl Default for LineDeduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl LineDeduplicator {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Return the lines that survive deduplication, in their original order.
    pub fn dedupe<S: AsRef<str>>(&self, lines: &[S]) -> Vec<String> {
        let mut kept: Vec<String> = Vec::with_capacity(lines.len());

        for line in lines {
            let line = line.as_ref();
            let duplicate_of = kept.iter().find_map(|previous| {
                let score = token_set_ratio(previous, line);
                (score > self.threshold).then(|| (previous.clone(), score))
            });

            match duplicate_of {
                Some((previous, score)) => {
                    info!(
                        "Removing duplicate address line '{}' (matches '{}' with score {})",
                        line, previous, score
                    );
                }
                None => kept.push(line.to_string()),
            }
        }

        debug!("Kept {} of {} address lines", kept.len(), lines.len());
        kept
    }
}

/// Deduplicate with the default threshold.
pub fn dedupe_lines<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    LineDeduplicator::default().dedupe(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::similarity::token_set_ratio;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_removes_later_duplicate() {
        let lines = ["ACME CORP", "123 Main St", "Acme Corp.", "Springfield, IL 62701"];
        assert_eq!(
            dedupe_lines(&lines),
            vec!["ACME CORP", "123 Main St", "Springfield, IL 62701"]
        );
    }

    #[test]
    fn test_first_occurrence_wins() {
        let lines = ["Receiving Dock", "receiving dock"];
        assert_eq!(dedupe_lines(&lines), vec!["Receiving Dock"]);
    }

    #[test]
    fn test_idempotent() {
        let lines = [
            "Acme Industrial Supply",
            "Attn: Purchasing",
            "ACME INDUSTRIAL SUPPLY",
            "500 Commerce Pkwy",
            "500 Commerce Parkway",
            "Dallas, TX 75201",
        ];
        let once = dedupe_lines(&lines);
        let twice = dedupe_lines(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_score_equal_to_threshold_is_kept() {
        let a = "abcdefghij";
        let b = "abcdefghx";
        let score = token_set_ratio(a, b);
        assert_eq!(score, 84);

        assert_eq!(LineDeduplicator::new(84).dedupe(&[a, b]), vec![a, b]);
        assert_eq!(LineDeduplicator::new(83).dedupe(&[a, b]), vec![a]);
    }

    #[test]
    fn test_default_threshold_keeps_84() {
        assert_eq!(dedupe_lines(&["abcdefghij", "abcdefghx"]).len(), 2);
        assert_eq!(dedupe_lines(&["abcdefghij", "abcdefghi"]).len(), 1);
    }

    #[test]
    fn test_empty_lines() {
        let lines: [&str; 0] = [];
        assert!(dedupe_lines(&lines).is_empty());

        // Blank lines never match anything, including each other.
        assert_eq!(dedupe_lines(&["", ""]), vec!["", ""]);
    }
}
