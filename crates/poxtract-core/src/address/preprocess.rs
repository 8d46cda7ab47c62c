//! Address text cleanup before component tagging.

use super::dedup::LineDeduplicator;
use super::patterns::CITY_STATE_ZIP;
use tracing::debug;

/// Cuts address text after its city/state/zip line and removes repeated lines.
///
/// Purchase orders often print the ship-to block next to other columns, so the
/// extracted address carries trailing noise. Everything after the first line
/// that looks like "City, ST 12345" is dropped. When no such line exists all
/// lines are kept. Either way near-duplicate lines are removed and the result
/// is joined with newlines.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressPreprocessor {
    dedup: LineDeduplicator,
}

impl AddressPreprocessor {
    pub fn new(dedup: LineDeduplicator) -> Self {
        Self { dedup }
    }

    pub fn preprocess(&self, address: &str) -> String {
        // `lines()` would drop a trailing empty line.
        let lines: Vec<&str> = address.split('\n').map(str::trim).collect();

        let end = lines.iter().position(|line| CITY_STATE_ZIP.is_match(line));
        let relevant = match end {
            Some(idx) => {
                debug!("City/state/zip found on line {}, truncating", idx + 1);
                &lines[..=idx]
            }
            None => &lines[..],
        };

        self.dedup.dedupe(relevant).join("\n")
    }
}

/// Preprocess with the default deduplication threshold.
pub fn preprocess_address(address: &str) -> String {
    AddressPreprocessor::default().preprocess(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truncates_after_city_state_zip() {
        let raw = "Acme Corp\n123 Main St\nSpringfield, IL 62701\nPhone: 555-0100\nFax: 555-0101";
        assert_eq!(
            preprocess_address(raw),
            "Acme Corp\n123 Main St\nSpringfield, IL 62701"
        );
    }

    #[test]
    fn test_first_matching_line_is_the_cut() {
        let raw = "PO Box 452\nDallas, TX 75201\nAustin, TX 78701";
        assert_eq!(preprocess_address(raw), "PO Box 452\nDallas, TX 75201");
    }

    #[test]
    fn test_repeated_city_state_zip_cut_at_first() {
        let raw = "123 Main St\nSpringfield, IL 62701\nRemit To: Billing Dept\nSpringfield, IL 62701";
        assert_eq!(preprocess_address(raw), "123 Main St\nSpringfield, IL 62701");
    }

    #[test]
    fn test_without_city_state_zip_keeps_all_lines() {
        let raw = "Acme Corp\n  123 Main St  \nACME CORP\nDock 4";
        assert_eq!(preprocess_address(raw), "Acme Corp\n123 Main St\nDock 4");
    }

    #[test]
    fn test_duplicates_removed_before_cut() {
        let raw = "Acme Corp\nACME CORP.\n77 Industrial Way\nToledo, OH 43604-1234";
        assert_eq!(
            preprocess_address(raw),
            "Acme Corp\n77 Industrial Way\nToledo, OH 43604-1234"
        );
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "Acme Corp\n123 Main St\nSpringfield, IL 62701\nSpringfield, IL 62701",
            "Receiving\nreceiving\n1 Elm St",
            "",
            "Springfield IL\nSpringfield, IL 62701\nextra",
            "Acme Corp\n123 Main St\n\n",
            "Receiving\r\nreceiving\r\n1 Elm St\r\n",
        ];
        for raw in inputs {
            let once = preprocess_address(raw);
            assert_eq!(preprocess_address(&once), once, "input: {:?}", raw);
        }
    }

    #[test]
    fn test_trailing_blank_lines_kept() {
        assert_eq!(
            preprocess_address("Acme Corp\n123 Main St\n\n"),
            "Acme Corp\n123 Main St\n\n"
        );
        assert_eq!(preprocess_address("Dock 4\r\n"), "Dock 4\n");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(preprocess_address(""), "");
    }
}
