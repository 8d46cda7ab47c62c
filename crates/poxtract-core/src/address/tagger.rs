//! Rule-based US address component tagger.

use super::patterns::{
    ATTENTION_MARKERS, COUNTRY_NAMES, DIRECTIONALS, HASH_IDENTIFIER, HOUSE_NUMBER, OCCUPANCY_TYPES, PO_BOX_TYPES,
    STREET_SUFFIXES, US_STATE_CODES, US_STATE_NAMES, ZIP4, ZIP5, token_key,
};
use super::{AddressLabel, ComponentTagger, TaggedAddress};
use crate::error::AddressError;
use tracing::trace;

/// A whitespace-separated word and the comma/line segment it came from.
#[derive(Debug, Clone)]
struct Token {
    text: String,
    key: String,
    segment: usize,
}

/// Tags US addresses by working backwards from the zip code.
///
/// The last line(s) of an address carry the zip code, the state and the city.
/// Everything before them is split at commas and line breaks into segments,
/// and each segment is read as a PO box, a street line, an occupancy
/// (suite, unit, dock) or recipient text.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsAddressTagger;

impl UsAddressTagger {
    pub fn new() -> Self {
        Self
    }
}

impl ComponentTagger for UsAddressTagger {
    fn tag(&self, address: &str) -> Result<TaggedAddress, AddressError> {
        let tokens = tokenize(address);
        let labels = Labeler::new(&tokens).run();

        let mut runs: Vec<(AddressLabel, Vec<&str>)> = Vec::new();
        for (token, label) in tokens.iter().zip(labels) {
            let Some(label) = label else {
                trace!("Unlabeled address token '{}'", token.text);
                continue;
            };
            match runs.last_mut() {
                Some((last, words)) if *last == label => words.push(&token.text),
                _ => runs.push((label, vec![&token.text])),
            }
        }

        // An attention line belongs to the recipient wherever it appears.
        let mut merged: Vec<(AddressLabel, Vec<&str>)> = Vec::with_capacity(runs.len());
        for (label, words) in runs {
            if label == AddressLabel::Recipient && is_attention(&words) {
                if let Some((_, earlier)) = merged.iter_mut().find(|(l, _)| *l == label) {
                    earlier.extend(words);
                    continue;
                }
            }
            merged.push((label, words));
        }
        let runs = merged;

        let mut tagged = TaggedAddress::new();
        for (i, (label, words)) in runs.iter().enumerate() {
            let text = component_text(words);
            if let Some((_, earlier)) = runs[..i].iter().find(|(l, _)| l == label) {
                return Err(AddressError::Ambiguous {
                    label: label.to_string(),
                    first: component_text(earlier),
                    second: text,
                });
            }
            tagged.push(*label, text);
        }

        Ok(tagged)
    }

    fn name(&self) -> &str {
        "us-rules"
    }
}

fn is_attention(words: &[&str]) -> bool {
    let Some(first) = words.first() else {
        return false;
    };
    let key = token_key(first);
    let key = key.trim_end_matches(':');
    ATTENTION_MARKERS.contains(key)
        || (key == "CARE" && words.get(1).is_some_and(|w| token_key(w).trim_end_matches(':') == "OF"))
}

fn component_text(words: &[&str]) -> String {
    words
        .join(" ")
        .trim_end_matches([',', ';'])
        .trim()
        .to_string()
}

fn tokenize(address: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut segment = 0;

    for line in address.lines() {
        for part in line.split([',', ';']) {
            let before = tokens.len();
            for word in part.split_whitespace() {
                tokens.push(Token {
                    text: word.to_string(),
                    key: token_key(word),
                    segment,
                });
            }
            if tokens.len() > before {
                segment += 1;
            }
        }
    }

    tokens
}

struct Labeler<'a> {
    tokens: &'a [Token],
    labels: Vec<Option<AddressLabel>>,
}

impl<'a> Labeler<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            labels: vec![None; tokens.len()],
        }
    }

    fn run(mut self) -> Vec<Option<AddressLabel>> {
        let end = self.tag_country();
        let zip = self.tag_zip(end);
        let state = self.tag_state(zip, end);

        // The city sits right before the state, or before the zip if there is no state.
        let anchor = state.or(zip);
        let place_start = match anchor {
            Some(anchor) => self.tag_place(anchor),
            None => None,
        };

        let delivery_end = place_start.or(anchor).unwrap_or(end);
        for group in self.unlabeled_groups(delivery_end) {
            self.tag_group(&group);
        }

        self.labels
    }

    fn len(&self) -> usize {
        self.tokens.len()
    }

    fn key(&self, idx: usize) -> &str {
        &self.tokens[idx].key
    }

    fn segment(&self, idx: usize) -> usize {
        self.tokens[idx].segment
    }

    fn set(&mut self, range: impl IntoIterator<Item = usize>, label: AddressLabel) {
        for idx in range {
            self.labels[idx] = Some(label);
        }
    }

    /// Indices of the tokens in one segment, in order.
    fn segment_tokens(&self, segment: usize) -> Vec<usize> {
        (0..self.len()).filter(|&i| self.segment(i) == segment).collect()
    }

    fn is_segment_end(&self, idx: usize, end: usize) -> bool {
        idx + 1 >= end || self.segment(idx + 1) != self.segment(idx)
    }

    /// Label a trailing country name. Returns the end of the address proper.
    fn tag_country(&mut self) -> usize {
        let Some(last) = self.tokens.last() else {
            return 0;
        };
        let segment = self.segment_tokens(last.segment);

        for len in (1..=segment.len().min(4)).rev() {
            let suffix = &segment[segment.len() - len..];
            let name = suffix
                .iter()
                .map(|&i| self.key(i))
                .collect::<Vec<_>>()
                .join(" ");
            if suffix[0] > 0 && COUNTRY_NAMES.contains(name.as_str()) {
                let start = suffix[0];
                self.set(suffix.iter().copied(), AddressLabel::CountryName);
                return start;
            }
        }

        self.len()
    }

    /// Label the last zip code that closes a segment. Returns its index.
    fn tag_zip(&mut self, end: usize) -> Option<usize> {
        for idx in (0..end).rev() {
            if !ZIP5.is_match(self.key(idx)) {
                continue;
            }

            if self.is_segment_end(idx, end) {
                self.set([idx], AddressLabel::ZipCode);
                return Some(idx);
            }

            let next = idx + 1;
            if ZIP4.is_match(self.key(next)) && self.is_segment_end(next, end) {
                self.set([idx, next], AddressLabel::ZipCode);
                return Some(idx);
            }
        }
        None
    }

    /// Label the state before the zip, or the last token when no zip was found.
    /// Returns the index of the first state token.
    fn tag_state(&mut self, zip: Option<usize>, end: usize) -> Option<usize> {
        let last = match zip {
            Some(0) => return None,
            Some(z) => z - 1,
            None => {
                let last = end.checked_sub(1)?;
                // Without a zip, only trust a state that closes a later segment
                // which does not itself start like a street line.
                let segment = self.segment(last);
                let first = *self.segment_tokens(segment).first()?;
                if segment == 0 || HOUSE_NUMBER.is_match(self.key(first)) {
                    return None;
                }
                last
            }
        };

        if self.labels[last].is_some() {
            return None;
        }

        let start = self.match_state_name(last).or_else(|| {
            US_STATE_CODES
                .contains(self.key(last))
                .then_some(last)
        })?;

        self.set(start..=last, AddressLabel::StateName);
        Some(start)
    }

    /// Longest full state name ending at `last`, within one segment.
    fn match_state_name(&self, last: usize) -> Option<usize> {
        US_STATE_NAMES
            .iter()
            .filter(|words| words.len() <= last + 1)
            .filter(|words| {
                let start = last + 1 - words.len();
                words.iter().enumerate().all(|(offset, word)| {
                    let idx = start + offset;
                    self.key(idx) == *word && self.segment(idx) == self.segment(last)
                })
            })
            .map(|words| last + 1 - words.len())
            .min()
    }

    /// Label the city before `anchor`. Returns the index of its first token.
    fn tag_place(&mut self, anchor: usize) -> Option<usize> {
        let segment = self.segment(anchor);
        let before: Vec<usize> = (0..anchor)
            .filter(|&i| self.segment(i) == segment && self.labels[i].is_none())
            .collect();

        let place: Vec<usize> = if before.is_empty() {
            // "Springfield\nIL 62701": the city is the whole previous segment.
            let previous = self.segment_tokens(segment.checked_sub(1)?);
            let first = *previous.first()?;
            if self.starts_delivery(first) || self.starts_occupancy(first, &previous) {
                return None;
            }
            previous
        } else if let Some(pos) = before.iter().position(|&idx| self.starts_delivery(idx)) {
            // "Acme Corp 123 Main St Springfield IL": the city follows the street
            // line; words before the street are left for the recipient.
            let delivery = &before[pos..];
            let cut = self.delivery_tail(delivery)?;
            delivery[cut + 1..].to_vec()
        } else {
            before
        };

        let first = *place.first()?;
        self.set(place, AddressLabel::PlaceName);
        Some(first)
    }

    /// Position in `tokens` of the last word that ends a street or box line.
    fn delivery_tail(&self, tokens: &[usize]) -> Option<usize> {
        let mut tail = None;
        for (pos, &idx) in tokens.iter().enumerate().skip(1) {
            let previous = self.key(tokens[pos - 1]);
            if STREET_SUFFIXES.contains(self.key(idx))
                || OCCUPANCY_TYPES.contains(previous)
                || previous == "BOX"
                || HASH_IDENTIFIER.is_match(&self.tokens[idx].text)
            {
                tail = Some(pos);
            } else if tail == Some(pos - 1) && DIRECTIONALS.contains(self.key(idx)) {
                tail = Some(pos);
            }
        }

        match tail {
            Some(pos) if pos + 1 < tokens.len() => Some(pos),
            // Nothing marks the end of the street: keep only the last word as the city.
            None if tokens.len() > 1 => Some(tokens.len() - 2),
            _ => None,
        }
    }

    fn starts_delivery(&self, idx: usize) -> bool {
        let window: Vec<usize> = (idx..self.len().min(idx + 3)).collect();
        HOUSE_NUMBER.is_match(self.key(idx)) || self.box_type_len(&window, 0).is_some()
    }

    fn starts_occupancy(&self, idx: usize, group: &[usize]) -> bool {
        let Some(pos) = group.iter().position(|&i| i == idx) else {
            return false;
        };
        self.occupancy_at(group, pos)
    }

    /// Consecutive unlabeled tokens before `end`, split at segment boundaries.
    fn unlabeled_groups(&self, end: usize) -> Vec<Vec<usize>> {
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut current: Vec<usize> = Vec::new();

        for idx in 0..end {
            let breaks = self.labels[idx].is_some()
                || current
                    .last()
                    .is_some_and(|&last| self.segment(last) != self.segment(idx));
            if breaks && !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
            if self.labels[idx].is_none() {
                current.push(idx);
            }
        }
        if !current.is_empty() {
            groups.push(current);
        }

        groups
    }

    fn tag_group(&mut self, group: &[usize]) {
        let words: Vec<&str> = group.iter().map(|&i| self.tokens[i].text.as_str()).collect();
        if is_attention(&words) {
            self.set(group.iter().copied(), AddressLabel::Recipient);
            return;
        }

        if let Some((pos, len)) = self.find_box(group) {
            self.set(group[..pos].iter().copied(), AddressLabel::Recipient);
            self.tag_box(group, pos, len);
            return;
        }

        let street_start = group.iter().enumerate().position(|(pos, &idx)| {
            HOUSE_NUMBER.is_match(self.key(idx)) && pos + 1 < group.len()
        });
        if let Some(pos) = street_start {
            self.set(group[..pos].iter().copied(), AddressLabel::Recipient);
            self.tag_street(&group[pos..]);
            return;
        }

        if self.occupancy_at(group, 0) {
            self.tag_occupancy(group);
            return;
        }

        if group.len() == 1 && HOUSE_NUMBER.is_match(self.key(group[0])) {
            self.set([group[0]], AddressLabel::AddressNumber);
            return;
        }

        self.set(group.iter().copied(), AddressLabel::Recipient);
    }

    /// Number of tokens forming a box type ("PO BOX", "P O BOX", ...) at `pos`.
    fn box_type_len(&self, group: &[usize], pos: usize) -> Option<usize> {
        for len in [3, 2, 1] {
            let Some(words) = group.get(pos..pos + len) else {
                continue;
            };
            let keys: Vec<&str> = words.iter().map(|&i| self.key(i)).collect();
            let matches = PO_BOX_TYPES
                .get(&len)
                .is_some_and(|spellings| spellings.iter().any(|s| *s == keys));
            if matches {
                return Some(len);
            }
        }
        None
    }

    fn find_box(&self, group: &[usize]) -> Option<(usize, usize)> {
        (0..group.len()).find_map(|pos| {
            let len = self.box_type_len(group, pos)?;
            // A bare "BOX" only counts when a number follows.
            if len == 1 && self.key(group[pos]) == "BOX" {
                let next = group.get(pos + 1)?;
                if !self.key(*next).starts_with(|c: char| c.is_ascii_digit()) {
                    return None;
                }
            }
            Some((pos, len))
        })
    }

    fn tag_box(&mut self, group: &[usize], pos: usize, len: usize) {
        let type_end = pos + len;
        self.set(group[pos..type_end].iter().copied(), AddressLabel::UspsBoxType);

        let mut id_end = type_end;
        if group.get(id_end).is_some_and(|&i| self.key(i) == "#") {
            id_end += 1;
        }
        if id_end < group.len() {
            id_end += 1;
        }
        self.set(group[type_end..id_end].iter().copied(), AddressLabel::UspsBoxId);

        if id_end < group.len() && self.occupancy_at(group, id_end) {
            self.tag_occupancy(&group[id_end..]);
        }
    }

    fn tag_street(&mut self, street: &[usize]) {
        self.set([street[0]], AddressLabel::AddressNumber);

        let mut name_start = 1;
        if let Some(&next) = street.get(1) {
            let has_name_after = street.get(2).is_some_and(|&after| {
                !STREET_SUFFIXES.contains(self.key(after)) && !self.occupancy_at(street, 2)
            });
            if DIRECTIONALS.contains(self.key(next)) && has_name_after {
                self.set([next], AddressLabel::StreetNamePreDirectional);
                name_start = 2;
            }
        }

        let occupancy = (name_start + 1..street.len()).find(|&pos| self.occupancy_at(street, pos));
        let name_end = occupancy.unwrap_or(street.len());
        let mut name = &street[name_start..name_end];

        let mut post_directional = None;
        if name.len() >= 2 {
            if let Some((&last, rest)) = name.split_last() {
                if DIRECTIONALS.contains(self.key(last)) {
                    post_directional = Some(last);
                    name = rest;
                }
            }
        }

        let mut post_type = None;
        if name.len() >= 2 {
            if let Some((&last, rest)) = name.split_last() {
                if STREET_SUFFIXES.contains(self.key(last)) {
                    post_type = Some(last);
                    name = rest;
                }
            }
        }

        self.set(name.iter().copied(), AddressLabel::StreetName);
        if let Some(idx) = post_type {
            self.set([idx], AddressLabel::StreetNamePostType);
        }
        if let Some(idx) = post_directional {
            self.set([idx], AddressLabel::StreetNamePostDirectional);
        }
        if let Some(pos) = occupancy {
            self.tag_occupancy(&street[pos..]);
        }
    }

    /// Whether an occupancy ("Suite 4", "Apt 2B", "# 7", "#7") starts at `pos`.
    fn occupancy_at(&self, group: &[usize], pos: usize) -> bool {
        let Some(&idx) = group.get(pos) else {
            return false;
        };
        if HASH_IDENTIFIER.is_match(&self.tokens[idx].text) {
            return true;
        }
        if !OCCUPANCY_TYPES.contains(self.key(idx)) {
            return false;
        }

        let ids = &group[pos + 1..];
        match ids {
            [] => false,
            [id, ..] if self.key(idx) == "#" => !self.key(*id).is_empty(),
            [id] => looks_like_identifier(&self.tokens[*id].text),
            [first, second] => {
                looks_like_identifier(&self.tokens[*first].text)
                    || (self.key(*first) == "#"
                        && looks_like_identifier(&self.tokens[*second].text))
            }
            [first, ..] => {
                // Only the first word can be the identifier when more text follows.
                looks_like_identifier(&self.tokens[*first].text)
            }
        }
    }

    fn tag_occupancy(&mut self, tokens: &[usize]) {
        let Some((&first, rest)) = tokens.split_first() else {
            return;
        };

        if HASH_IDENTIFIER.is_match(&self.tokens[first].text) {
            self.set([first], AddressLabel::OccupancyIdentifier);
            self.set(rest.iter().copied(), AddressLabel::OccupancyIdentifier);
            return;
        }

        if self.key(first) == "#" {
            self.set(tokens.iter().copied(), AddressLabel::OccupancyIdentifier);
            return;
        }

        self.set([first], AddressLabel::OccupancyType);
        self.set(rest.iter().copied(), AddressLabel::OccupancyIdentifier);
    }
}

/// Short or numeric words like "4", "2B", "A", "#7".
fn looks_like_identifier(word: &str) -> bool {
    let word = word.trim_start_matches('#');
    !word.is_empty() && (word.chars().any(|c| c.is_ascii_digit()) || word.chars().count() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tag(text: &str) -> TaggedAddress {
        UsAddressTagger::new().tag(text).unwrap()
    }

    fn pairs(tagged: &TaggedAddress) -> Vec<(&'static str, &str)> {
        tagged
            .components()
            .iter()
            .map(|(label, text)| (label.as_str(), text.as_str()))
            .collect()
    }

    #[test]
    fn test_street_address() {
        let tagged = tag("Acme Corp\n123 Main St\nSpringfield, IL 62701");
        assert_eq!(
            pairs(&tagged),
            vec![
                ("Recipient", "Acme Corp"),
                ("AddressNumber", "123"),
                ("StreetName", "Main"),
                ("StreetNamePostType", "St"),
                ("PlaceName", "Springfield"),
                ("StateName", "IL"),
                ("ZipCode", "62701"),
            ]
        );
    }

    #[test]
    fn test_directionals_and_suite() {
        let tagged = tag("400 N Lake Shore Dr NW, Suite 210\nChicago, IL 60611-4402");
        assert_eq!(
            pairs(&tagged),
            vec![
                ("AddressNumber", "400"),
                ("StreetNamePreDirectional", "N"),
                ("StreetName", "Lake Shore"),
                ("StreetNamePostType", "Dr"),
                ("StreetNamePostDirectional", "NW"),
                ("OccupancyType", "Suite"),
                ("OccupancyIdentifier", "210"),
                ("PlaceName", "Chicago"),
                ("StateName", "IL"),
                ("ZipCode", "60611-4402"),
            ]
        );
    }

    #[test]
    fn test_directional_as_street_name() {
        let tagged = tag("12 North St\nSalem, MA 01970");
        assert_eq!(tagged.get(AddressLabel::StreetName), Some("North"));
        assert_eq!(tagged.get(AddressLabel::StreetNamePreDirectional), None);
        assert_eq!(tagged.get(AddressLabel::ZipCode), Some("01970"));
    }

    #[test]
    fn test_po_box() {
        let tagged = tag("Acme Corp\nP.O. Box 452\nDallas, TX 75201");
        assert_eq!(tagged.get(AddressLabel::UspsBoxType), Some("P.O. Box"));
        assert_eq!(tagged.get(AddressLabel::UspsBoxId), Some("452"));
        assert_eq!(tagged.get(AddressLabel::PlaceName), Some("Dallas"));
        assert_eq!(tagged.get(AddressLabel::Recipient), Some("Acme Corp"));
    }

    #[test]
    fn test_po_box_spellings() {
        for (text, box_type) in [
            ("PO BOX 12, Austin, TX 78701", "PO BOX"),
            ("POBox 12, Austin, TX 78701", "POBox"),
            ("Post Office Box 12, Austin, TX 78701", "Post Office Box"),
        ] {
            let tagged = tag(text);
            assert_eq!(tagged.get(AddressLabel::UspsBoxType), Some(box_type), "{}", text);
            assert_eq!(tagged.get(AddressLabel::UspsBoxId), Some("12"), "{}", text);
        }
    }

    #[test]
    fn test_full_state_name_and_multiword_city() {
        let tagged = tag("77 Harbor Rd\nNew York, New York 10001");
        assert_eq!(tagged.get(AddressLabel::PlaceName), Some("New York"));
        assert_eq!(tagged.get(AddressLabel::StateName), Some("New York"));

        let tagged = tag("9 Elm Ave\nSan Antonio TX 78205");
        assert_eq!(tagged.get(AddressLabel::PlaceName), Some("San Antonio"));
    }

    #[test]
    fn test_single_line() {
        let tagged = tag("123 Main St Springfield IL 62701");
        assert_eq!(tagged.get(AddressLabel::StreetNamePostType), Some("St"));
        assert_eq!(tagged.get(AddressLabel::PlaceName), Some("Springfield"));
        assert_eq!(tagged.get(AddressLabel::StateName), Some("IL"));
    }

    #[test]
    fn test_single_line_with_recipient() {
        let tagged = tag("Acme Corp 123 Main St Springfield IL 62701");
        assert_eq!(
            pairs(&tagged),
            vec![
                ("Recipient", "Acme Corp"),
                ("AddressNumber", "123"),
                ("StreetName", "Main"),
                ("StreetNamePostType", "St"),
                ("PlaceName", "Springfield"),
                ("StateName", "IL"),
                ("ZipCode", "62701"),
            ]
        );
    }

    #[test]
    fn test_attention_line_joins_recipient() {
        let tagged = tag("Acme Corp\n123 Main St\nAttn: Receiving\nSpringfield, IL 62701");
        assert_eq!(
            tagged.get(AddressLabel::Recipient),
            Some("Acme Corp Attn: Receiving")
        );
        assert_eq!(tagged.get(AddressLabel::AddressNumber), Some("123"));

        let tagged = tag("Acme Corp\n9 Elm Ave\nc/o Dock 4 Team\nSalem, MA 01970");
        assert_eq!(
            tagged.get(AddressLabel::Recipient),
            Some("Acme Corp c/o Dock 4 Team")
        );
    }

    #[test]
    fn test_standalone_occupancy_segment() {
        let tagged = tag("500 Commerce Pkwy\nBldg C\nDallas, TX 75201 USA");
        assert_eq!(tagged.get(AddressLabel::OccupancyType), Some("Bldg"));
        assert_eq!(tagged.get(AddressLabel::OccupancyIdentifier), Some("C"));
        assert_eq!(tagged.get(AddressLabel::ZipCode), Some("75201"));
    }

    #[test]
    fn test_hash_occupancy() {
        let tagged = tag("88 Pine St #7\nSeattle, WA 98101");
        assert_eq!(tagged.get(AddressLabel::OccupancyIdentifier), Some("#7"));
        assert_eq!(tagged.get(AddressLabel::StreetName), Some("Pine"));
    }

    #[test]
    fn test_country_segment() {
        let tagged = tag("1 Infinite Loop, Cupertino, CA 95014, USA");
        assert_eq!(tagged.get(AddressLabel::CountryName), Some("USA"));
        assert_eq!(tagged.get(AddressLabel::PlaceName), Some("Cupertino"));
    }

    #[test]
    fn test_two_street_lines_are_ambiguous() {
        let err = UsAddressTagger::new()
            .tag("123 Main St\n456 Oak Ave\nSpringfield, IL 62701")
            .unwrap_err();
        assert_eq!(
            err,
            AddressError::Ambiguous {
                label: "AddressNumber".to_string(),
                first: "123".to_string(),
                second: "456".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_text() {
        assert!(tag("").is_empty());
        assert!(tag("   \n ").is_empty());
    }

    #[test]
    fn test_recipient_only() {
        let tagged = tag("Receiving Department");
        assert_eq!(tagged.get(AddressLabel::Recipient), Some("Receiving Department"));
    }
}
