//! Assembles `ParsedAddress` values from raw address text.

use super::patterns::PO_BOX_MARKER;
use super::{
    AddressLabel, AddressPreprocessor, ComponentTagger, LineDeduplicator, TaggedAddress,
    UsAddressTagger,
};
use crate::error::AddressError;
use crate::models::order::ParsedAddress;
use tracing::debug;

const STREET_LABELS: [AddressLabel; 5] = [
    AddressLabel::AddressNumber,
    AddressLabel::StreetNamePreDirectional,
    AddressLabel::StreetName,
    AddressLabel::StreetNamePostType,
    AddressLabel::StreetNamePostDirectional,
];

const PO_BOX_LABELS: [AddressLabel; 2] = [AddressLabel::UspsBoxType, AddressLabel::UspsBoxId];

const OCCUPANCY_LABELS: [AddressLabel; 2] = [
    AddressLabel::OccupancyType,
    AddressLabel::OccupancyIdentifier,
];

/// Turns raw address text into a normalized `ParsedAddress`.
///
/// The text is first cleaned by [`AddressPreprocessor`], then split into
/// components by a [`ComponentTagger`].
pub struct AddressParser {
    preprocessor: AddressPreprocessor,
    tagger: Box<dyn ComponentTagger>,
}

impl Default for AddressParser {
    fn default() -> Self {
        Self::new(Box::new(UsAddressTagger::new()))
    }
}

impl std::fmt::Debug for AddressParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressParser")
            .field("preprocessor", &self.preprocessor)
            .field("tagger", &self.tagger.name())
            .finish()
    }
}

impl AddressParser {
    /// Create a parser using the given tagger and the default line cleanup.
    pub fn new(tagger: Box<dyn ComponentTagger>) -> Self {
        Self {
            preprocessor: AddressPreprocessor::default(),
            tagger,
        }
    }

    /// Set the similarity threshold used when removing repeated lines.
    pub fn with_dedup_threshold(mut self, threshold: u8) -> Self {
        self.preprocessor = AddressPreprocessor::new(LineDeduplicator::new(threshold));
        self
    }

    /// Parse an optional raw address.
    ///
    /// Absent or blank input yields a `ParsedAddress` with every field empty.
    /// A label that the tagger found in two separate places is returned as
    /// [`AddressError::Ambiguous`].
    pub fn parse(&self, raw: Option<&str>) -> Result<ParsedAddress, AddressError> {
        match raw {
            Some(raw) if !raw.trim().is_empty() => self.parse_text(raw),
            _ => Ok(ParsedAddress::default()),
        }
    }

    /// Parse address text that is known to be present.
    pub fn parse_text(&self, raw: &str) -> Result<ParsedAddress, AddressError> {
        let cleaned = self.preprocessor.preprocess(raw);
        let tagged = self.tagger.tag(&cleaned)?;
        let is_po_box = PO_BOX_MARKER.is_match(&cleaned);

        debug!(
            "Tagged {} address components with {} (PO box: {})",
            tagged.components().len(),
            self.tagger.name(),
            is_po_box
        );

        Ok(assemble(&tagged, is_po_box))
    }
}

fn assemble(tagged: &TaggedAddress, is_po_box: bool) -> ParsedAddress {
    let street_labels: &[AddressLabel] = if is_po_box {
        &PO_BOX_LABELS
    } else {
        &STREET_LABELS
    };

    ParsedAddress {
        street_line_1: join_labels(tagged, street_labels),
        street_line_2: join_labels(tagged, &OCCUPANCY_LABELS),
        city: join_labels(tagged, &[AddressLabel::PlaceName]),
        state: join_labels(tagged, &[AddressLabel::StateName]),
        zipcode: join_labels(tagged, &[AddressLabel::ZipCode]),
        name: join_labels(tagged, &[AddressLabel::Recipient]),
    }
}

fn join_labels(tagged: &TaggedAddress, labels: &[AddressLabel]) -> String {
    labels
        .iter()
        .filter_map(|label| tagged.get(*label))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}
