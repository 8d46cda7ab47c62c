//! Address normalization: line cleanup, component tagging and assembly.

mod dedup;
mod parser;
mod patterns;
mod preprocess;
mod similarity;
mod tagger;

pub use dedup::{DEFAULT_THRESHOLD, LineDeduplicator, dedupe_lines};
pub use parser::AddressParser;
pub use preprocess::{AddressPreprocessor, preprocess_address};
pub use similarity::{ratio, token_set_ratio};
pub use tagger::UsAddressTagger;

use crate::error::AddressError;
use std::fmt;

/// Label assigned to one component of a US address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressLabel {
    Recipient,
    AddressNumber,
    StreetNamePreDirectional,
    StreetName,
    StreetNamePostType,
    StreetNamePostDirectional,
    OccupancyType,
    OccupancyIdentifier,
    UspsBoxType,
    UspsBoxId,
    PlaceName,
    StateName,
    ZipCode,
    CountryName,
}

impl AddressLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressLabel::Recipient => "Recipient",
            AddressLabel::AddressNumber => "AddressNumber",
            AddressLabel::StreetNamePreDirectional => "StreetNamePreDirectional",
            AddressLabel::StreetName => "StreetName",
            AddressLabel::StreetNamePostType => "StreetNamePostType",
            AddressLabel::StreetNamePostDirectional => "StreetNamePostDirectional",
            AddressLabel::OccupancyType => "OccupancyType",
            AddressLabel::OccupancyIdentifier => "OccupancyIdentifier",
            AddressLabel::UspsBoxType => "USPSBoxType",
            AddressLabel::UspsBoxId => "USPSBoxID",
            AddressLabel::PlaceName => "PlaceName",
            AddressLabel::StateName => "StateName",
            AddressLabel::ZipCode => "ZipCode",
            AddressLabel::CountryName => "CountryName",
        }
    }
}

impl fmt::Display for AddressLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the delivery line is a street address or a post office box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Street,
    PoBox,
    Ambiguous,
}

/// Labeled components of one address, in text order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaggedAddress {
    components: Vec<(AddressLabel, String)>,
}

impl TaggedAddress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a component. Text is trimmed; empty text is ignored.
    pub fn push(&mut self, label: AddressLabel, text: impl Into<String>) {
        let text = text.into();
        let text = text.trim();
        if !text.is_empty() {
            self.components.push((label, text.to_string()));
        }
    }

    pub fn get(&self, label: AddressLabel) -> Option<&str> {
        self.components
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, text)| text.as_str())
    }

    pub fn components(&self) -> &[(AddressLabel, String)] {
        &self.components
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn kind(&self) -> AddressKind {
        let has_box = self.get(AddressLabel::UspsBoxId).is_some()
            || self.get(AddressLabel::UspsBoxType).is_some();
        if has_box {
            AddressKind::PoBox
        } else if self.get(AddressLabel::AddressNumber).is_some()
            || self.get(AddressLabel::StreetName).is_some()
        {
            AddressKind::Street
        } else {
            AddressKind::Ambiguous
        }
    }
}

/// Splits address text into labeled components.
///
/// Implementations must report a label that covers two separate stretches of
/// the text as [`AddressError::Ambiguous`] rather than guessing.
pub trait ComponentTagger: Send + Sync {
    fn tag(&self, address: &str) -> Result<TaggedAddress, AddressError>;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_address_push_and_get() {
        let mut tagged = TaggedAddress::new();
        tagged.push(AddressLabel::AddressNumber, "123");
        tagged.push(AddressLabel::StreetName, "  ");
        assert_eq!(tagged.get(AddressLabel::AddressNumber), Some("123"));
        assert_eq!(tagged.get(AddressLabel::StreetName), None);
        assert_eq!(tagged.components().len(), 1);
    }

    #[test]
    fn test_kind() {
        let mut tagged = TaggedAddress::new();
        assert_eq!(tagged.kind(), AddressKind::Ambiguous);
        tagged.push(AddressLabel::AddressNumber, "5");
        assert_eq!(tagged.kind(), AddressKind::Street);
        tagged.push(AddressLabel::UspsBoxId, "9");
        assert_eq!(tagged.kind(), AddressKind::PoBox);
    }

    #[test]
    fn test_label_names() {
        assert_eq!(AddressLabel::UspsBoxId.to_string(), "USPSBoxID");
        assert_eq!(AddressLabel::PlaceName.as_str(), "PlaceName");
    }
}
