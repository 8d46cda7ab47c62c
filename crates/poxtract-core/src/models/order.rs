//! Purchase-order data models.
//!
//! `ExtractedData` is the schema the language model must fill in. The
//! `Extended*` types add normalized addresses and are what gets persisted.

use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One ordered product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ProductLineItem {
    /// Product description as written on the order.
    #[serde(deserialize_with = "lenient::text")]
    pub description: String,

    /// Ordered quantity.
    #[serde(deserialize_with = "lenient::count")]
    pub quantity: u32,

    /// Unit price.
    #[serde(
        serialize_with = "lenient::serialize_amount",
        deserialize_with = "lenient::amount"
    )]
    #[schemars(with = "f64")]
    pub price: Decimal,

    /// Free-form specifications (size, finish, part options).
    pub specifications: Option<String>,
}

/// All line items of an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ProductTable {
    /// Order total as stated in the document; never recomputed from entries.
    #[serde(
        serialize_with = "lenient::serialize_amount",
        deserialize_with = "lenient::amount"
    )]
    #[schemars(with = "f64")]
    pub total_price: Decimal,

    /// Line items in document order.
    #[serde(deserialize_with = "lenient::list")]
    pub entries: Vec<ProductLineItem>,
}

/// Order metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OrderInfo {
    #[serde(deserialize_with = "lenient::text")]
    pub company_name: String,

    #[serde(deserialize_with = "lenient::text")]
    pub order_number: String,

    /// Raw shipping address, possibly multi-line.
    pub shipping_address: Option<String>,

    /// Raw billing address, possibly multi-line.
    pub billing_address: Option<String>,

    /// Order date as written.
    pub order_date: Option<String>,
}

/// Top-level extraction result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExtractedData {
    pub product_table: ProductTable,
    pub other_info: OrderInfo,
}

/// A normalized US mailing address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedAddress {
    pub street_line_1: String,
    pub street_line_2: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub name: String,
}

impl ParsedAddress {
    /// True when no component was resolved.
    pub fn is_empty(&self) -> bool {
        self.street_line_1.is_empty()
            && self.street_line_2.is_empty()
            && self.city.is_empty()
            && self.state.is_empty()
            && self.zipcode.is_empty()
            && self.name.is_empty()
    }

    /// Format as a single line.
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        for part in [&self.name, &self.street_line_1, &self.street_line_2, &self.city] {
            if !part.is_empty() {
                parts.push(part.clone());
            }
        }

        let state_zip = format!("{} {}", self.state, self.zipcode);
        let state_zip = state_zip.trim();
        if !state_zip.is_empty() {
            parts.push(state_zip.to_string());
        }
        parts.join(", ")
    }
}

/// Order metadata plus the parsed forms of both addresses.
///
/// Serialized flat, with the base fields first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedOrderInfo {
    #[serde(flatten)]
    pub order: OrderInfo,

    /// Filled by composition; all fields empty when the raw address is absent or blank.
    pub shipping_address_parsed: Option<ParsedAddress>,

    /// Filled by composition; all fields empty when the raw address is absent or blank.
    pub billing_address_parsed: Option<ParsedAddress>,
}

impl ExtendedOrderInfo {
    /// Wrap an `OrderInfo` with no parsed addresses yet.
    pub fn new(order: OrderInfo) -> Self {
        Self {
            order,
            shipping_address_parsed: None,
            billing_address_parsed: None,
        }
    }
}

/// The final record for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedExtractedData {
    pub product_table: ProductTable,
    pub other_info: ExtendedOrderInfo,
}

impl ExtendedExtractedData {
    /// The extraction this record was derived from.
    pub fn to_extracted(&self) -> ExtractedData {
        ExtractedData {
            product_table: self.product_table.clone(),
            other_info: self.other_info.order.clone(),
        }
    }
}

/// What the sink persists: the record plus the source attachment name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    #[serde(flatten)]
    pub data: ExtendedExtractedData,

    /// File name of the PDF the record was extracted from.
    pub input_blob_name: String,
}

impl OutputRecord {
    pub fn new(data: ExtendedExtractedData, input_blob_name: impl Into<String>) -> Self {
        Self {
            data,
            input_blob_name: input_blob_name.into(),
        }
    }

    /// Pretty JSON, as written to storage and the queue.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Tolerant deserializers for model output.
///
/// Models sometimes answer `null`, negative numbers or formatted strings
/// such as `"$1,250.00"`. All of these collapse to a non-negative value.
mod lenient {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use rust_decimal::prelude::ToPrimitive;
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Null => String::new(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        })
    }

    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
    }

    pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let decimal = match value {
            Value::Number(n) => parse_decimal(&n.to_string()),
            Value::String(s) => parse_decimal(&s),
            _ => None,
        };

        Ok(decimal
            .filter(|d| d.is_sign_positive())
            .and_then(|d| d.round().to_u32())
            .unwrap_or(0))
    }

    pub fn amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let decimal = match value {
            Value::Number(n) => parse_decimal(&n.to_string()),
            Value::String(s) => parse_decimal(&s),
            _ => None,
        };

        Ok(decimal.unwrap_or(Decimal::ZERO).max(Decimal::ZERO))
    }

    pub fn serialize_amount<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_f64().unwrap_or(0.0))
    }

    fn parse_decimal(s: &str) -> Option<Decimal> {
        let cleaned: String = s
            .chars()
            .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | 'e' | 'E' | '+'))
            .collect();

        if cleaned.is_empty() {
            return None;
        }

        Decimal::from_str(&cleaned)
            .or_else(|_| Decimal::from_scientific(&cleaned))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn test_defaults_on_empty_object() {
        let data: ExtractedData = serde_json::from_str("{}").unwrap();

        assert_eq!(data, ExtractedData::default());
        assert!(data.product_table.entries.is_empty());
        assert_eq!(data.other_info.company_name, "");
        assert_eq!(data.product_table.total_price, Decimal::ZERO);
    }

    #[test]
    fn test_lenient_numbers() {
        let json = r#"{
            "product_table": {
                "total_price": "$1,250.50",
                "entries": [
                    {"description": "Bellows cover", "quantity": 2.0, "price": 125.25},
                    {"description": null, "quantity": -3, "price": -10},
                    {"description": "Way cover", "quantity": "4", "price": null}
                ]
            },
            "other_info": {"company_name": null, "order_number": 4512}
        }"#;
        let data: ExtractedData = serde_json::from_str(json).unwrap();
        let entries = &data.product_table.entries;

        assert_eq!(data.product_table.total_price, Decimal::from_str("1250.50").unwrap());
        assert_eq!(entries[0].quantity, 2);
        assert_eq!(entries[0].price, Decimal::from_str("125.25").unwrap());
        assert_eq!(entries[1].description, "");
        assert_eq!(entries[1].quantity, 0);
        assert_eq!(entries[1].price, Decimal::ZERO);
        assert_eq!(entries[2].quantity, 4);
        assert_eq!(data.other_info.company_name, "");
        assert_eq!(data.other_info.order_number, "4512");
    }

    #[test]
    fn test_null_entries_default_to_empty() {
        let json = r#"{"product_table": {"total_price": 0, "entries": null}}"#;
        let data: ExtractedData = serde_json::from_str(json).unwrap();
        assert!(data.product_table.entries.is_empty());
    }

    #[test]
    fn test_amounts_serialize_as_numbers() {
        let table = ProductTable {
            total_price: Decimal::from_str("99.95").unwrap(),
            entries: vec![ProductLineItem {
                description: "Guard".to_string(),
                quantity: 1,
                price: Decimal::from_str("99.95").unwrap(),
                specifications: None,
            }],
        };
        let json = serde_json::to_value(&table).unwrap();

        assert_eq!(json["total_price"], serde_json::json!(99.95));
        assert_eq!(json["entries"][0]["price"], serde_json::json!(99.95));
        assert_eq!(json["entries"][0]["specifications"], serde_json::Value::Null);
    }

    #[test]
    fn test_extended_order_info_is_flat() {
        let mut info = ExtendedOrderInfo::new(OrderInfo {
            company_name: "Acme".to_string(),
            order_number: "PO-1".to_string(),
            shipping_address: Some("1 Main St".to_string()),
            ..Default::default()
        });
        info.shipping_address_parsed = Some(ParsedAddress {
            street_line_1: "1 Main St".to_string(),
            ..Default::default()
        });
        let json = serde_json::to_value(&info).unwrap();

        assert_eq!(json["company_name"], "Acme");
        assert_eq!(json["shipping_address"], "1 Main St");
        assert_eq!(json["shipping_address_parsed"]["street_line_1"], "1 Main St");
        assert_eq!(json["billing_address_parsed"], serde_json::Value::Null);
        assert!(json.get("order").is_none());
    }

    #[test]
    fn test_output_record_carries_blob_name() {
        let record = OutputRecord::new(ExtendedExtractedData::default(), "po_1234.pdf");
        let json: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();

        assert_eq!(json["input_blob_name"], "po_1234.pdf");
        assert!(json["product_table"]["entries"].as_array().unwrap().is_empty());
        assert_eq!(json["other_info"]["order_date"], serde_json::Value::Null);
    }

    #[test]
    fn test_parsed_address_format() {
        let address = ParsedAddress {
            street_line_1: "123 Main St".to_string(),
            street_line_2: "Suite 4".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zipcode: "62701".to_string(),
            name: String::new(),
        };
        assert_eq!(address.format(), "123 Main St, Suite 4, Springfield, IL 62701");
        assert!(ParsedAddress::default().is_empty());
    }
}
