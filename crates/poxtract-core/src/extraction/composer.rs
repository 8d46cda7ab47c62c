//! Turns an extraction result into the persisted record shape.

use crate::address::AddressParser;
use crate::error::AddressError;
use crate::models::order::{ExtendedExtractedData, ExtendedOrderInfo, ExtractedData};

/// Add parsed shipping and billing addresses to an extraction result.
///
/// Every field of `data` is carried over unchanged. Both parsed addresses are
/// always present; an absent raw address parses to all-empty fields. An
/// ambiguous address fails the whole composition.
pub fn compose(
    data: ExtractedData,
    parser: &AddressParser,
) -> Result<ExtendedExtractedData, AddressError> {
    let shipping = parser.parse(data.other_info.shipping_address.as_deref())?;
    let billing = parser.parse(data.other_info.billing_address.as_deref())?;

    let mut other_info = ExtendedOrderInfo::new(data.other_info);
    other_info.shipping_address_parsed = Some(shipping);
    other_info.billing_address_parsed = Some(billing);

    Ok(ExtendedExtractedData {
        product_table: data.product_table,
        other_info,
    })
}
