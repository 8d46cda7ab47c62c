//! Instruction context for purchase order extraction.

use poxtract_llm::ChatMessage;

const BASE_INSTRUCTIONS: &str = "\
You extract structured data from purchase order text. The text was pulled from a PDF \
and its layout may be lost.

Order information (usually near the top of the document):
- company_name: the company issuing the purchase order
- order_number: the purchase order number
- shipping_address: the full ship-to address, one line per address line
- billing_address: the full bill-to address, one line per address line
- order_date: the order date as printed

Product table (follows the order information, may span several lines per item):
- total_price: the order total
- entries: one entry per ordered item with description, quantity, unit price and \
specifications (part numbers, sizes, revisions) when present

Rules:
- Ignore all vendor or supplier information.
- Use numbers without currency symbols or thousands separators.
- Leave a field empty when the document does not contain it.";

/// Build the system message sent with every extraction call.
///
/// `ignore_company` names the company receiving the purchase orders. Its
/// name and addresses appear on every document and must not be extracted.
pub fn system_instructions(ignore_company: Option<&str>) -> Vec<ChatMessage> {
    let mut content = BASE_INSTRUCTIONS.to_string();
    if let Some(company) = ignore_company.map(str::trim).filter(|c| !c.is_empty()) {
        content.push_str(&format!(
            "\n- Ignore all information about {}; they receive this purchase order.",
            company
        ));
    }
    vec![ChatMessage::system(content)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use poxtract_llm::Role;

    #[test]
    fn test_single_system_message() {
        let messages = system_instructions(None);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("shipping_address"));
        assert!(!messages[0].content.contains("receive this purchase order"));
    }

    #[test]
    fn test_ignore_company() {
        let messages = system_instructions(Some("Acme Manufacturing Inc"));
        assert!(messages[0].content.contains("about Acme Manufacturing Inc;"));

        let blank = system_instructions(Some("  "));
        assert_eq!(blank, system_instructions(None));
    }
}
