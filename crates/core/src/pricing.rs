//! Quote line items and total computation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::MinorUnits;

/// Maximum length of a line item description.
pub const MAX_LINE_ITEM_DESCRIPTION_LENGTH: usize = 500;

/// One priced row of a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub quantity: i64,
    pub unit_price: MinorUnits,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: i64, unit_price: MinorUnits) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
        }
    }
}

/// Validate a quote: at least one item, every item with a description and a
/// positive quantity and unit price.
pub fn validate_line_items(items: &[LineItem]) -> Result<(), CoreError> {
    if items.is_empty() {
        return Err(CoreError::Validation(
            "A quote must contain at least one line item".to_string(),
        ));
    }

    for (i, item) in items.iter().enumerate() {
        if item.description.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Line item {i} must have a description"
            )));
        }
        if item.description.len() > MAX_LINE_ITEM_DESCRIPTION_LENGTH {
            return Err(CoreError::Validation(format!(
                "Line item {i} description exceeds {MAX_LINE_ITEM_DESCRIPTION_LENGTH} characters"
            )));
        }
        if item.quantity <= 0 {
            return Err(CoreError::Validation(format!(
                "Line item {i} quantity must be positive, got {}",
                item.quantity
            )));
        }
        if item.unit_price <= 0 {
            return Err(CoreError::Validation(format!(
                "Line item {i} unit price must be positive, got {}",
                item.unit_price
            )));
        }
    }

    Ok(())
}

/// Sum of `quantity * unit_price` over all items.
///
/// Overflow is reported as a validation error rather than wrapping.
pub fn compute_total(items: &[LineItem]) -> Result<MinorUnits, CoreError> {
    items.iter().try_fold(0i64, |acc, item| {
        item.quantity
            .checked_mul(item.unit_price)
            .and_then(|line| acc.checked_add(line))
            .ok_or_else(|| CoreError::Validation("Quote total is out of range".to_string()))
    })
}

/// Validate an ISO 4217 style currency code (three uppercase ASCII letters).
pub fn validate_currency(currency: &str) -> Result<(), CoreError> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid currency '{currency}'. Expected a three-letter code such as USD"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_sum_of_quantity_times_price() {
        let items = vec![
            LineItem::new("Design", 1, 50_000),
            LineItem::new("Revisions", 3, 7_500),
        ];
        assert_eq!(compute_total(&items).unwrap(), 72_500);
    }

    #[test]
    fn empty_quote_rejected() {
        let err = validate_line_items(&[]).unwrap_err();
        assert!(err.to_string().contains("at least one line item"));
    }

    #[test]
    fn non_positive_values_rejected() {
        assert!(validate_line_items(&[LineItem::new("x", 0, 100)]).is_err());
        assert!(validate_line_items(&[LineItem::new("x", 1, 0)]).is_err());
        assert!(validate_line_items(&[LineItem::new("x", -2, 100)]).is_err());
        assert!(validate_line_items(&[LineItem::new("x", 2, 100)]).is_ok());
    }

    #[test]
    fn blank_description_rejected() {
        assert!(validate_line_items(&[LineItem::new("  ", 1, 100)]).is_err());
    }

    #[test]
    fn overflow_is_a_validation_error() {
        let items = vec![LineItem::new("huge", i64::MAX, 2)];
        assert!(matches!(compute_total(&items), Err(CoreError::Validation(_))));
    }

    #[test]
    fn currency_codes() {
        assert!(validate_currency("USD").is_ok());
        assert!(validate_currency("EUR").is_ok());
        assert!(validate_currency("usd").is_err());
        assert!(validate_currency("US").is_err());
        assert!(validate_currency("").is_err());
    }

    #[test]
    fn line_item_uses_camel_case_fields() {
        let json = serde_json::to_value(LineItem::new("Design", 1, 50_000)).unwrap();
        assert_eq!(json["unitPrice"], 50_000);
        assert_eq!(json["quantity"], 1);
    }
}
