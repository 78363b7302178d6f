//! Card number derived features.

use crate::reattach::Reattacher;
use crate::series::FeatureSeries;
use fraud_core::{FieldValue, RecordStore, Result};

/// Length of a bank identification number.
pub const BIN_LENGTH: usize = 6;

fn card_text(value: &FieldValue) -> Option<String> {
    if value.is_null() {
        return None;
    }
    let text = value.to_string();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Issuer prefix: the first six characters of the card number.
///
/// Shorter card numbers yield the whole value.
pub fn card_bin(store: &RecordStore, card_field: &str) -> Result<FeatureSeries<Option<String>>> {
    let values = store
        .column(card_field)?
        .into_iter()
        .map(|v| card_text(v).map(|s| s.chars().take(BIN_LENGTH).collect()))
        .collect();
    Reattacher::new(store).aligned(format!("{card_field}_bin"), values)
}

/// Check digit: the last character of the card number.
pub fn card_check_digit(
    store: &RecordStore,
    card_field: &str,
) -> Result<FeatureSeries<Option<String>>> {
    let values = store
        .column(card_field)?
        .into_iter()
        .map(|v| card_text(v).and_then(|s| s.chars().last()).map(String::from))
        .collect();
    Reattacher::new(store).aligned(format!("{card_field}_check_digit"), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraud_core::{Error, Record};

    fn store(cards: Vec<FieldValue>) -> RecordStore {
        RecordStore::new(
            vec!["card".into()],
            cards
                .into_iter()
                .enumerate()
                .map(|(i, c)| Record::new(i as u64, vec![c]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_bin() {
        let s = store(vec![
            "4111111111111111".into(),
            FieldValue::Int(5500005555555559),
            "1234".into(),
            FieldValue::Null,
        ]);
        let bin = card_bin(&s, "card").unwrap();
        assert_eq!(bin.name(), "card_bin");
        assert_eq!(
            bin.values(),
            &[
                Some("411111".to_string()),
                Some("550000".to_string()),
                Some("1234".to_string()),
                None
            ]
        );
    }

    #[test]
    fn test_check_digit() {
        let s = store(vec!["4111111111111111".into(), "  ".into(), FieldValue::Null]);
        let digit = card_check_digit(&s, "card").unwrap();
        assert_eq!(digit.values(), &[Some("1".to_string()), None, None]);
    }

    #[test]
    fn test_missing_card_field() {
        let s = store(vec!["4111".into()]);
        assert!(matches!(card_bin(&s, "pan"), Err(Error::Validation(_))));
    }
}
