//! Inventory item model and key normalization.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::error::{InventoryError, InventoryResult};

/// Canonical map key for an item name. Names that differ only in case share a slot.
pub fn normalize_key(name: &str) -> String {
    name.to_lowercase()
}

/// Normalizes a caller-supplied name, rejecting blank input.
pub fn require_key(name: &str) -> InventoryResult<String> {
    if name.trim().is_empty() {
        return Err(InventoryError::InvalidInput("name must not be blank".to_string()));
    }
    Ok(normalize_key(name))
}

/// A single inventory record. `name` keeps the display case it was written with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub name: String,
    pub quantity: i32,
    #[serde(with = "created_on")]
    pub created_on: NaiveDateTime,
}

impl InventoryItem {
    pub fn new(name: impl Into<String>, quantity: i32, created_on: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            quantity,
            created_on,
        }
    }

    /// Normalized key of this item.
    pub fn key(&self) -> String {
        normalize_key(&self.name)
    }
}

/// Item as received from a caller, before required-field checks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default, deserialize_with = "created_on::deserialize_option")]
    pub created_on: Option<NaiveDateTime>,
}

impl ItemPayload {
    /// Checks required fields and produces a storable item.
    pub fn validate(self) -> InventoryResult<InventoryItem> {
        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| InventoryError::InvalidInput("name is required".to_string()))?;
        let quantity = self
            .quantity
            .ok_or_else(|| InventoryError::InvalidInput(format!("quantity is required for {name}")))?;
        let created_on = self
            .created_on
            .ok_or_else(|| InventoryError::InvalidInput(format!("createdOn is required for {name}")))?;

        Ok(InventoryItem {
            name,
            quantity,
            created_on,
        })
    }
}

/// Midnight on the given calendar day.
pub(crate) fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_default()
        .and_time(NaiveTime::default())
}

/// Wire format for `createdOn`.
///
/// Accepts RFC 3339 (normalized to UTC), naive ISO timestamps and bare dates;
/// always writes a naive ISO timestamp.
pub(crate) mod created_on {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
            return Some(timestamp.naive_utc());
        }
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, FORMAT) {
            return Some(timestamp);
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(|date| date.and_time(NaiveTime::default()))
    }

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid createdOn timestamp: {raw}")))
    }

    pub fn deserialize_option<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| {
                parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid createdOn timestamp: {raw}")))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_key_lowercases() {
        assert_eq!(normalize_key("aPpLeS"), "apples");
        assert_eq!(normalize_key("Pomegranates"), "pomegranates");
    }

    #[test]
    fn test_require_key_rejects_blank() {
        assert!(matches!(require_key("   "), Err(InventoryError::InvalidInput(_))));
        assert!(matches!(require_key(""), Err(InventoryError::InvalidInput(_))));
        assert_eq!(require_key("Oranges").unwrap(), "oranges");
    }

    #[test]
    fn test_item_serializes_camel_case() {
        let item = InventoryItem::new("Apples", 3, midnight(2020, 1, 1));
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(
            value,
            json!({"name": "Apples", "quantity": 3, "createdOn": "2020-01-01T00:00:00"})
        );
    }

    #[test]
    fn test_created_on_accepts_several_formats() {
        let expected = midnight(2020, 2, 10);

        assert_eq!(created_on::parse("2020-02-10"), Some(expected));
        assert_eq!(created_on::parse("2020-02-10T00:00:00"), Some(expected));
        assert_eq!(created_on::parse("2020-02-10T02:00:00+02:00"), Some(expected));
        assert_eq!(created_on::parse("10/02/2020"), None);
    }

    #[test]
    fn test_payload_validation_requires_all_fields() {
        let missing_name: ItemPayload =
            serde_json::from_value(json!({"quantity": 1, "createdOn": "2020-01-01"})).unwrap();
        assert!(matches!(missing_name.validate(), Err(InventoryError::InvalidInput(_))));

        let blank_name: ItemPayload =
            serde_json::from_value(json!({"name": "  ", "quantity": 1, "createdOn": "2020-01-01"})).unwrap();
        assert!(matches!(blank_name.validate(), Err(InventoryError::InvalidInput(_))));

        let missing_quantity: ItemPayload =
            serde_json::from_value(json!({"name": "Kiwis", "createdOn": "2020-01-01"})).unwrap();
        assert!(matches!(missing_quantity.validate(), Err(InventoryError::InvalidInput(_))));

        let missing_date: ItemPayload =
            serde_json::from_value(json!({"name": "Kiwis", "quantity": 1})).unwrap();
        assert!(matches!(missing_date.validate(), Err(InventoryError::InvalidInput(_))));
    }

    #[test]
    fn test_payload_validation_allows_negative_quantity() {
        let payload: ItemPayload =
            serde_json::from_value(json!({"name": "Kiwis", "quantity": -4, "createdOn": "2021-06-01"}))
                .unwrap();
        let item = payload.validate().unwrap();

        assert_eq!(item.name, "Kiwis");
        assert_eq!(item.quantity, -4);
        assert_eq!(item.created_on, midnight(2021, 6, 1));
        assert_eq!(item.key(), "kiwis");
    }

    #[test]
    fn test_payload_rejects_garbage_timestamp() {
        let result: Result<ItemPayload, _> =
            serde_json::from_value(json!({"name": "Kiwis", "quantity": 1, "createdOn": "yesterday"}));
        assert!(result.is_err());
    }
}
