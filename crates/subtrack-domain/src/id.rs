//! Opaque identifier for persisted subscriptions.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Identifier of a stored subscription.
///
/// New records get a UUID v4, but any non-empty string loads: older data
/// files used millisecond timestamps, sometimes written as JSON numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps `raw` unless it is blank.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading `len` characters, for compact listings.
    pub fn short(&self, len: usize) -> &str {
        match self.0.char_indices().nth(len) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SubscriptionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for SubscriptionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IdVisitor;

        impl<'de> de::Visitor<'de> for IdVisitor {
            type Value = SubscriptionId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-empty string or integer id")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                SubscriptionId::parse(value)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Str(value), &self))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                Ok(SubscriptionId(value.to_string()))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                Ok(SubscriptionId(value.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_ids_are_uuids() {
        let id = SubscriptionId::new_v4();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
        assert_eq!(id.short(8).len(), 8);
    }

    #[test]
    fn timestamp_ids_load_as_strings_or_numbers() {
        let text: SubscriptionId = serde_json::from_str("\"1712345678901\"").unwrap();
        let number: SubscriptionId = serde_json::from_str("1712345678901").unwrap();
        assert_eq!(text, number);
        assert_eq!(text.as_str(), "1712345678901");
        assert_eq!(serde_json::to_string(&number).unwrap(), "\"1712345678901\"");
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert!(serde_json::from_str::<SubscriptionId>("\"  \"").is_err());
        assert!(serde_json::from_str::<SubscriptionId>("null").is_err());
        assert!(SubscriptionId::parse("").is_none());
    }

    #[test]
    fn short_form_never_exceeds_the_id() {
        let id = SubscriptionId::parse("abc").unwrap();
        assert_eq!(id.short(8), "abc");
    }
}
