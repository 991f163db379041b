//! Domain models for tracked subscriptions.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use crate::common::*;
use crate::currency::{deserialize_optional_currency, Currency};
use crate::id::SubscriptionId;

/// A recurring service charge tracked by the user.
///
/// Persisted field names are camelCase so existing exports load unchanged.
/// Records with a missing price or an unknown currency still deserialize;
/// aggregation skips them instead of rejecting the whole collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: SubscriptionId,
    pub name: String,
    #[serde(default = "missing_price", deserialize_with = "deserialize_price")]
    pub price: f64,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_currency",
        skip_serializing_if = "Option::is_none"
    )]
    pub currency: Option<Currency>,
    pub billing_cycle: BillingCycle,
    #[serde(default)]
    pub category: Category,
    #[serde(deserialize_with = "deserialize_date")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_date")]
    pub renewal_date: NaiveDate,
    pub status: SubscriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// Finite and non-negative.
    pub fn has_valid_price(&self) -> bool {
        self.price.is_finite() && self.price >= 0.0
    }

    /// Renewal date interpreted as midnight UTC.
    pub fn renewal_instant(&self) -> DateTime<Utc> {
        self.renewal_date.and_time(NaiveTime::MIN).and_utc()
    }

    /// Merges every supplied field of `patch` into the record.
    /// Identifier and timestamps are left to the caller.
    pub fn apply_patch(&mut self, patch: &SubscriptionPatch) {
        if let Some(name) = &patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(currency) = patch.currency {
            self.currency = Some(currency);
        }
        if let Some(cycle) = patch.billing_cycle {
            self.billing_cycle = cycle;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(start) = patch.start_date {
            self.start_date = start;
        }
        if let Some(renewal) = patch.renewal_date {
            self.renewal_date = renewal;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = &patch.notes {
            self.notes = normalize_notes(notes.clone());
        }
    }
}

impl Displayable for Subscription {
    fn display_label(&self) -> String {
        format!("{} ({}, {})", self.name, self.billing_cycle, self.status)
    }
}

/// Blank notes are stored as absent.
pub fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Enumerates how often a subscription charges.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Yearly,
    Other,
}

impl BillingCycle {
    pub const ALL: [BillingCycle; 3] = [
        BillingCycle::Monthly,
        BillingCycle::Yearly,
        BillingCycle::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BillingCycle::Monthly => "Monthly",
            BillingCycle::Yearly => "Yearly",
            BillingCycle::Other => "Other",
        }
    }

    /// Next charge date after `from`. `Other` has no fixed period and stays put.
    pub fn advance(self, from: NaiveDate) -> NaiveDate {
        match self {
            BillingCycle::Monthly => shift_month(from, 1),
            BillingCycle::Yearly => shift_year(from, 1),
            BillingCycle::Other => from,
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BillingCycle {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "monthly" | "month" => Ok(BillingCycle::Monthly),
            "yearly" | "year" | "annual" => Ok(BillingCycle::Yearly),
            "other" => Ok(BillingCycle::Other),
            _ => Err(ParseEnumError::new("billing cycle", value)),
        }
    }
}

/// Fixed grouping used for breakdowns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Category {
    Streaming,
    Software,
    Fitness,
    Entertainment,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Streaming,
        Category::Software,
        Category::Fitness,
        Category::Entertainment,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Streaming => "Streaming",
            Category::Software => "Software",
            Category::Fitness => "Fitness",
            Category::Entertainment => "Entertainment",
            Category::Other => "Other",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Category::Streaming => "#FF6B6B",
            Category::Software => "#4ECDC4",
            Category::Fitness => "#95E1D3",
            Category::Entertainment => "#FFD93D",
            Category::Other => "#A8DADC",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "streaming" => Ok(Category::Streaming),
            "software" => Ok(Category::Software),
            "fitness" => Ok(Category::Fitness),
            "entertainment" => Ok(Category::Entertainment),
            "other" => Ok(Category::Other),
            _ => Err(ParseEnumError::new("category", value)),
        }
    }
}

/// Enumerates the lifecycle state of a subscription.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Paused,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn label(self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "Active",
            SubscriptionStatus::Paused => "Paused",
            SubscriptionStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(SubscriptionStatus::Active),
            "paused" => Ok(SubscriptionStatus::Paused),
            "cancelled" | "canceled" => Ok(SubscriptionStatus::Cancelled),
            _ => Err(ParseEnumError::new("status", value)),
        }
    }
}

/// Caller-supplied fields for a new subscription.
///
/// Required fields are optional here so that incomplete input can be
/// reported as a validation error rather than failing to construct.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSubscription {
    pub name: String,
    pub price: Option<f64>,
    pub currency: Option<Currency>,
    pub billing_cycle: Option<BillingCycle>,
    pub category: Option<Category>,
    pub start_date: Option<NaiveDate>,
    pub renewal_date: Option<NaiveDate>,
    pub status: Option<SubscriptionStatus>,
    pub notes: Option<String>,
}

impl NewSubscription {
    pub fn new(
        name: impl Into<String>,
        price: f64,
        currency: Currency,
        billing_cycle: BillingCycle,
    ) -> Self {
        Self {
            name: name.into(),
            price: Some(price),
            currency: Some(currency),
            billing_cycle: Some(billing_cycle),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn with_renewal_date(mut self, date: NaiveDate) -> Self {
        self.renewal_date = Some(date);
        self
    }

    pub fn with_status(mut self, status: SubscriptionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Partial update. `None` leaves a field untouched; `notes: Some(None)` clears notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<Currency>,
    pub billing_cycle: Option<BillingCycle>,
    pub category: Option<Category>,
    pub start_date: Option<NaiveDate>,
    pub renewal_date: Option<NaiveDate>,
    pub status: Option<SubscriptionStatus>,
    pub notes: Option<Option<String>>,
}

impl SubscriptionPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Subscription {
        let stamp = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        Subscription {
            id: SubscriptionId::new_v4(),
            name: "Netflix".into(),
            price: 15.49,
            currency: Some(Currency::Usd),
            billing_cycle: BillingCycle::Monthly,
            category: Category::Streaming,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            renewal_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            status: SubscriptionStatus::Active,
            notes: None,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["billingCycle"], "monthly");
        assert_eq!(json["renewalDate"], "2024-04-01");
        assert_eq!(json["currency"], "USD");
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn loads_legacy_record_without_price_or_currency() {
        let raw = r#"{
            "id": "6f1c1f9e-33c5-4c4e-9a55-0f4b5b6a2d11",
            "name": "Gym",
            "billingCycle": "monthly",
            "category": "fitness",
            "startDate": "2024-01-01T00:00:00.000Z",
            "renewalDate": "2024-02-01T00:00:00.000Z",
            "status": "active",
            "notes": "",
            "createdAt": "2024-01-01T10:00:00.000Z",
            "updatedAt": "2024-01-01T10:00:00.000Z"
        }"#;
        let record: Subscription = serde_json::from_str(raw).unwrap();
        assert!(record.price.is_nan());
        assert!(!record.has_valid_price());
        assert_eq!(record.currency, None);
        assert_eq!(
            record.renewal_date,
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
    }

    #[test]
    fn loads_record_with_timestamp_id() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["id"] = serde_json::json!(1712345678901u64);
        let record: Subscription = serde_json::from_value(json).unwrap();
        assert_eq!(record.id.as_str(), "1712345678901");
        assert_eq!(serde_json::to_value(&record).unwrap()["id"], "1712345678901");
    }

    #[test]
    fn unknown_currency_loads_as_none() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["currency"] = "CHF".into();
        let record: Subscription = serde_json::from_value(json).unwrap();
        assert_eq!(record.currency, None);
    }

    #[test]
    fn invalid_category_is_rejected() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["category"] = "gardening".into();
        assert!(serde_json::from_value::<Subscription>(json).is_err());
        assert!("gardening".parse::<Category>().is_err());
    }

    #[test]
    fn apply_patch_touches_only_supplied_fields() {
        let mut record = sample();
        let before = record.clone();
        let patch = SubscriptionPatch {
            price: Some(17.99),
            notes: Some(Some("  family plan ".into())),
            ..SubscriptionPatch::default()
        };
        record.apply_patch(&patch);
        assert_eq!(record.price, 17.99);
        assert_eq!(record.notes.as_deref(), Some("family plan"));
        assert_eq!(record.name, before.name);
        assert_eq!(record.renewal_date, before.renewal_date);
        assert_eq!(record.updated_at, before.updated_at);
    }

    #[test]
    fn billing_cycle_advances_renewal() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            BillingCycle::Monthly.advance(start),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            BillingCycle::Yearly.advance(start),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
        );
        assert_eq!(BillingCycle::Other.advance(start), start);
    }
}
