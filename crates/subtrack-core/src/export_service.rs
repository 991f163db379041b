use chrono::NaiveDate;

use subtrack_domain::Subscription;

use crate::CoreError;

pub const CSV_HEADER: &str = "name,price,billing cycle,category,status,renewal date";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(CoreError::Validation(format!(
                "unsupported export format `{other}` (expected json or csv)"
            ))),
        }
    }
}

pub struct ExportService;

impl ExportService {
    pub fn render(format: ExportFormat, subscriptions: &[Subscription]) -> Result<String, CoreError> {
        match format {
            ExportFormat::Json => Self::to_json(subscriptions),
            ExportFormat::Csv => Ok(Self::to_csv(subscriptions)),
        }
    }

    /// Pretty-printed array in the persisted record shape.
    pub fn to_json(subscriptions: &[Subscription]) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(subscriptions)?)
    }

    pub fn to_csv(subscriptions: &[Subscription]) -> String {
        let mut out = String::from(CSV_HEADER);
        out.push('\n');
        for subscription in subscriptions {
            let price = if subscription.price.is_finite() {
                format!("{:.2}", subscription.price)
            } else {
                String::new()
            };
            let row = [
                escape_csv_field(&subscription.name),
                price,
                escape_csv_field(subscription.billing_cycle.label()),
                escape_csv_field(subscription.category.label()),
                escape_csv_field(subscription.status.label()),
                subscription.renewal_date.format("%Y-%m-%d").to_string(),
            ];
            out.push_str(&row.join(","));
            out.push('\n');
        }
        out
    }

    pub fn default_filename(format: ExportFormat, today: NaiveDate) -> String {
        format!(
            "subscriptions-{}.{}",
            today.format("%Y-%m-%d"),
            format.extension()
        )
    }
}

/// Quotes a field containing a comma, quote, or line break, doubling inner quotes.
pub fn escape_csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
