//! Interactive data entry for new subscriptions.
//!
//! Each field is validated as it is typed; the collected draft is shown back
//! for a final confirmation before it is handed to the store.

use chrono::NaiveDate;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use subtrack_domain::{BillingCycle, Category, Currency, NewSubscription};

use crate::cli::core::CommandError;
use crate::cli::format::{format_date, format_money};
use crate::cli::io;

/// Outcome of running a form to the end.
#[derive(Debug, Clone, PartialEq)]
pub enum FormResult<T> {
    Completed(T),
    Cancelled,
}

pub(crate) fn validate_name(input: &str) -> Result<String, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err("Name cannot be empty".into())
    } else {
        Ok(trimmed.to_string())
    }
}

pub(crate) fn validate_price(input: &str) -> Result<f64, String> {
    let value = input
        .trim()
        .parse::<f64>()
        .map_err(|_| "Enter a numeric value".to_string())?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err("Value must be greater than zero".into())
    }
}

/// Blank input means "use the default".
pub(crate) fn validate_optional_date(input: &str) -> Result<Option<NaiveDate>, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| "Use YYYY-MM-DD format".into())
}

/// Walks the user through every field of a new subscription.
pub struct SubscriptionWizard<'a> {
    theme: &'a ColorfulTheme,
    today: NaiveDate,
    display: Currency,
}

impl<'a> SubscriptionWizard<'a> {
    pub fn new(theme: &'a ColorfulTheme, today: NaiveDate, display: Currency) -> Self {
        Self {
            theme,
            today,
            display,
        }
    }

    pub fn run(&self) -> Result<FormResult<NewSubscription>, CommandError> {
        let name: String = Input::with_theme(self.theme)
            .with_prompt("Name")
            .validate_with(|input: &String| validate_name(input).map(|_| ()))
            .interact_text()?;
        let price_raw: String = Input::with_theme(self.theme)
            .with_prompt("Price")
            .validate_with(|input: &String| validate_price(input).map(|_| ()))
            .interact_text()?;

        let currency = self.pick(
            "Currency",
            &Currency::ALL,
            Currency::ALL
                .iter()
                .position(|c| *c == self.display)
                .unwrap_or(0),
            |c| format!("{} ({})", c.code(), c.label()),
        )?;
        let cycle = self.pick("Billing cycle", &BillingCycle::ALL, 0, |c| c.label().into())?;
        let category = self.pick(
            "Category",
            &Category::ALL,
            Category::ALL.len() - 1,
            |c| c.label().into(),
        )?;

        let start_raw: String = Input::with_theme(self.theme)
            .with_prompt(format!("Start date (blank for {})", format_date(self.today)))
            .allow_empty(true)
            .validate_with(|input: &String| validate_optional_date(input).map(|_| ()))
            .interact_text()?;
        let renewal_raw: String = Input::with_theme(self.theme)
            .with_prompt("Next renewal (blank for one cycle after start)")
            .allow_empty(true)
            .validate_with(|input: &String| validate_optional_date(input).map(|_| ()))
            .interact_text()?;
        let notes = io::prompt_text(self.theme, "Notes (optional)", None)?;

        let price = validate_price(&price_raw).map_err(CommandError::InvalidArguments)?;
        let mut draft = NewSubscription::new(
            validate_name(&name).map_err(CommandError::InvalidArguments)?,
            price,
            currency,
            cycle,
        )
        .with_category(category);
        if let Some(start) = validate_optional_date(&start_raw).map_err(CommandError::InvalidArguments)? {
            draft = draft.with_start_date(start);
        }
        if let Some(renewal) =
            validate_optional_date(&renewal_raw).map_err(CommandError::InvalidArguments)?
        {
            draft = draft.with_renewal_date(renewal);
        }
        if !notes.trim().is_empty() {
            draft = draft.with_notes(notes);
        }

        io::print_info(format!(
            "{} - {} {}, {}",
            draft.name,
            format_money(price, currency),
            cycle.label().to_lowercase(),
            category.label()
        ));
        let confirmed = Confirm::with_theme(self.theme)
            .with_prompt("Save this subscription?")
            .default(true)
            .interact()?;
        if confirmed {
            Ok(FormResult::Completed(draft))
        } else {
            Ok(FormResult::Cancelled)
        }
    }

    fn pick<T: Copy>(
        &self,
        prompt: &str,
        options: &[T],
        default: usize,
        label: impl Fn(&T) -> String,
    ) -> Result<T, CommandError> {
        let items: Vec<String> = options.iter().map(label).collect();
        let index = Select::with_theme(self.theme)
            .with_prompt(prompt)
            .items(&items)
            .default(default)
            .interact()?;
        options
            .get(index)
            .copied()
            .ok_or_else(|| CommandError::Message(format!("no {} selected", prompt.to_lowercase())))
    }
}
