//! Derived metrics over a snapshot of subscriptions.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use subtrack_domain::{BillingCycle, Category, Currency, Subscription, SubscriptionStatus};

use crate::rates_service::{convert_amount, RateTable};

/// Width of the upcoming-renewal window, inclusive at both ends.
pub const UPCOMING_WINDOW_DAYS: i64 = 30;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Currency normalisation applied to every contribution.
#[derive(Debug, Clone, Copy)]
pub struct ConversionTarget<'a> {
    pub rates: &'a RateTable,
    pub currency: Currency,
}

impl<'a> ConversionTarget<'a> {
    pub fn new(rates: &'a RateTable, currency: Currency) -> Self {
        Self { rates, currency }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UpcomingRenewal<'a> {
    pub subscription: &'a Subscription,
    pub days_until: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub active: usize,
    pub paused: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: Category,
    pub label: &'static str,
    pub count: usize,
    pub percentage: f64,
    pub color: &'static str,
}

/// Dashboard figures computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSummary {
    pub currency: Currency,
    pub monthly: f64,
    pub annual: f64,
    pub active_count: usize,
    pub upcoming_count: usize,
    /// False when raw prices were summed without conversion.
    pub converted: bool,
}

pub struct CostService;

impl CostService {
    /// Monthly cost in the record's own currency. Invalid prices yield 0.
    pub fn monthly_equivalent(subscription: &Subscription) -> f64 {
        if !subscription.has_valid_price() {
            return 0.0;
        }
        match subscription.billing_cycle {
            BillingCycle::Monthly => subscription.price,
            BillingCycle::Yearly => subscription.price / 12.0,
            BillingCycle::Other => 0.0,
        }
    }

    /// Annual cost in the record's own currency. Invalid prices yield 0.
    pub fn annual_equivalent(subscription: &Subscription) -> f64 {
        if !subscription.has_valid_price() {
            return 0.0;
        }
        match subscription.billing_cycle {
            BillingCycle::Monthly => subscription.price * 12.0,
            BillingCycle::Yearly => subscription.price,
            BillingCycle::Other => 0.0,
        }
    }

    pub fn monthly_total(subscriptions: &[Subscription], target: Option<ConversionTarget<'_>>) -> f64 {
        Self::total(subscriptions, target, Self::monthly_equivalent)
    }

    pub fn annual_total(subscriptions: &[Subscription], target: Option<ConversionTarget<'_>>) -> f64 {
        Self::total(subscriptions, target, Self::annual_equivalent)
    }

    fn total(
        subscriptions: &[Subscription],
        target: Option<ConversionTarget<'_>>,
        equivalent: fn(&Subscription) -> f64,
    ) -> f64 {
        subscriptions
            .iter()
            .filter(|subscription| subscription.is_active())
            .map(|subscription| Self::contribution(subscription, equivalent(subscription), target))
            .sum()
    }

    /// Amount expressed in the target currency, or 0 when it cannot be.
    fn contribution(
        subscription: &Subscription,
        amount: f64,
        target: Option<ConversionTarget<'_>>,
    ) -> f64 {
        let Some(currency) = subscription.currency else {
            return 0.0;
        };
        if !amount.is_finite() {
            return 0.0;
        }
        match target {
            Some(target) => convert_amount(amount, currency, target.currency, target.rates)
                .unwrap_or(0.0),
            None => amount,
        }
    }

    /// Whole days from `now` until the renewal instant, rounded up. Negative when overdue.
    pub fn days_until_renewal(subscription: &Subscription, now: DateTime<Utc>) -> i64 {
        let millis = (subscription.renewal_instant() - now).num_milliseconds();
        let days = millis.div_euclid(MILLIS_PER_DAY);
        if millis.rem_euclid(MILLIS_PER_DAY) > 0 {
            days + 1
        } else {
            days
        }
    }

    /// Active records renewing within `[now, now + 30 days]`, soonest first.
    pub fn upcoming_renewals(
        subscriptions: &[Subscription],
        now: DateTime<Utc>,
    ) -> Vec<UpcomingRenewal<'_>> {
        let horizon = now + Duration::days(UPCOMING_WINDOW_DAYS);
        let mut upcoming: Vec<_> = subscriptions
            .iter()
            .filter(|subscription| subscription.is_active())
            .filter(|subscription| {
                let instant = subscription.renewal_instant();
                instant >= now && instant <= horizon
            })
            .map(|subscription| UpcomingRenewal {
                subscription,
                days_until: Self::days_until_renewal(subscription, now),
            })
            .collect();
        upcoming.sort_by_key(|item| item.subscription.renewal_date);
        upcoming
    }

    pub fn active_count(subscriptions: &[Subscription]) -> usize {
        subscriptions.iter().filter(|s| s.is_active()).count()
    }

    pub fn status_counts(subscriptions: &[Subscription]) -> StatusCounts {
        subscriptions
            .iter()
            .fold(StatusCounts::default(), |mut counts, subscription| {
                counts.total += 1;
                match subscription.status {
                    SubscriptionStatus::Active => counts.active += 1,
                    SubscriptionStatus::Paused => counts.paused += 1,
                    SubscriptionStatus::Cancelled => counts.cancelled += 1,
                }
                counts
            })
    }

    /// Share of active records per category, omitting empty categories.
    pub fn category_breakdown(subscriptions: &[Subscription]) -> Vec<CategoryShare> {
        let active: Vec<&Subscription> = subscriptions.iter().filter(|s| s.is_active()).collect();
        if active.is_empty() {
            return Vec::new();
        }
        Category::ALL
            .iter()
            .filter_map(|category| {
                let count = active.iter().filter(|s| s.category == *category).count();
                (count > 0).then(|| CategoryShare {
                    category: *category,
                    label: category.label(),
                    count,
                    percentage: count as f64 / active.len() as f64 * 100.0,
                    color: category.color(),
                })
            })
            .collect()
    }

    /// Without a target the raw amounts are summed and labelled `display`.
    pub fn summarize(
        subscriptions: &[Subscription],
        now: DateTime<Utc>,
        display: Currency,
        target: Option<ConversionTarget<'_>>,
    ) -> CostSummary {
        CostSummary {
            currency: target.map(|t| t.currency).unwrap_or(display),
            monthly: Self::monthly_total(subscriptions, target),
            annual: Self::annual_total(subscriptions, target),
            active_count: Self::active_count(subscriptions),
            upcoming_count: Self::upcoming_renewals(subscriptions, now).len(),
            converted: target.is_some(),
        }
    }
}
