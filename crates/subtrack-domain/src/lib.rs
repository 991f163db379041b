//! subtrack-domain
//!
//! Pure domain models (Subscription, Currency, BillingCycle, Category, Status).
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod common;
pub mod currency;
pub mod id;
pub mod subscription;

pub use common::*;
pub use currency::*;
pub use id::SubscriptionId;
pub use subscription::*;
