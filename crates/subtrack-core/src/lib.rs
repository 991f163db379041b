//! subtrack-core
//!
//! Business logic and services for SubTrack.
//! Depends on subtrack-domain. No CLI, no terminal I/O, no network clients;
//! persistence and rate fetching are reached through traits.

pub mod cost_service;
pub mod error;
pub mod export_service;
pub mod icon_service;
pub mod rates_service;
pub mod settings_service;
pub mod storage;
pub mod subscription_service;
pub mod time;

pub use cost_service::*;
pub use error::CoreError;
pub use export_service::*;
pub use icon_service::*;
pub use rates_service::*;
pub use settings_service::*;
pub use storage::{KeyValueStore, MemoryStore};
pub use subscription_service::*;
pub use time::{Clock, FixedClock, SystemClock};
