#![doc(test(attr(deny(warnings))))]

//! SubTrack keeps a local record of recurring subscriptions and reports what
//! they cost per month and per year, in one display currency.

pub mod cli;
pub mod errors;
pub mod net;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("SubTrack tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
