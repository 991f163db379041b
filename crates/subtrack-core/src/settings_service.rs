use std::sync::Arc;

use subtrack_domain::Currency;
use tracing::{info, warn};

use crate::{
    storage::{load_json, save_json, KeyValueStore, DISPLAY_CURRENCY_KEY},
    CoreError,
};

/// The user's chosen display currency, backed by the `selected_currency` key.
pub struct DisplaySettings {
    storage: Arc<dyn KeyValueStore>,
    currency: Currency,
}

impl DisplaySettings {
    /// Absent or unreadable values fall back to the base currency.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let currency = match load_json::<String>(storage.as_ref(), DISPLAY_CURRENCY_KEY) {
            Ok(Some(code)) => code.parse().unwrap_or_else(|_| {
                warn!(%code, "unknown display currency, using {}", Currency::BASE);
                Currency::BASE
            }),
            Ok(None) => Currency::BASE,
            Err(err) => {
                warn!(error = %err, "failed to read display currency");
                Currency::BASE
            }
        };
        Self { storage, currency }
    }

    pub fn display_currency(&self) -> Currency {
        self.currency
    }

    pub fn set_display_currency(&mut self, currency: Currency) -> Result<(), CoreError> {
        save_json(self.storage.as_ref(), DISPLAY_CURRENCY_KEY, currency.code())?;
        self.currency = currency;
        info!(currency = %currency, "display currency updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn defaults_to_usd_and_persists_changes() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut settings = DisplaySettings::load(storage.clone());
        assert_eq!(settings.display_currency(), Currency::Usd);

        settings.set_display_currency(Currency::Jpy).unwrap();
        assert_eq!(
            storage.get(DISPLAY_CURRENCY_KEY).unwrap().as_deref(),
            Some("\"JPY\"")
        );
        assert_eq!(DisplaySettings::load(storage).display_currency(), Currency::Jpy);
    }

    #[test]
    fn unknown_code_falls_back() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        storage.set(DISPLAY_CURRENCY_KEY, "\"CHF\"").unwrap();
        assert_eq!(DisplaySettings::load(storage.clone()).display_currency(), Currency::Usd);
        storage.set(DISPLAY_CURRENCY_KEY, "not json").unwrap();
        assert_eq!(DisplaySettings::load(storage).display_currency(), Currency::Usd);
    }
}
