//! Canonical owner of the subscription collection.

use std::sync::Arc;

use subtrack_domain::{
    normalize_notes, NewSubscription, Subscription, SubscriptionId, SubscriptionPatch,
};
use tracing::{debug, info};

use crate::{
    storage::{load_json, save_json, KeyValueStore, SUBSCRIPTIONS_KEY},
    time::Clock,
    CoreError,
};

const MIN_ID_PREFIX: usize = 4;

/// Write-through store for subscriptions.
///
/// Every mutation builds the next collection, persists it as a whole and only
/// then replaces the in-memory copy. A failed write leaves the store exactly
/// as it was.
pub struct SubscriptionStore {
    subscriptions: Vec<Subscription>,
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl SubscriptionStore {
    /// Loads the persisted collection. An absent entry is an empty collection.
    pub fn load(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Result<Self, CoreError> {
        let subscriptions = read_collection(storage.as_ref())?;
        debug!(count = subscriptions.len(), "loaded subscriptions");
        Ok(Self {
            subscriptions,
            storage,
            clock,
        })
    }

    /// Re-reads the collection from storage, discarding the in-memory copy.
    pub fn reload(&mut self) -> Result<(), CoreError> {
        self.subscriptions = read_collection(self.storage.as_ref())?;
        Ok(())
    }

    pub fn list(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn get(&self, id: &SubscriptionId) -> Option<&Subscription> {
        self.subscriptions.iter().find(|sub| &sub.id == id)
    }

    /// Resolves a user reference: exact id, then case-insensitive name, then a
    /// unique id prefix of at least four characters.
    pub fn find(&self, reference: &str) -> Result<&Subscription, CoreError> {
        let needle = reference.trim();
        if needle.is_empty() {
            return Err(CoreError::Validation("subscription reference is empty".into()));
        }
        if let Some(exact) = self
            .subscriptions
            .iter()
            .find(|sub| sub.id.as_str().eq_ignore_ascii_case(needle))
        {
            return Ok(exact);
        }

        let by_name: Vec<&Subscription> = self
            .subscriptions
            .iter()
            .filter(|sub| sub.name.trim().eq_ignore_ascii_case(needle))
            .collect();
        match by_name.as_slice() {
            [single] => return Ok(*single),
            [] => {}
            _ => {
                return Err(CoreError::Validation(format!(
                    "`{}` matches {} subscriptions; use the id instead",
                    needle,
                    by_name.len()
                )))
            }
        }

        if needle.len() >= MIN_ID_PREFIX {
            let prefix = needle.to_ascii_lowercase();
            let by_prefix: Vec<&Subscription> = self
                .subscriptions
                .iter()
                .filter(|sub| sub.id.as_str().to_ascii_lowercase().starts_with(&prefix))
                .collect();
            match by_prefix.as_slice() {
                [single] => return Ok(*single),
                [] => {}
                _ => {
                    return Err(CoreError::Validation(format!(
                        "id prefix `{}` is ambiguous",
                        needle
                    )))
                }
            }
        }

        Err(CoreError::NotFound(needle.to_string()))
    }

    /// Validates `draft`, assigns an id and timestamps, and persists the result.
    pub fn add(&mut self, draft: NewSubscription) -> Result<SubscriptionId, CoreError> {
        let name = validate_name(&draft.name)?;
        let price = draft
            .price
            .ok_or_else(|| CoreError::Validation("price is required".into()))?;
        validate_price(price)?;
        let currency = draft
            .currency
            .ok_or_else(|| CoreError::Validation("currency is required".into()))?;
        let billing_cycle = draft
            .billing_cycle
            .ok_or_else(|| CoreError::Validation("billing cycle is required".into()))?;

        let now = self.clock.now();
        let start_date = draft.start_date.unwrap_or_else(|| self.clock.today());
        let renewal_date = draft
            .renewal_date
            .unwrap_or_else(|| billing_cycle.advance(start_date));

        let record = Subscription {
            id: self.fresh_id(),
            name,
            price,
            currency: Some(currency),
            billing_cycle,
            category: draft.category.unwrap_or_default(),
            start_date,
            renewal_date,
            status: draft.status.unwrap_or_default(),
            notes: normalize_notes(draft.notes),
            created_at: now,
            updated_at: now,
        };
        let id = record.id.clone();

        let mut next = self.subscriptions.clone();
        next.push(record);
        self.commit(next)?;
        info!(%id, "subscription added");
        Ok(id)
    }

    /// Merges `patch` into the record identified by `id` and stamps `updated_at`.
    pub fn update(&mut self, id: &SubscriptionId, patch: SubscriptionPatch) -> Result<(), CoreError> {
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if let Some(price) = patch.price {
            validate_price(price)?;
        }
        let index = self
            .subscriptions
            .iter()
            .position(|sub| &sub.id == id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        let mut next = self.subscriptions.clone();
        let record = &mut next[index];
        record.apply_patch(&patch);
        record.updated_at = self.clock.now().max(record.updated_at);
        self.commit(next)?;
        info!(%id, "subscription updated");
        Ok(())
    }

    /// Removes the record identified by `id`. Absent ids are a no-op.
    pub fn delete(&mut self, id: &SubscriptionId) -> Result<(), CoreError> {
        if self.get(id).is_none() {
            debug!(%id, "delete ignored, subscription not present");
            return Ok(());
        }
        let next: Vec<Subscription> = self
            .subscriptions
            .iter()
            .filter(|sub| &sub.id != id)
            .cloned()
            .collect();
        self.commit(next)?;
        info!(%id, "subscription deleted");
        Ok(())
    }

    /// Erases the persisted collection and empties the in-memory copy.
    pub fn clear_all(&mut self) -> Result<(), CoreError> {
        self.storage.remove(SUBSCRIPTIONS_KEY)?;
        let removed = self.subscriptions.len();
        self.subscriptions.clear();
        info!(removed, "all subscriptions cleared");
        Ok(())
    }

    fn commit(&mut self, next: Vec<Subscription>) -> Result<(), CoreError> {
        save_json(self.storage.as_ref(), SUBSCRIPTIONS_KEY, &next)?;
        self.subscriptions = next;
        Ok(())
    }

    fn fresh_id(&self) -> SubscriptionId {
        loop {
            let candidate = SubscriptionId::new_v4();
            if self.get(&candidate).is_none() {
                return candidate;
            }
        }
    }
}

fn read_collection(storage: &dyn KeyValueStore) -> Result<Vec<Subscription>, CoreError> {
    Ok(load_json(storage, SUBSCRIPTIONS_KEY)?.unwrap_or_default())
}

fn validate_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("name is required".into()));
    }
    Ok(trimmed.to_string())
}

fn validate_price(price: f64) -> Result<(), CoreError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(CoreError::Validation(format!(
            "price must be a positive number, got {}",
            price
        )));
    }
    Ok(())
}
