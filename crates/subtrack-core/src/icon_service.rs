//! Service icon lookup with a seven-day cache.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    storage::{load_json, save_json, KeyValueStore, SERVICE_ICONS_KEY},
    time::Clock,
};

pub const ICON_CACHE_TTL_DAYS: i64 = 7;

const FAVICON_SERVICE: &str = "https://www.google.com/s2/favicons?sz=128&domain=";

/// Well-known services and their favicons. Order matters for partial matching.
pub const KNOWN_SERVICES: &[(&str, &str)] = &[
    ("netflix", "https://www.netflix.com/favicon.ico"),
    ("spotify", "https://www.spotify.com/favicon.ico"),
    ("youtube", "https://www.youtube.com/favicon.ico"),
    ("youtube premium", "https://www.youtube.com/favicon.ico"),
    ("apple", "https://www.apple.com/favicon.ico"),
    ("apple music", "https://www.apple.com/favicon.ico"),
    ("apple tv", "https://www.apple.com/favicon.ico"),
    ("amazon", "https://www.amazon.com/favicon.ico"),
    ("amazon prime", "https://www.amazon.com/favicon.ico"),
    ("amazon prime video", "https://www.amazon.com/favicon.ico"),
    ("hulu", "https://www.hulu.com/favicon.ico"),
    ("disney", "https://www.disneyplus.com/favicon.ico"),
    ("disney+", "https://www.disneyplus.com/favicon.ico"),
    ("disney plus", "https://www.disneyplus.com/favicon.ico"),
    ("hbo", "https://www.hbomax.com/favicon.ico"),
    ("hbo max", "https://www.hbomax.com/favicon.ico"),
    ("paramount", "https://www.paramountplus.com/favicon.ico"),
    ("paramount+", "https://www.paramountplus.com/favicon.ico"),
    ("peacock", "https://www.peacocktv.com/favicon.ico"),
    ("adobe", "https://www.adobe.com/favicon.ico"),
    ("adobe creative cloud", "https://www.adobe.com/favicon.ico"),
    ("microsoft", "https://www.microsoft.com/favicon.ico"),
    ("microsoft 365", "https://www.microsoft.com/favicon.ico"),
    ("office", "https://www.microsoft.com/favicon.ico"),
    ("github", "https://github.com/favicon.ico"),
    ("slack", "https://www.slack.com/favicon.ico"),
    ("notion", "https://www.notion.so/favicon.ico"),
    ("dropbox", "https://www.dropbox.com/favicon.ico"),
    ("google drive", "https://drive.google.com/favicon.ico"),
    ("icloud", "https://www.icloud.com/favicon.ico"),
    ("onedrive", "https://www.microsoft.com/favicon.ico"),
    ("canva", "https://www.canva.com/favicon.ico"),
    ("figma", "https://www.figma.com/favicon.ico"),
    ("grammarly", "https://www.grammarly.com/favicon.ico"),
    ("chatgpt", "https://chatgpt.com/favicon.ico"),
    ("openai", "https://openai.com/favicon.ico"),
    ("duolingo", "https://www.duolingo.com/favicon.ico"),
    ("skillshare", "https://www.skillshare.com/favicon.ico"),
    ("udemy", "https://www.udemy.com/favicon.ico"),
    ("coursera", "https://www.coursera.org/favicon.ico"),
    ("linkedin", "https://www.linkedin.com/favicon.ico"),
    ("linkedin learning", "https://www.linkedin.com/favicon.ico"),
    ("gym", "https://www.equinox.com/favicon.ico"),
    ("peloton", "https://www.onepeloton.com/favicon.ico"),
    ("planet fitness", "https://www.planetfitness.com/favicon.ico"),
    ("strava", "https://www.strava.com/favicon.ico"),
    ("myfitnesspal", "https://www.myfitnesspal.com/favicon.ico"),
    ("audible", "https://www.audible.com/favicon.ico"),
    ("medium", "https://www.medium.com/favicon.ico"),
    ("substack", "https://www.substack.com/favicon.ico"),
    ("patreon", "https://www.patreon.com/favicon.ico"),
    ("twitch", "https://www.twitch.tv/favicon.ico"),
    ("discord", "https://discord.com/favicon.ico"),
];

/// Checks whether a remote icon URL is reachable.
pub trait IconProbe: Send + Sync {
    fn exists(&self, url: &str) -> bool;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedIcon {
    pub url: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

type IconEntries = BTreeMap<String, CachedIcon>;

/// Favicon URL candidate derived from a service name.
pub fn favicon_url(name: &str) -> String {
    let domain: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    format!("{FAVICON_SERVICE}{domain}.com")
}

/// Looks `name` up in [`KNOWN_SERVICES`]: exact key first, then the first
/// entry where either string contains the other.
pub fn known_service_icon(name: &str) -> Option<&'static str> {
    let key = name.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }
    KNOWN_SERVICES
        .iter()
        .find(|(service, _)| *service == key)
        .or_else(|| {
            KNOWN_SERVICES
                .iter()
                .find(|(service, _)| key.contains(service) || service.contains(key.as_str()))
        })
        .map(|(_, url)| *url)
}

pub struct IconCache {
    storage: Arc<dyn KeyValueStore>,
    probe: Option<Box<dyn IconProbe>>,
    clock: Arc<dyn Clock>,
}

impl IconCache {
    /// Without a probe, lookups stop at the known-services table.
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        probe: Option<Box<dyn IconProbe>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            probe,
            clock,
        }
    }

    pub fn icon_for(&self, name: &str) -> Option<String> {
        let key = name.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }

        let now = self.clock.now();
        let mut entries = self.read_entries();
        if let Some(entry) = entries.get(&key) {
            let age = now - entry.timestamp;
            if age >= Duration::zero() && age < Duration::days(ICON_CACHE_TTL_DAYS) {
                debug!(service = %key, "icon cache hit");
                return Some(entry.url.clone());
            }
        }

        let url = match known_service_icon(&key) {
            Some(url) => url.to_string(),
            None => {
                let candidate = favicon_url(&key);
                let probe = self.probe.as_ref()?;
                if !probe.exists(&candidate) {
                    return None;
                }
                candidate
            }
        };

        entries.insert(
            key,
            CachedIcon {
                url: url.clone(),
                timestamp: now,
            },
        );
        if let Err(err) = save_json(self.storage.as_ref(), SERVICE_ICONS_KEY, &entries) {
            warn!(error = %err, "failed to write icon cache");
        }
        Some(url)
    }

    fn read_entries(&self) -> IconEntries {
        match load_json::<IconEntries>(self.storage.as_ref(), SERVICE_ICONS_KEY) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable icon cache");
                IconEntries::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_beats_partial() {
        assert_eq!(
            known_service_icon("HBO Max"),
            Some("https://www.hbomax.com/favicon.ico")
        );
        assert_eq!(
            known_service_icon("Netflix Family"),
            Some("https://www.netflix.com/favicon.ico")
        );
        assert_eq!(known_service_icon("   "), None);
        assert_eq!(known_service_icon("zzqx"), None);
    }

    #[test]
    fn favicon_candidate_drops_whitespace() {
        assert_eq!(
            favicon_url("my service"),
            "https://www.google.com/s2/favicons?sz=128&domain=myservice.com"
        );
    }
}
