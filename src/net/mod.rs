//! Blocking HTTP implementations of the core provider traits.

use std::{collections::HashMap, time::Duration};

use reqwest::{blocking::Client, header};
use serde::Deserialize;
use subtrack_core::{IconProbe, RateFetchError, RateProvider};
use tracing::debug;

/// Fetches USD-based rates from an exchangerate-api compatible endpoint.
pub struct HttpRateProvider {
    client: Client,
    endpoint: String,
}

impl HttpRateProvider {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl RateProvider for HttpRateProvider {
    fn fetch_latest(&self) -> Result<HashMap<String, f64>, RateFetchError> {
        debug!(endpoint = %self.endpoint, "requesting exchange rates");
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .map_err(|err| RateFetchError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RateFetchError::Status(status.as_u16()));
        }
        let body = response
            .text()
            .map_err(|err| RateFetchError::Transport(err.to_string()))?;
        parse_rates_payload(&body)
    }
}

#[derive(Debug, Deserialize)]
struct RatesPayload {
    rates: Option<HashMap<String, serde_json::Value>>,
}

/// Extracts the `rates` map, keeping numeric entries only.
pub fn parse_rates_payload(body: &str) -> Result<HashMap<String, f64>, RateFetchError> {
    let payload: RatesPayload =
        serde_json::from_str(body).map_err(|err| RateFetchError::Payload(err.to_string()))?;
    let rates = payload
        .rates
        .ok_or_else(|| RateFetchError::Payload("response has no `rates` map".into()))?;
    Ok(rates
        .into_iter()
        .filter_map(|(code, value)| value.as_f64().map(|rate| (code.to_ascii_uppercase(), rate)))
        .collect())
}

/// Confirms favicon URLs with a HEAD request.
pub struct HttpIconProbe {
    client: Client,
}

impl HttpIconProbe {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl IconProbe for HttpIconProbe {
    fn exists(&self, url: &str) -> bool {
        match self.client.head(url).send() {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(%url, error = %err, "icon probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_rates_are_extracted() {
        let body = r#"{"base":"USD","date":"2024-06-01","rates":{"USD":1,"EUR":0.93,"JPY":156.9,"XXX":"n/a"}}"#;
        let rates = parse_rates_payload(body).unwrap();
        assert_eq!(rates.get("EUR"), Some(&0.93));
        assert_eq!(rates.get("USD"), Some(&1.0));
        assert!(!rates.contains_key("XXX"));
    }

    #[test]
    fn payload_without_rates_is_rejected() {
        assert!(matches!(
            parse_rates_payload(r#"{"result":"error"}"#),
            Err(RateFetchError::Payload(_))
        ));
        assert!(matches!(
            parse_rates_payload("<html>"),
            Err(RateFetchError::Payload(_))
        ));
    }

    #[test]
    fn unreachable_endpoint_is_a_transport_error() {
        let provider =
            HttpRateProvider::new("http://127.0.0.1:9/latest", Duration::from_secs(2)).unwrap();
        assert!(matches!(
            provider.fetch_latest(),
            Err(RateFetchError::Transport(_))
        ));
    }
}
