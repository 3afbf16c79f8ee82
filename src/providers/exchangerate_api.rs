use super::util::with_retry;
use crate::core::config::ExchangeRateProviderConfig;
use crate::core::currency::{
    CurrencyRateProvider, RateTable, is_usable_rate, normalize_base, normalize_pair, pair_label,
};
use crate::core::error::{EngineError, Result};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// A provider never makes more than one extra attempt per call.
pub const MAX_RETRIES: usize = 1;
const RETRY_DELAY_MS: u64 = 500;

/// Client for the ExchangeRate-API v6 endpoints.
///
/// - `GET {base_url}/{key}/pair/{BASE}/{TARGET}` → `{ "conversion_rate": number }`
/// - `GET {base_url}/{key}/latest/{BASE}` → `{ "conversion_rates": { code: number } }`
pub struct ExchangeRateApiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    retries: usize,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("risklens/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            retries: 0,
        })
    }

    pub fn from_config(config: &ExchangeRateProviderConfig) -> anyhow::Result<Self> {
        let provider = Self::new(&config.base_url, &config.api_key, config.timeout())?;
        Ok(provider.with_retries(config.retries))
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries.min(MAX_RETRIES);
        self
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str, pair: &str) -> Result<T> {
        let client = &self.client;
        let response = with_retry(
            move || async move { client.get(url).send().await },
            self.retries,
            RETRY_DELAY_MS,
        )
        .await
        .map_err(|e| EngineError::rate_unavailable(pair, format!("Request error: {e}")))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            EngineError::rate_unavailable(pair, format!("Failed to read response body: {e}"))
        })?;

        if !status.is_success() {
            let reason = match api_error_type(&text) {
                Some(error_type) => format!("HTTP error: {status} ({error_type})"),
                None => format!("HTTP error: {status}"),
            };
            return Err(EngineError::rate_unavailable(pair, reason));
        }

        serde_json::from_str(&text).map_err(|e| {
            EngineError::rate_unavailable(pair, format!("Failed to parse JSON response: {e}"))
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    result: Option<String>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
}

impl ApiStatus {
    fn check(&self, pair: &str) -> Result<()> {
        if self.result.as_deref() == Some("error") {
            let error_type = self.error_type.as_deref().unwrap_or("unknown-error");
            return Err(EngineError::rate_unavailable(
                pair,
                format!("API error: {error_type}"),
            ));
        }
        Ok(())
    }
}

fn api_error_type(body: &str) -> Option<String> {
    serde_json::from_str::<ApiStatus>(body)
        .ok()
        .and_then(|s| s.error_type)
}

#[derive(Debug, Deserialize)]
struct PairResponse {
    #[serde(flatten)]
    status: ApiStatus,
    conversion_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(flatten)]
    status: ApiStatus,
    conversion_rates: Option<HashMap<String, f64>>,
}

#[async_trait]
impl CurrencyRateProvider for ExchangeRateApiProvider {
    #[instrument(name = "ExchangeRatePairFetch", skip(self), fields(from = %from, to = %to))]
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        let (base, target) = normalize_pair(from, to)?;
        if base == target {
            debug!("Same currency, no lookup needed");
            return Ok(1.0);
        }

        let pair = pair_label(&base, &target);
        let url = format!("{}/{}/pair/{}/{}", self.base_url, self.api_key, base, target);
        debug!("Requesting conversion rate for {}", pair);

        let data: PairResponse = self.fetch_json(&url, &pair).await?;
        data.status.check(&pair)?;

        let rate = data.conversion_rate.ok_or_else(|| {
            EngineError::rate_unavailable(&pair, "Missing conversion_rate in response")
        })?;
        if !is_usable_rate(rate) {
            return Err(EngineError::rate_unavailable(
                &pair,
                format!("Unusable conversion rate: {rate}"),
            ));
        }
        debug!(rate, "Received conversion rate");
        Ok(rate)
    }

    #[instrument(name = "ExchangeRateTableFetch", skip(self), fields(base = %base))]
    async fn get_all_rates(&self, base: &str) -> Result<RateTable> {
        let base = normalize_base(base)?;
        let pair = pair_label(&base, "*");
        let url = format!("{}/{}/latest/{}", self.base_url, self.api_key, base);
        debug!("Requesting latest rates for {}", base);

        let data: LatestResponse = self.fetch_json(&url, &pair).await?;
        data.status.check(&pair)?;

        let rates = data.conversion_rates.ok_or_else(|| {
            EngineError::rate_unavailable(&pair, "Missing conversion_rates in response")
        })?;

        let table: RateTable = rates
            .into_iter()
            .filter(|(code, rate)| {
                let usable = is_usable_rate(*rate);
                if !usable {
                    warn!(code = %code, rate, "Dropping unusable rate");
                }
                usable
            })
            .map(|(code, rate)| (code.to_ascii_uppercase(), rate))
            .collect();

        if table.is_empty() {
            return Err(EngineError::rate_unavailable(&pair, "No usable rates in response"));
        }
        debug!(count = table.len(), "Received latest rates");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "test-key";

    async fn create_mock_server(request_path: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn provider(server: &MockServer) -> ExchangeRateApiProvider {
        ExchangeRateApiProvider::new(&server.uri(), KEY, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let body = r#"{"result": "success", "base_code": "USD", "target_code": "EUR", "conversion_rate": 0.9213}"#;
        let server = create_mock_server("/test-key/pair/USD/EUR", 200, body).await;

        let rate = provider(&server).get_rate("usd", "eur").await.unwrap();
        assert_eq!(rate, 0.9213);
    }

    #[tokio::test]
    async fn test_same_currency_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let rate = provider(&server).get_rate("USD", "USD").await.unwrap();
        assert_eq!(rate, 1.0);
        server.verify().await;
    }

    #[tokio::test]
    async fn test_http_error_is_rate_unavailable() {
        let body = r#"{"result": "error", "error-type": "unsupported-code"}"#;
        let server = create_mock_server("/test-key/pair/USD/XYZ", 404, body).await;

        let err = provider(&server).get_rate("USD", "XYZ").await.unwrap_err();
        assert_eq!(
            err,
            EngineError::rate_unavailable("USD/XYZ", "HTTP error: 404 Not Found (unsupported-code)")
        );
    }

    #[tokio::test]
    async fn test_server_error_without_body() {
        let server = create_mock_server("/test-key/pair/USD/EUR", 500, "").await;

        let err = provider(&server).get_rate("USD", "EUR").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Rate unavailable for USD/EUR: HTTP error: 500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_error_payload_with_success_status() {
        let body = r#"{"result": "error", "error-type": "invalid-key"}"#;
        let server = create_mock_server("/test-key/pair/USD/EUR", 200, body).await;

        let err = provider(&server).get_rate("USD", "EUR").await.unwrap_err();
        assert_eq!(
            err,
            EngineError::rate_unavailable("USD/EUR", "API error: invalid-key")
        );
    }

    #[tokio::test]
    async fn test_missing_rate_field() {
        let body = r#"{"result": "success", "conversion_rates": 0.92}"#;
        let server = create_mock_server("/test-key/pair/USD/EUR", 200, body).await;

        let err = provider(&server).get_rate("USD", "EUR").await.unwrap_err();
        assert!(err.is_rate_unavailable());
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let server = create_mock_server("/test-key/pair/USD/EUR", 200, "<html>oops</html>").await;

        let err = provider(&server).get_rate("USD", "EUR").await.unwrap_err();
        assert!(
            err.to_string()
                .contains("Rate unavailable for USD/EUR: Failed to parse JSON response")
        );
    }

    #[tokio::test]
    async fn test_non_positive_rate_is_rejected() {
        let body = r#"{"result": "success", "conversion_rate": 0}"#;
        let server = create_mock_server("/test-key/pair/USD/EUR", 200, body).await;

        let err = provider(&server).get_rate("USD", "EUR").await.unwrap_err();
        assert!(err.is_rate_unavailable());
    }

    #[tokio::test]
    async fn test_invalid_codes_fail_before_io() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let provider = provider(&server);

        assert!(matches!(
            provider.get_rate("US", "EUR").await,
            Err(EngineError::InvalidCurrencyPair { .. })
        ));
        assert!(provider.get_rate("", "EUR").await.unwrap_err().is_rate_unavailable());
        assert!(provider.get_all_rates("").await.unwrap_err().is_rate_unavailable());
        server.verify().await;
    }

    #[tokio::test]
    async fn test_get_all_rates() {
        let body = r#"{
            "result": "success",
            "base_code": "USD",
            "conversion_rates": {"USD": 1, "EUR": 0.9213, "JPY": 151.2, "BAD": -1}
        }"#;
        let server = create_mock_server("/test-key/latest/USD", 200, body).await;

        let table = provider(&server).get_all_rates("usd").await.unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("USD"), Some(&1.0));
        assert_eq!(table.get("EUR"), Some(&0.9213));
        assert!(!table.contains_key("BAD"));
    }

    #[tokio::test]
    async fn test_get_all_rates_missing_field() {
        let server =
            create_mock_server("/test-key/latest/USD", 200, r#"{"result": "success"}"#).await;

        let err = provider(&server).get_all_rates("USD").await.unwrap_err();
        assert_eq!(
            err,
            EngineError::rate_unavailable("USD/*", "Missing conversion_rates in response")
        );
    }

    #[tokio::test]
    async fn test_single_request_without_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test-key/pair/USD/EUR"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        assert!(provider(&server).get_rate("USD", "EUR").await.is_err());
        server.verify().await;
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_rate_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test-key/pair/USD/EUR"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"conversion_rate": 0.9}"#)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let provider =
            ExchangeRateApiProvider::new(&server.uri(), KEY, Duration::from_millis(50)).unwrap();
        let err = provider.get_rate("USD", "EUR").await.unwrap_err();
        assert!(err.to_string().contains("Request error"));
    }

    #[test]
    fn test_retries_are_capped() {
        let provider =
            ExchangeRateApiProvider::new("http://localhost", KEY, Duration::from_secs(1))
                .unwrap()
                .with_retries(5);
        assert_eq!(provider.retries, MAX_RETRIES);
    }
}
