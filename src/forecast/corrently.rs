use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tokio::sync::RwLock;

use crate::domain::{ForecastPoint, ForecastSeries};

/// Supplies the forecast series for a publication cycle, from cache or
/// network. Freshness policy is owned by the implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GsiProvider: Send + Sync {
    async fn fetch(&self) -> Result<ForecastSeries>;
}

/// Corrently GSI API client for a fixed postal code, with a TTL cache so
/// the refresh schedule can fire more often than the provider updates.
#[derive(Clone)]
pub struct CorrentlyGsiProvider {
    base_url: String,
    zip: String,
    client: reqwest::Client,
    cache: Arc<RwLock<Option<(DateTime<Utc>, ForecastSeries)>>>,
    ttl: Duration,
}

impl CorrentlyGsiProvider {
    pub fn new(base_url: String, zip: String, timeout: Duration, ttl: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("green-signal-publisher/0.2"),
        );
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            base_url,
            zip,
            client,
            cache: Arc::new(RwLock::new(None)),
            ttl,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/core/gsi?zip={}",
            self.base_url.trim_end_matches('/'),
            self.zip
        )
    }
}

#[async_trait]
impl GsiProvider for CorrentlyGsiProvider {
    async fn fetch(&self) -> Result<ForecastSeries> {
        {
            let c = self.cache.read().await;
            if let Some((fetched_at, series)) = &*c {
                if (Utc::now() - *fetched_at).num_seconds() < self.ttl.as_secs() as i64 {
                    return Ok(series.clone());
                }
            }
        }

        let resp = self
            .client
            .get(self.url())
            .send()
            .await
            .context("GSI GET failed")?;
        let status = resp.status();
        let body = resp.text().await.context("GSI read failed")?;
        if !status.is_success() {
            anyhow::bail!("GSI API error: HTTP {status}: {body}");
        }

        let raw: RawGsiResponse = serde_json::from_str(&body).context("GSI JSON parse failed")?;
        let series = ForecastSeries::new(
            raw.forecast
                .into_iter()
                .map(|r| ForecastPoint {
                    timestamp: r.time_stamp,
                    value: r.gsi,
                })
                .collect(),
        );

        let mut c = self.cache.write().await;
        *c = Some((Utc::now(), series.clone()));
        Ok(series)
    }
}

#[derive(Debug, Deserialize)]
struct RawGsiResponse {
    forecast: Vec<RawGsiPoint>,
}

#[derive(Debug, Deserialize)]
struct RawGsiPoint {
    #[serde(rename = "timeStamp")]
    time_stamp: i64,
    gsi: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn forecast_body() -> &'static str {
        r#"{
            "support": "https://corrently.de",
            "forecast": [
                {"timeStamp": 1700000000000, "gsi": 42, "co2_g_standard": 350},
                {"timeStamp": 1700003600000, "gsi": 55, "co2_g_standard": 320}
            ]
        }"#
    }

    async fn provider_for(server: &MockServer, ttl: Duration) -> CorrentlyGsiProvider {
        CorrentlyGsiProvider::new(
            server.uri(),
            "69256".to_string(),
            Duration::from_secs(5),
            ttl,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_parses_forecast_in_provider_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/core/gsi"))
            .and(query_param("zip", "69256"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(forecast_body(), "application/json"))
            .mount(&server)
            .await;

        let provider = provider_for(&server, Duration::from_secs(3600)).await;
        let series = provider.fetch().await.unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(
            series.points()[0],
            ForecastPoint {
                timestamp: 1_700_000_000_000,
                value: 42
            }
        );
        assert_eq!(series.points()[1].value, 55);
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/core/gsi"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(forecast_body(), "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Duration::from_secs(3600)).await;
        let first = provider.fetch().await.unwrap();
        let second = provider.fetch().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_expired_cache_refetches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/core/gsi"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(forecast_body(), "application/json"))
            .expect(2)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Duration::from_secs(0)).await;
        provider.fetch().await.unwrap();
        provider.fetch().await.unwrap();
    }

    #[tokio::test]
    async fn test_http_error_is_a_fetch_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/core/gsi"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = provider_for(&server, Duration::from_secs(3600)).await;
        let err = provider.fetch().await.unwrap_err();
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_fetch_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/core/gsi"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "application/json"))
            .mount(&server)
            .await;

        let provider = provider_for(&server, Duration::from_secs(3600)).await;
        let err = provider.fetch().await.unwrap_err();
        assert!(err.to_string().contains("parse"));
    }
}
