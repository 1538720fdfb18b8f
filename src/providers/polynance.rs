// src/providers/polynance.rs
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::{MarketDataProvider, ProviderError};
use crate::config::{ms, ProviderConfig};
use crate::types::MarketDescriptor;

/// REST client for the aggregated prediction-market API.
pub struct PolynanceClient {
    http: Client,
    base_url: String,
}

impl PolynanceClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn from_config(cfg: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(ms(cfg.timeout_ms))
            .user_agent(cfg.user_agent.as_str())
            .build()?;
        Ok(Self::new(http, cfg.base_url.as_str()))
    }

    async fn error_for(resp: reqwest::Response, url: String) -> ProviderError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        ProviderError::Status { status, url, body }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
        url: String,
    ) -> Result<T, ProviderError> {
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ProviderError::Decode { url, source })
    }
}

#[async_trait]
impl MarketDataProvider for PolynanceClient {
    async fn get_active_markets(
        &self,
        protocol: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<MarketDescriptor>, ProviderError> {
        let url = format!("{}/markets", self.base_url);
        let page_param = page.to_string();
        let limit_param = page_size.to_string();
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("protocol", protocol),
                ("active", "true"),
                ("page", page_param.as_str()),
                ("limit", limit_param.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_for(resp, url).await);
        }
        let markets: Vec<MarketDescriptor> = Self::decode(resp, url).await?;
        tracing::debug!(protocol, page, fetched = markets.len(), "fetched active markets");
        Ok(markets)
    }

    async fn get_market(
        &self,
        protocol: &str,
        id: &str,
    ) -> Result<MarketDescriptor, ProviderError> {
        let url = format!("{}/markets/{}/{}", self.base_url, protocol, id);
        let resp = self.http.get(&url).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound { protocol: protocol.into(), id: id.into() });
        }
        if !resp.status().is_success() {
            return Err(Self::error_for(resp, url).await);
        }
        Self::decode(resp, url).await
    }
}
