/// HTTP client for the Busan open-data listings
use serde_json::Value;
use std::time::Duration;

use super::dataset::Dataset;
use super::error::CollectError;
use crate::api::{build_http_client, log_request, log_response};
use crate::utils::redacted_query_string;

/// Query parameter carrying the API key
const SERVICE_KEY_PARAM: &str = "serviceKey";

/// Anything that can hand back the raw JSON body of one listing page.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_page(
        &self,
        dataset: Dataset,
        page_no: u32,
        page_size: u32,
    ) -> Result<Value, CollectError>;
}

/// Open-data API client
pub struct DataApiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl DataApiClient {
    /// Create a client whose every request is bounded by `timeout`.
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, CollectError> {
        let client = build_http_client(Some(timeout))
            .map_err(|e| CollectError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn page_params(&self, page_no: u32, page_size: u32) -> Vec<(String, String)> {
        vec![
            (SERVICE_KEY_PARAM.to_string(), self.api_key.clone()),
            ("pageNo".to_string(), page_no.to_string()),
            ("numOfRows".to_string(), page_size.to_string()),
            ("resultType".to_string(), "json".to_string()),
        ]
    }
}

impl PageSource for DataApiClient {
    async fn fetch_page(
        &self,
        dataset: Dataset,
        page_no: u32,
        page_size: u32,
    ) -> Result<Value, CollectError> {
        let url = format!("{}{}", self.base_url, dataset.endpoint());
        let params = self.page_params(page_no, page_size);

        let url_for_log = format!("{}?{}", url, redacted_query_string(&params, &[SERVICE_KEY_PARAM]));
        log_request("GET", &url_for_log, &[], None);
        tracing::debug!(%dataset, page_no, page_size, "Requesting page");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| CollectError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CollectError::Network(e.to_string()))?;

        if !status.is_success() {
            log_response(&format!("HTTP {}: {}", status, text));
            return Err(CollectError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        log_response(&format!("HTTP {} ({} bytes)", status, text.len()));

        serde_json::from_str(&text).map_err(|e| {
            CollectError::Shape(format!("Response is not JSON: {}", e))
        })
    }
}
