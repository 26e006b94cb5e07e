//! Census Bureau data API client.

use crate::Year;
use crate::error::{DataError, Result};
use crate::geography::Geography;
use crate::response::parse_response;
use polars::prelude::DataFrame;
use std::time::Duration;

/// Census data API host.
pub const CENSUS_BASE_URL: &str = "https://api.census.gov";

/// Default transport timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// User agent sent with every request.
const USER_AGENT: &str = concat!("census-pull/", env!("CARGO_PKG_VERSION"));

/// Placeholder written in place of the API key wherever a URL is logged.
const REDACTED: &str = "REDACTED";

/// Connection settings, passed explicitly into [`CensusClient::new`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Scheme and host, without a trailing slash.
    pub base_url: String,
    /// API key. Requests go out without a `key` parameter when absent.
    pub api_key: Option<String>,
    /// Transport timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Config for the public API with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Point the client at a different host (mirrors, local fixtures).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the transport timeout.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: CENSUS_BASE_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// One table query: which fields, for which year, at which geography.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Survey year
    pub year: Year,
    /// Row resolution
    pub geography: Geography,
    /// Dataset family, e.g. `acs` or `dec`
    pub dataset: String,
    /// Table within the family, e.g. `acs5` or `sf1`
    pub table: String,
    /// Field identifiers, deduplicated, in request order
    pub fields: Vec<String>,
}

impl FetchRequest {
    /// Build a request. Repeated field identifiers are dropped after their
    /// first occurrence.
    pub fn new<I, S>(
        year: Year,
        geography: Geography,
        dataset: impl Into<String>,
        table: impl Into<String>,
        fields: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for field in fields {
            let field = field.into();
            if !unique.contains(&field) {
                unique.push(field);
            }
        }
        Self {
            year,
            geography,
            dataset: dataset.into(),
            table: table.into(),
            fields: unique,
        }
    }
}

/// Census data API client.
///
/// Issues one GET per [`fetch`](Self::fetch) call. No retries and no caching.
pub struct CensusClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl CensusClient {
    /// Create a client from explicit configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(DataError::Network)?;

        Ok(Self { client, config })
    }

    /// Dataset endpoint, `{base}/data/{year}/{dataset}/{table}`.
    pub fn endpoint(&self, request: &FetchRequest) -> String {
        format!(
            "{}/data/{}/{}/{}",
            self.config.base_url, request.year, request.dataset, request.table
        )
    }

    /// Full request URL including the API key.
    pub fn request_url(&self, request: &FetchRequest) -> String {
        self.build_url(request, self.config.api_key.as_deref())
    }

    /// Request URL safe to log.
    pub fn redacted_url(&self, request: &FetchRequest) -> String {
        self.build_url(request, self.config.api_key.as_ref().map(|_| REDACTED))
    }

    // The geography filter is pre-encoded, so the query is assembled by hand
    // rather than through reqwest's encoder.
    fn build_url(&self, request: &FetchRequest, key: Option<&str>) -> String {
        let mut url = format!(
            "{}?get={}&for={}",
            self.endpoint(request),
            request.fields.join(","),
            request.geography.filter()
        );
        if let Some(key) = key {
            url.push_str("&key=");
            url.push_str(key);
        }
        url
    }

    /// Fetch and normalize one table.
    ///
    /// The result holds the geography key columns followed by the requested
    /// fields in order, with negative and non-numeric values set to null.
    ///
    /// # Errors
    /// - [`DataError::EmptyFieldList`] if `request.fields` is empty
    /// - [`DataError::RequestFailed`] on a non-2xx status
    /// - [`DataError::MalformedResponse`] if the body is not header + rows or
    ///   lacks a requested column
    /// - [`DataError::Network`] on transport failure
    pub async fn fetch(&self, request: &FetchRequest) -> Result<DataFrame> {
        if request.fields.is_empty() {
            return Err(DataError::EmptyFieldList);
        }

        let url = self.request_url(request);
        let shown = self.redacted_url(request);
        tracing::debug!(url = %shown, year = request.year, "requesting census table");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DataError::Network(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::RequestFailed {
                status: status.as_u16(),
                url: shown,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| DataError::Network(e.without_url()))?;

        let df = parse_response(&body, request.geography, &request.fields)?;
        tracing::debug!(rows = df.height(), year = request.year, "census table fetched");
        Ok(df)
    }
}

impl std::fmt::Debug for CensusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CensusClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
