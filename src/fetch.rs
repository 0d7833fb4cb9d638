use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::row::Row;

/// Which way a cursor-mode page request walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchDirection {
    Forward,
    Backward,
}

/// Parameters handed to the fetch collaborator for one page.
#[derive(Debug, Clone, Serialize)]
pub struct FetchRequest {
    pub cursor: Option<String>,
    pub limit: usize,
    pub direction: FetchDirection,
    /// Serialized filter expression; filtering is the backend's job in
    /// cursor mode
    pub filter: Option<String>,
}

/// One page of rows plus paging tokens, as returned by the backend.
/// Every field defaults so partial backends stay compatible.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FetchResponse {
    #[serde(default)]
    pub items: Vec<Row>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub prev_cursor: Option<String>,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_prev: bool,
}

impl FetchResponse {
    /// The normalized shape a failed fetch degrades to.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A backend able to serve cursor-paged requests.
pub trait PageFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

/// Blocking HTTP implementation: posts the request as JSON to a
/// configured endpoint and deserializes the page response.
pub struct HttpPageFetcher {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpPageFetcher {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl PageFetcher for HttpPageFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        debug!(
            target: "fetch",
            "requesting page cursor={:?} limit={} direction={:?}",
            request.cursor, request.limit, request.direction
        );

        let response = self.client.post(&self.endpoint).json(request).send()?;
        if !response.status().is_success() {
            return Err(anyhow!("page fetch failed: {}", response.status()));
        }

        Ok(response.json()?)
    }
}
