//! City data sources - one JSON file or a REST backend

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;

use crate::state::{CityRecord, NewCity};

/// Which deployment the provider talks to, chosen once at initialization.
#[derive(Clone, Debug)]
pub enum SourceConfig {
    /// Read-only deployment: a single GET returning a JSON array of cities
    Static { url: String },
    /// Read-write REST backend rooted at a base URL
    Rest { base_url: String },
}

impl SourceConfig {
    /// Build the source this configuration describes
    pub fn build(self) -> Arc<dyn CitySource> {
        match self {
            SourceConfig::Static { url } => Arc::new(StaticJsonSource::new(url)),
            SourceConfig::Rest { base_url } => Arc::new(RestApiSource::new(base_url)),
        }
    }
}

/// Data-source error type
#[derive(Debug)]
pub enum SourceError {
    Request(reqwest::Error),
    Status(reqwest::StatusCode),
    Decode(serde_json::Error),
    ReadOnly(&'static str),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Request(e) => write!(f, "City request failed: {}", e),
            SourceError::Status(status) => write!(f, "City request returned {}", status),
            SourceError::Decode(e) => write!(f, "City response was not valid JSON: {}", e),
            SourceError::ReadOnly(op) => {
                write!(f, "Operation '{}' is not available on a static source", op)
            }
        }
    }
}

impl std::error::Error for SourceError {}

/// One network-backed collection of cities. Implementations perform exactly
/// one logical request per call and never touch application state.
#[async_trait]
pub trait CitySource: Send + Sync {
    /// Fetch the full collection, preserving server/file order
    async fn list(&self) -> Result<Vec<CityRecord>, SourceError>;

    /// Fetch one city by id; `None` when the id is unknown
    async fn get(&self, id: i64) -> Result<Option<CityRecord>, SourceError>;

    /// Submit a new city; the returned record carries the assigned id
    async fn create(&self, city: NewCity) -> Result<CityRecord, SourceError>;

    /// Remove the city with the given id
    async fn delete(&self, id: i64) -> Result<(), SourceError>;

    /// Whether create/delete are available on this source
    fn writable(&self) -> bool;
}

/// Read-only source: the whole collection lives in one JSON array at a
/// fixed URL. Single-city lookups fetch the array and filter client-side.
pub struct StaticJsonSource {
    url: String,
}

impl StaticJsonSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl CitySource for StaticJsonSource {
    async fn list(&self) -> Result<Vec<CityRecord>, SourceError> {
        fetch_json(&self.url).await
    }

    async fn get(&self, id: i64) -> Result<Option<CityRecord>, SourceError> {
        let cities = self.list().await?;
        Ok(cities.into_iter().find(|city| city.id == id))
    }

    async fn create(&self, _city: NewCity) -> Result<CityRecord, SourceError> {
        Err(SourceError::ReadOnly("create"))
    }

    async fn delete(&self, _id: i64) -> Result<(), SourceError> {
        Err(SourceError::ReadOnly("delete"))
    }

    fn writable(&self) -> bool {
        false
    }
}

/// Read-write source backed by the REST endpoints `{base}/cities` and
/// `{base}/cities/{id}`.
pub struct RestApiSource {
    base: String,
}

impl RestApiSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base = base_url.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    fn collection_url(&self) -> String {
        format!("{}/cities", self.base)
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}/cities/{}", self.base, id)
    }
}

#[async_trait]
impl CitySource for RestApiSource {
    async fn list(&self) -> Result<Vec<CityRecord>, SourceError> {
        fetch_json(&self.collection_url()).await
    }

    async fn get(&self, id: i64) -> Result<Option<CityRecord>, SourceError> {
        let response = http_client()
            .get(self.item_url(id))
            .send()
            .await
            .map_err(SourceError::Request)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response)?;
        let bytes = response.bytes().await.map_err(SourceError::Request)?;
        let city = serde_json::from_slice(&bytes).map_err(SourceError::Decode)?;
        Ok(Some(city))
    }

    async fn create(&self, city: NewCity) -> Result<CityRecord, SourceError> {
        let response = http_client()
            .post(self.collection_url())
            .json(&city)
            .send()
            .await
            .map_err(SourceError::Request)?;
        let response = check_status(response)?;
        let bytes = response.bytes().await.map_err(SourceError::Request)?;
        serde_json::from_slice(&bytes).map_err(SourceError::Decode)
    }

    async fn delete(&self, id: i64) -> Result<(), SourceError> {
        // Response body is ignored; only the status matters
        let response = http_client()
            .delete(self.item_url(id))
            .send()
            .await
            .map_err(SourceError::Request)?;
        check_status(response)?;
        Ok(())
    }

    fn writable(&self) -> bool {
        true
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SourceError::Status(status))
    }
}

async fn fetch_json<T: serde::de::DeserializeOwned>(url: &str) -> Result<T, SourceError> {
    let response = http_client()
        .get(url)
        .send()
        .await
        .map_err(SourceError::Request)?;
    let response = check_status(response)?;
    let bytes = response.bytes().await.map_err(SourceError::Request)?;
    serde_json::from_slice(&bytes).map_err(SourceError::Decode)
}

fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new)
}
