/* src/provider.rs */

use async_trait::async_trait;
use serde::Deserialize;
use tracing::trace;
use ureq::Agent;

use crate::error::{GeoError, Result};
use crate::location::Location;

/// Base URL of the public ip-api.com service.
pub const DEFAULT_SERVICE_URL: &str = "http://ip-api.com";

/// Something that can turn an IP address into a location.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// Look up the location of `ip`.
    async fn lookup(&self, ip: &str) -> Result<Location>;

    /// Provider name, used in logs.
    fn name(&self) -> &'static str;
}

/// Body returned by `GET /json/<ip>`.
///
/// A failed lookup only carries `status`, `message` and `query`, so
/// everything else is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpLookupResponse {
    #[serde(default)]
    pub status: String,
    pub message: Option<String>,
    pub query: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub region_name: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timezone: Option<String>,
    pub isp: Option<String>,
    pub org: Option<String>,
    #[serde(rename = "as")]
    pub autonomous_system: Option<String>,
}

impl IpLookupResponse {
    /// Parse a raw response body.
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| GeoError::InvalidResponse(e.to_string()))
    }

    /// Convert into a [`Location`], failing unless `status` is `success`.
    pub fn into_location(self) -> Result<Location> {
        if self.status != "success" {
            return Err(GeoError::Status {
                status: self.status,
                message: self.message,
            });
        }

        let latitude = self.lat.ok_or(GeoError::MissingField("lat"))?;
        let longitude = self.lon.ok_or(GeoError::MissingField("lon"))?;

        Ok(Location {
            latitude,
            longitude,
            city: self.city.unwrap_or_default(),
        })
    }
}

/// Lookup backed by the ip-api.com JSON endpoint.
///
/// The HTTP call is blocking, so it runs on tokio's blocking pool.
#[derive(Clone)]
pub struct IpApiProvider {
    base_url: String,
    agent: Agent,
}

impl std::fmt::Debug for IpApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpApiProvider")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Default for IpApiProvider {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_URL)
    }
}

impl IpApiProvider {
    /// Create a provider talking to `base_url` (scheme and host, no path).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            agent: Agent::new_with_defaults(),
        }
    }

    /// Full lookup URL for `ip`.
    pub fn lookup_url(&self, ip: &str) -> String {
        format!("{}/json/{}", self.base_url.trim_end_matches('/'), ip)
    }

    fn fetch_sync(agent: &Agent, url: &str) -> Result<IpLookupResponse> {
        let mut response = agent
            .get(url)
            .call()
            .map_err(|e| GeoError::Network(e.to_string()))?;

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| GeoError::Network(e.to_string()))?;

        IpLookupResponse::from_json(&body)
    }
}

#[async_trait]
impl GeoLookup for IpApiProvider {
    async fn lookup(&self, ip: &str) -> Result<Location> {
        let url = self.lookup_url(ip);
        let agent = self.agent.clone();
        trace!(%url, "Fetching IP location");

        let response = tokio::task::spawn_blocking(move || Self::fetch_sync(&agent, &url))
            .await
            .map_err(|e| GeoError::Task(e.to_string()))??;

        response.into_location()
    }

    fn name(&self) -> &'static str {
        "ip-api"
    }
}
