//! Geolocation collaborator
//!
//! Resolves a source IP to location metadata via an external service. The
//! lookup must never fail the surrounding operation: timeouts and malformed
//! responses degrade to Unknown fields.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoLocation {
    pub country: String,
    pub city: String,
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub isp: String,
    pub ip: String,
}

impl GeoLocation {
    /// Degraded location when the resolver is unreachable or the response is
    /// unusable.
    pub fn unknown(ip: &str) -> Self {
        Self {
            country: "Unknown".to_string(),
            city: "Unknown".to_string(),
            region: "Unknown".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            timezone: "Unknown".to_string(),
            isp: "Unknown".to_string(),
            ip: ip.to_string(),
        }
    }

    /// "City, Country" display form used in login responses and audit entries.
    pub fn display(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }
}

#[async_trait]
pub trait GeoResolver: Send + Sync {
    /// Resolve an IP. Infallible by contract; implementations degrade to
    /// [`GeoLocation::unknown`] instead of erroring.
    async fn resolve(&self, ip: &str) -> GeoLocation;
}

/// ip-api.com response shape (fields=status,country,...)
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default, rename = "regionName")]
    region_name: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    isp: Option<String>,
    #[serde(default)]
    query: Option<String>,
}

/// HTTP resolver against ip-api.com (or a compatible endpoint).
#[derive(Debug, Clone)]
pub struct HttpGeoResolver {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGeoResolver {
    pub fn new(config: &EngineConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.geo_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: config.geo_endpoint.clone(),
        }
    }

    async fn lookup(&self, ip: &str) -> Result<IpApiResponse, reqwest::Error> {
        let url = format!(
            "{}/{}?fields=status,country,countryCode,region,regionName,city,zip,lat,lon,timezone,isp,org,as,query",
            self.endpoint, ip
        );
        self.client.get(url).send().await?.json().await
    }
}

#[async_trait]
impl GeoResolver for HttpGeoResolver {
    async fn resolve(&self, ip: &str) -> GeoLocation {
        match self.lookup(ip).await {
            Ok(body) if body.status == "success" => GeoLocation {
                country: body.country.unwrap_or_else(|| "Unknown".to_string()),
                city: body.city.unwrap_or_else(|| "Unknown".to_string()),
                region: body.region_name.unwrap_or_else(|| "Unknown".to_string()),
                latitude: body.lat.unwrap_or(0.0),
                longitude: body.lon.unwrap_or(0.0),
                timezone: body.timezone.unwrap_or_else(|| "Unknown".to_string()),
                isp: body.isp.unwrap_or_else(|| "Unknown".to_string()),
                ip: body.query.unwrap_or_else(|| ip.to_string()),
            },
            Ok(_) => {
                tracing::warn!(ip, "geolocation lookup returned non-success status");
                GeoLocation::unknown(ip)
            }
            Err(err) => {
                tracing::warn!(ip, error = %err, "geolocation lookup failed, degrading");
                GeoLocation::unknown(ip)
            }
        }
    }
}

/// Fixed-answer resolver for offline deployments and tests.
#[derive(Debug, Clone)]
pub struct StaticGeoResolver {
    pub country: String,
    pub city: String,
}

impl StaticGeoResolver {
    pub fn new(country: &str, city: &str) -> Self {
        Self { country: country.to_string(), city: city.to_string() }
    }
}

#[async_trait]
impl GeoResolver for StaticGeoResolver {
    async fn resolve(&self, ip: &str) -> GeoLocation {
        GeoLocation {
            country: self.country.clone(),
            city: self.city.clone(),
            region: "Unknown".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            timezone: "Unknown".to_string(),
            isp: "Unknown".to_string(),
            ip: ip.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_location_keeps_the_ip() {
        let loc = GeoLocation::unknown("203.0.113.7");
        assert_eq!(loc.ip, "203.0.113.7");
        assert_eq!(loc.country, "Unknown");
        assert_eq!(loc.display(), "Unknown, Unknown");
    }

    #[tokio::test]
    async fn unreachable_endpoint_degrades_to_unknown() {
        let config = EngineConfig {
            geo_endpoint: "http://127.0.0.1:1/json".to_string(),
            geo_timeout_secs: 1,
            ..EngineConfig::default()
        };
        let resolver = HttpGeoResolver::new(&config);
        let loc = resolver.resolve("203.0.113.7").await;
        assert_eq!(loc.country, "Unknown");
        assert_eq!(loc.ip, "203.0.113.7");
    }
}
