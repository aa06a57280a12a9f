use log::debug;
use serde::Deserialize;

use taaza_logic::{Coordinate, GeocodedAddress, ReverseGeocoder, prelude::*};

const fn geocoder_host() -> &'static str {
    if let Some(host) = option_env!("TAAZA_GEOCODER_HOST") {
        host
    } else {
        "nominatim.openstreetmap.org"
    }
}

const fn geocoder_secure() -> bool {
    if let Some(secure) = option_env!("TAAZA_GEOCODER_SECURE") {
        const_str::eq_ignore_ascii_case!(secure, "true") || const_str::equal!(secure, "1")
    } else {
        true
    }
}

const fn geocoder_http_proto() -> &'static str {
    if geocoder_secure() { "https" } else { "http" }
}

const GEOCODER_HOST: &str = geocoder_host();
const GEOCODER_HTTP_PROTO: &str = geocoder_http_proto();

const GEOCODER_HTTP_URL: &str = const_str::concat!(GEOCODER_HTTP_PROTO, "://", GEOCODER_HOST);

const USER_AGENT: &str = const_str::concat!("taaza-app/", env!("CARGO_PKG_VERSION"));

/// Reverse geocoder backed by a Nominatim-style `/reverse` endpoint.
/// Errors (transport, non-2xx, bad JSON) bubble to the location manager,
/// which translates them at its boundary; missing address fields are simply
/// `None` and get placeholder-filled downstream.
pub struct HttpGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGeocoder {
    pub fn new() -> Result<Self> {
        Self::with_base_url(GEOCODER_HTTP_URL)
    }

    /// Point at a different endpoint, e.g. a self-hosted Nominatim or a
    /// stub server in tests
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

/// Response shape of the `/reverse` endpoint, only the address block is read
#[derive(Debug, Default, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: ReverseAddress,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseAddress {
    road: Option<String>,
    suburb: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
}

impl From<ReverseAddress> for GeocodedAddress {
    fn from(address: ReverseAddress) -> Self {
        GeocodedAddress {
            street: address.road,
            // Nominatim reports exactly one of these depending on place size
            city: address.city.or(address.town).or(address.village),
            region: address.state,
            postal_code: address.postcode,
            subregion: address.suburb,
        }
    }
}

impl ReverseGeocoder for HttpGeocoder {
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<GeocodedAddress> {
        debug!(
            "Reverse geocoding ({}, {})",
            coordinate.latitude, coordinate.longitude
        );
        let url = format!(
            "{}/reverse?format=jsonv2&lat={}&lon={}",
            self.base_url, coordinate.latitude, coordinate.longitude
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to make request")?
            .error_for_status()
            .context("Geocoder returned error")?
            .json::<ReverseResponse>()
            .await
            .context("Failed to decode geocoder response")?;

        Ok(response.address.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_block_mapping() {
        let raw = r#"{
            "place_id": 128741,
            "display_name": "Fort, Mumbai, Maharashtra, 400001, India",
            "address": {
                "road": "Marine Drive",
                "suburb": "Fort",
                "city": "Mumbai",
                "state": "Maharashtra",
                "postcode": "400001",
                "country": "India"
            }
        }"#;

        let decoded: ReverseResponse = serde_json::from_str(raw).expect("Failed to decode");
        let geocoded: GeocodedAddress = decoded.address.into();

        assert_eq!(geocoded.city.as_deref(), Some("Mumbai"));
        assert_eq!(geocoded.subregion.as_deref(), Some("Fort"));
        assert_eq!(geocoded.region.as_deref(), Some("Maharashtra"));
        assert_eq!(geocoded.postal_code.as_deref(), Some("400001"));
        assert_eq!(geocoded.street.as_deref(), Some("Marine Drive"));
    }

    #[test]
    fn test_town_and_village_fallbacks() {
        let town: ReverseResponse =
            serde_json::from_str(r#"{"address": {"town": "Khopoli"}}"#).expect("Failed to decode");
        assert_eq!(
            GeocodedAddress::from(town.address).city.as_deref(),
            Some("Khopoli")
        );

        let village: ReverseResponse =
            serde_json::from_str(r#"{"address": {"village": "Kelve"}}"#).expect("Failed to decode");
        assert_eq!(
            GeocodedAddress::from(village.address).city.as_deref(),
            Some("Kelve")
        );
    }

    #[test]
    fn test_missing_address_block_decodes_empty() {
        let decoded: ReverseResponse =
            serde_json::from_str(r#"{"place_id": 1}"#).expect("Failed to decode");
        let geocoded: GeocodedAddress = decoded.address.into();

        assert!(geocoded.city.is_none());
        assert!(geocoded.postal_code.is_none());
    }
}
