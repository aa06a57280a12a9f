use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::providers::GeocodedAddress;

/// Convenience alias for UTC DT
pub type UtcDT = DateTime<Utc>;

/// Placeholder used when the geocoder does not report a city
pub const UNKNOWN_CITY: &str = "Unknown City";
/// Placeholder used when the geocoder does not report an area or region
pub const UNKNOWN_AREA: &str = "Unknown Area";
/// Placeholder postal code, deliberately fails the 6-digit format so it is
/// never used for postal-based serviceability
pub const UNKNOWN_POSTAL_CODE: &str = "000000";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, specta::Type)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether this is a real point on the globe. NaN, infinite, and
    /// out-of-range values are all rejected.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Whether a postal code can back a postal-based serviceability check:
/// exactly 6 ASCII digits, first digit non-zero.
pub fn postal_code_is_valid(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == 6 && bytes[0] != b'0' && bytes.iter().all(u8::is_ascii_digit)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, specta::Type)]
pub enum LocationSource {
    /// Read from the device sensor, only trusted while permission is granted
    Device,
    /// Entered or selected by the user, survives permission changes
    Manual,
}

/// A coordinate resolved to a structured address, either by the reverse
/// geocoder or by explicit user entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, specta::Type)]
pub struct ResolvedLocation {
    pub coordinate: Coordinate,
    pub formatted_address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub area_label: String,
    pub source: LocationSource,
    pub resolved_at: UtcDT,
}

impl ResolvedLocation {
    /// Build a location from a sensor coordinate and a (possibly partial)
    /// geocoder result. Missing fields fall back to the placeholder constants
    /// instead of failing the acquisition.
    pub fn from_geocode(coordinate: Coordinate, geocoded: GeocodedAddress) -> Self {
        let area_label = geocoded
            .subregion
            .or(geocoded.street)
            .unwrap_or_else(|| UNKNOWN_AREA.to_string());
        let city = geocoded.city.unwrap_or_else(|| UNKNOWN_CITY.to_string());
        let state = geocoded.region.unwrap_or_else(|| UNKNOWN_AREA.to_string());
        let postal_code = geocoded
            .postal_code
            .unwrap_or_else(|| UNKNOWN_POSTAL_CODE.to_string());
        let formatted_address = format!("{area_label}, {city}, {state} {postal_code}");

        Self {
            coordinate,
            formatted_address,
            city,
            state,
            postal_code,
            area_label,
            source: LocationSource::Device,
            resolved_at: Utc::now(),
        }
    }

    /// Build a user-entered location, e.g. from the manual postal code flow.
    pub fn manual(
        coordinate: Coordinate,
        area_label: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        let area_label = area_label.into();
        let city = city.into();
        let state = state.into();
        let postal_code = postal_code.into();
        let formatted_address = format!("{area_label}, {city}, {state} {postal_code}");

        Self {
            coordinate,
            formatted_address,
            city,
            state,
            postal_code,
            area_label,
            source: LocationSource::Manual,
            resolved_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(19.0760, 72.8777).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(90.1, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_postal_code_format() {
        assert!(postal_code_is_valid("400001"));
        assert!(postal_code_is_valid("999999"));
        assert!(!postal_code_is_valid("12345"), "5 digits rejected");
        assert!(!postal_code_is_valid("012345"), "leading zero rejected");
        assert!(!postal_code_is_valid("4000011"), "7 digits rejected");
        assert!(!postal_code_is_valid("40000a"), "letters rejected");
        assert!(!postal_code_is_valid(""), "empty rejected");
        assert!(!postal_code_is_valid(UNKNOWN_POSTAL_CODE), "placeholder rejected");
    }

    #[test]
    fn test_placeholder_fill_is_best_effort() {
        // Partial geocode data is deliberately accepted, only the missing
        // fields are placeholder-filled.
        let geocoded = GeocodedAddress {
            city: Some("Mumbai".to_string()),
            ..Default::default()
        };
        let loc = ResolvedLocation::from_geocode(Coordinate::new(19.0760, 72.8777), geocoded);

        assert_eq!(loc.city, "Mumbai");
        assert_eq!(loc.area_label, UNKNOWN_AREA);
        assert_eq!(loc.state, UNKNOWN_AREA);
        assert_eq!(loc.postal_code, UNKNOWN_POSTAL_CODE);
        assert_eq!(loc.source, LocationSource::Device);
        assert!(!postal_code_is_valid(&loc.postal_code));
    }

    #[test]
    fn test_full_geocode_keeps_fields() {
        let geocoded = GeocodedAddress {
            street: Some("Marine Drive".to_string()),
            city: Some("Mumbai".to_string()),
            region: Some("Maharashtra".to_string()),
            postal_code: Some("400001".to_string()),
            subregion: Some("Fort".to_string()),
        };
        let loc = ResolvedLocation::from_geocode(Coordinate::new(18.9398, 72.8354), geocoded);

        assert_eq!(loc.area_label, "Fort");
        assert_eq!(loc.formatted_address, "Fort, Mumbai, Maharashtra 400001");
    }
}
