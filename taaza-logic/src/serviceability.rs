use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::location::{Coordinate, postal_code_is_valid};

/// Mean Earth radius in kilometers, used for great-circle math
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A city the platform currently operates in. Read-only at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceArea {
    pub name: String,
    pub state: String,
    pub centroid: Coordinate,
    pub radius_km: f64,
    pub postal_codes: HashSet<String>,
}

/// A city the platform is expanding to but does not serve yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, specta::Type)]
pub struct ComingSoonArea {
    pub name: String,
    pub state: String,
    pub expected_launch: Option<String>,
}

/// Great-circle distance between two coordinates using the Haversine formula.
/// Commutative, zero for identical coordinates.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// The serviceable-city configuration. Pure lookups only, no mutable state.
/// None of the queries fail: malformed input yields `false`/`None` since
/// these run on every location change and must not destabilize the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRegistry {
    pub areas: Vec<ServiceArea>,
    pub coming_soon: Vec<ComingSoonArea>,
}

impl ServiceRegistry {
    /// True iff the coordinate falls inside any area's service radius.
    /// Areas are not expected to overlap, any match is sufficient.
    pub fn serviceable_by_coordinate(&self, coordinate: Coordinate) -> bool {
        coordinate.is_valid()
            && self
                .areas
                .iter()
                .any(|area| distance_km(coordinate, area.centroid) <= area.radius_km)
    }

    /// True iff the code passes the 6-digit format check and is on any
    /// area's allow-list. Invalid formats are rejected, never an error.
    pub fn serviceable_by_postal_code(&self, code: &str) -> bool {
        postal_code_is_valid(code)
            && self.areas.iter().any(|area| area.postal_codes.contains(code))
    }

    /// Name of the first serviceable area containing the coordinate
    pub fn city_name_for(&self, coordinate: Coordinate) -> Option<&str> {
        if !coordinate.is_valid() {
            return None;
        }
        self.areas
            .iter()
            .find(|area| distance_km(coordinate, area.centroid) <= area.radius_km)
            .map(|area| area.name.as_str())
    }

    /// Case-insensitive exact match on the coming-soon city name
    pub fn coming_soon_info(&self, city_name: &str) -> Option<&ComingSoonArea> {
        self.coming_soon
            .iter()
            .find(|area| area.name.eq_ignore_ascii_case(city_name))
    }
}

fn area(
    name: &str,
    state: &str,
    centroid: Coordinate,
    radius_km: f64,
    postal_codes: &[&str],
) -> ServiceArea {
    ServiceArea {
        name: name.to_string(),
        state: state.to_string(),
        centroid,
        radius_km,
        postal_codes: postal_codes.iter().map(ToString::to_string).collect(),
    }
}

impl Default for ServiceRegistry {
    /// The city table the app ships with, used until a remote refresh succeeds
    fn default() -> Self {
        Self {
            areas: vec![
                area(
                    "Mumbai",
                    "Maharashtra",
                    Coordinate::new(19.0760, 72.8777),
                    40.0,
                    &["400001", "400002", "400020", "400050", "400070", "400093"],
                ),
                area(
                    "Pune",
                    "Maharashtra",
                    Coordinate::new(18.5204, 73.8567),
                    30.0,
                    &["411001", "411004", "411014", "411038", "411057"],
                ),
                area(
                    "Bengaluru",
                    "Karnataka",
                    Coordinate::new(12.9716, 77.5946),
                    35.0,
                    &["560001", "560008", "560034", "560066", "560103"],
                ),
            ],
            coming_soon: vec![
                ComingSoonArea {
                    name: "Delhi".to_string(),
                    state: "Delhi".to_string(),
                    expected_launch: Some("Early 2026".to_string()),
                },
                ComingSoonArea {
                    name: "Hyderabad".to_string(),
                    state: "Telangana".to_string(),
                    expected_launch: Some("Mid 2026".to_string()),
                },
                ComingSoonArea {
                    name: "Chennai".to_string(),
                    state: "Tamil Nadu".to_string(),
                    expected_launch: None,
                },
            ],
        }
    }
}
