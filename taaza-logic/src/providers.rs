use serde::{Deserialize, Serialize};

use crate::{location::Coordinate, prelude::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, specta::Type)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// The OS permission surface for location access
pub trait PermissionProvider: Send + Sync {
    /// Current OS-reported status, must not prompt the user
    fn status(&self) -> impl Future<Output = PermissionStatus> + Send;
    /// Ask the OS to prompt for permission, resolves once the user decides.
    /// Implementations should return the existing status when it is already
    /// settled instead of prompting again.
    fn request(&self) -> impl Future<Output = PermissionStatus> + Send;
}

/// Why a sensor read failed, translated to [crate::LocationError] at the
/// manager boundary
#[derive(Debug, Clone)]
pub enum SensorFailure {
    /// The device cannot produce a coordinate (sensor off, airplane mode)
    Unavailable,
    Failed(String),
}

/// The device location sensor
pub trait LocationSensor: Send + Sync {
    fn current_coordinate(&self)
    -> impl Future<Output = Result<Coordinate, SensorFailure>> + Send;
}

/// Raw result of a reverse geocode. All fields are optional, missing ones
/// are placeholder-filled by [crate::ResolvedLocation::from_geocode].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeocodedAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub subregion: Option<String>,
}

/// Converts a coordinate into a structured, human-readable address
pub trait ReverseGeocoder: Send + Sync {
    fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> impl Future<Output = Result<GeocodedAddress>> + Send;
}
