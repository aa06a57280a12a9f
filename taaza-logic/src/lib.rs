mod address;
mod errors;
mod location;
mod manager;
mod notify;
mod providers;
mod serviceability;
mod state;
mod store;
#[cfg(test)]
mod tests;

pub use address::{AddressKind, SavedAddress};
pub use errors::LocationError;
pub use location::{
    Coordinate, LocationSource, ResolvedLocation, UNKNOWN_AREA, UNKNOWN_CITY, UNKNOWN_POSTAL_CODE,
    UtcDT, postal_code_is_valid,
};
pub use manager::{AcquisitionTimeouts, LocationManager};
pub use notify::{ListenerHub, UpdateSender};
pub use providers::{
    GeocodedAddress, LocationSensor, PermissionProvider, PermissionStatus, ReverseGeocoder,
    SensorFailure,
};
pub use serviceability::{
    ComingSoonArea, EARTH_RADIUS_KM, ServiceArea, ServiceRegistry, distance_km,
};
pub use state::LocationUiState;
pub use store::{
    KEY_CURRENT_LOCATION, KEY_PERMISSION_GRANTED, KEY_SAVED_ADDRESSES, KEY_SERVICE_AVAILABLE,
    LocationStore,
};

pub mod prelude {
    use anyhow::Error as AnyhowError;
    use std::result::Result as StdResult;
    pub type Result<T = (), E = AnyhowError> = StdResult<T, E>;
    pub use anyhow::Context;
}
