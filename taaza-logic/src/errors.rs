use thiserror::Error;

/// Failures surfaced by the location manager. Every provider failure is
/// translated into one of these before it crosses the subsystem boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The user or OS refused location access, recoverable by re-requesting
    #[error("location permission was denied")]
    PermissionDenied,
    /// The device cannot produce a coordinate right now
    #[error("device location is unavailable")]
    Unavailable,
    /// The sensor or geocoder exceeded its time bound
    #[error("timed out waiting for the device or geocoder")]
    Timeout,
    /// Reverse geocoding errored, the current location is left untouched
    #[error("reverse geocoding failed")]
    GeocodeFailed,
    /// Malformed caller input, not retryable without fixing the input
    #[error("invalid address: {0}")]
    Validation(String),
    /// The durable store rejected a read or write
    #[error("persistent store failure: {0}")]
    Store(String),
}
