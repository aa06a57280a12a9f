mod config;
mod geocode;
mod store;

pub use config::fetch_service_registry;
pub use geocode::HttpGeocoder;
pub use store::JsonFileStore;
