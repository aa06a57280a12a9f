use log::warn;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    address::SavedAddress, errors::LocationError, location::ResolvedLocation,
    prelude::Result, state::LocationState,
};

/// Durable key-value storage owned exclusively by the location manager.
/// No other component writes to these keys.
pub trait LocationStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: String) -> Result<()>;
    fn remove_many(&self, keys: &[&str]) -> Result<()>;
}

pub const KEY_CURRENT_LOCATION: &str = "location.current";
pub const KEY_SAVED_ADDRESSES: &str = "location.saved-addresses";
pub const KEY_SERVICE_AVAILABLE: &str = "location.service-available";
pub const KEY_PERMISSION_GRANTED: &str = "location.permission-granted";

/// Bumped when a stored record's shape changes. Records with another version
/// are discarded on load rather than migrated, version 1 is the only version.
const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoredLocation {
    schema_version: u32,
    location: ResolvedLocation,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredAddressBook {
    schema_version: u32,
    addresses: Vec<SavedAddress>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredFlag {
    schema_version: u32,
    value: bool,
}

/// Read and decode one key, treating every failure mode (store error, bad
/// JSON, unknown schema version) as an absent value.
fn read_record<T: DeserializeOwned>(store: &impl LocationStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(why) => {
            warn!("Failed to read {key} from the store: {why:?}");
            return None;
        }
    };

    let value: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(why) => {
            warn!("Discarding stored {key}, not valid JSON: {why}");
            return None;
        }
    };

    match value.get("schema_version").and_then(Value::as_u64) {
        Some(version) if version == u64::from(SCHEMA_VERSION) => {}
        other => {
            warn!("Discarding stored {key}, unsupported schema version {other:?}");
            return None;
        }
    }

    match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(why) => {
            warn!("Discarding stored {key}, wrong shape: {why}");
            None
        }
    }
}

fn write_record<T: Serialize>(
    store: &impl LocationStore,
    key: &str,
    record: &T,
) -> Result<(), LocationError> {
    let raw = serde_json::to_string(record)
        .map_err(|why| LocationError::Store(why.to_string()))?;
    store
        .set(key, raw)
        .map_err(|why| LocationError::Store(why.to_string()))
}

/// Rebuild the in-memory mirror from the store. Never fails: anything
/// unreadable starts from its default.
pub(crate) fn load_state(store: &impl LocationStore) -> LocationState {
    LocationState {
        current_location: read_record::<StoredLocation>(store, KEY_CURRENT_LOCATION)
            .map(|record| record.location),
        saved_addresses: read_record::<StoredAddressBook>(store, KEY_SAVED_ADDRESSES)
            .map(|record| record.addresses)
            .unwrap_or_default(),
        permission_granted: read_record::<StoredFlag>(store, KEY_PERMISSION_GRANTED)
            .is_some_and(|record| record.value),
        service_available: read_record::<StoredFlag>(store, KEY_SERVICE_AVAILABLE)
            .is_some_and(|record| record.value),
    }
}

/// Write the entire state back. All four keys are updated together so a
/// reload never observes a location without its derived flags.
pub(crate) fn persist_state(
    store: &impl LocationStore,
    state: &LocationState,
) -> Result<(), LocationError> {
    match &state.current_location {
        Some(location) => write_record(
            store,
            KEY_CURRENT_LOCATION,
            &StoredLocation {
                schema_version: SCHEMA_VERSION,
                location: location.clone(),
            },
        )?,
        None => store
            .remove_many(&[KEY_CURRENT_LOCATION])
            .map_err(|why| LocationError::Store(why.to_string()))?,
    }

    write_record(
        store,
        KEY_SAVED_ADDRESSES,
        &StoredAddressBook {
            schema_version: SCHEMA_VERSION,
            addresses: state.saved_addresses.clone(),
        },
    )?;
    write_record(
        store,
        KEY_SERVICE_AVAILABLE,
        &StoredFlag {
            schema_version: SCHEMA_VERSION,
            value: state.service_available,
        },
    )?;
    write_record(
        store,
        KEY_PERMISSION_GRANTED,
        &StoredFlag {
            schema_version: SCHEMA_VERSION,
            value: state.permission_granted,
        },
    )
}
