use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use anyhow::anyhow;

use crate::{
    location::Coordinate,
    notify::UpdateSender,
    prelude::*,
    providers::{
        GeocodedAddress, LocationSensor, PermissionProvider, PermissionStatus, ReverseGeocoder,
        SensorFailure,
    },
    store::LocationStore,
};

pub struct ScriptedPermission {
    status: PermissionStatus,
    on_request: PermissionStatus,
}

impl ScriptedPermission {
    /// Reports the same status whether queried or prompted
    pub fn always(status: PermissionStatus) -> Self {
        Self {
            status,
            on_request: status,
        }
    }

    /// Undetermined until prompted, then resolves to `on_request`
    pub fn undetermined_until_prompt(on_request: PermissionStatus) -> Self {
        Self {
            status: PermissionStatus::Undetermined,
            on_request,
        }
    }

    /// Still granted when queried, but the prompt resolves to denied.
    /// Models the user revoking access from the system prompt mid-session.
    pub fn revoked_on_prompt() -> Self {
        Self {
            status: PermissionStatus::Granted,
            on_request: PermissionStatus::Denied,
        }
    }
}

impl PermissionProvider for ScriptedPermission {
    async fn status(&self) -> PermissionStatus {
        self.status
    }

    async fn request(&self) -> PermissionStatus {
        self.on_request
    }
}

enum SensorScript {
    Report(Coordinate),
    Unavailable,
    Hang,
}

pub struct ScriptedSensor(SensorScript);

impl ScriptedSensor {
    pub fn report(coordinate: Coordinate) -> Self {
        Self(SensorScript::Report(coordinate))
    }

    pub fn unavailable() -> Self {
        Self(SensorScript::Unavailable)
    }

    /// Never resolves, used to exercise the timeout path under paused time
    pub fn hang() -> Self {
        Self(SensorScript::Hang)
    }
}

impl LocationSensor for ScriptedSensor {
    async fn current_coordinate(&self) -> Result<Coordinate, SensorFailure> {
        match &self.0 {
            SensorScript::Report(coordinate) => Ok(*coordinate),
            SensorScript::Unavailable => Err(SensorFailure::Unavailable),
            SensorScript::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

enum GeocoderScript {
    Resolve(GeocodedAddress),
    Fail(String),
    Hang,
}

pub struct ScriptedGeocoder(GeocoderScript);

impl ScriptedGeocoder {
    pub fn resolve(geocoded: GeocodedAddress) -> Self {
        Self(GeocoderScript::Resolve(geocoded))
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self(GeocoderScript::Fail(message.into()))
    }

    pub fn hang() -> Self {
        Self(GeocoderScript::Hang)
    }
}

impl ReverseGeocoder for ScriptedGeocoder {
    async fn reverse_geocode(&self, _coordinate: Coordinate) -> Result<GeocodedAddress> {
        match &self.0 {
            GeocoderScript::Resolve(geocoded) => Ok(geocoded.clone()),
            GeocoderScript::Fail(message) => Err(anyhow!("{message}")),
            GeocoderScript::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// In-memory store, cloneable so tests can inspect it after handing it to a
/// manager or reuse it across "restarts"
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocationStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.lock();
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CountingSender(Arc<AtomicUsize>);

impl CountingSender {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl UpdateSender for CountingSender {
    fn send_update(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}
