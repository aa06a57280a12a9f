use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use serde::{Deserialize, Serialize};

use taaza_logic::{
    AddressKind, Coordinate, GeocodedAddress, LocationSensor, LocationStore, LocationUiState,
    PermissionProvider, PermissionStatus, ReverseGeocoder, SensorFailure, UpdateSender,
};

pub mod prelude {
    pub use anyhow::{Context, anyhow, bail};
    pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;
}

pub use prelude::*;

// == Scenario format ==

/// Everything a headless run needs: how each provider behaves, then the
/// steps to drive through the manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub permission: PermissionScript,
    pub sensor: SensorScript,
    pub geocoder: GeocoderScript,
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum PermissionScript {
    Granted,
    Denied,
    Undetermined,
    /// Undetermined until prompted, then granted
    GrantedOnPrompt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SensorScript {
    Report { latitude: f64, longitude: f64 },
    Unavailable,
    Fail { message: String },
    /// Never resolves, drive with paused time to hit the timeout instantly
    Hang,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GeocoderScript {
    Resolve(GeocodedAddress),
    Fail { message: String },
    Hang,
}

/// A manual-entry location as it appears in scenario files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedPlace {
    pub latitude: f64,
    pub longitude: f64,
    pub area: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScenarioStep {
    Acquire,
    RequestPermission,
    SetManualLocation(ScriptedPlace),
    SaveAddress {
        kind: AddressKind,
        label: String,
        place: ScriptedPlace,
    },
    /// Removes the first saved address with this label
    RemoveAddress { label: String },
}

/// Emitted as one JSON line per executed step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: usize,
    pub error: Option<String>,
    pub updates_sent: usize,
    pub state: LocationUiState,
}

// == Scripted providers ==

pub struct ScriptedPermission(pub PermissionScript);

impl PermissionProvider for ScriptedPermission {
    async fn status(&self) -> PermissionStatus {
        match self.0 {
            PermissionScript::Granted => PermissionStatus::Granted,
            PermissionScript::Denied => PermissionStatus::Denied,
            PermissionScript::Undetermined | PermissionScript::GrantedOnPrompt => {
                PermissionStatus::Undetermined
            }
        }
    }

    async fn request(&self) -> PermissionStatus {
        match self.0 {
            PermissionScript::Granted | PermissionScript::GrantedOnPrompt => {
                PermissionStatus::Granted
            }
            PermissionScript::Denied => PermissionStatus::Denied,
            PermissionScript::Undetermined => PermissionStatus::Undetermined,
        }
    }
}

pub struct ScriptedSensor(pub SensorScript);

impl LocationSensor for ScriptedSensor {
    async fn current_coordinate(&self) -> Result<Coordinate, SensorFailure> {
        match &self.0 {
            SensorScript::Report {
                latitude,
                longitude,
            } => Ok(Coordinate::new(*latitude, *longitude)),
            SensorScript::Unavailable => Err(SensorFailure::Unavailable),
            SensorScript::Fail { message } => Err(SensorFailure::Failed(message.clone())),
            SensorScript::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

pub struct ScriptedGeocoder(pub GeocoderScript);

impl ReverseGeocoder for ScriptedGeocoder {
    async fn reverse_geocode(&self, _coordinate: Coordinate) -> Result<GeocodedAddress> {
        match &self.0 {
            GeocoderScript::Resolve(geocoded) => Ok(geocoded.clone()),
            GeocoderScript::Fail { message } => Err(anyhow!("{message}")),
            GeocoderScript::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// In-memory store, cloneable so the driver can inspect it after handing it
/// to the manager
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pre-seed a key, used to script "previous session" state
    pub fn seed(&self, key: &str, value: impl Into<String>) {
        self.lock().insert(key.to_string(), value.into());
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
pub struct RecordingSender(Arc<AtomicUsize>);

impl RecordingSender {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl UpdateSender for RecordingSender {
    fn send_update(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}
