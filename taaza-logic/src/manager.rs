use std::{sync::Arc, time::Duration};

use log::{debug, warn};
use tokio::{
    sync::{Mutex, RwLock},
    time::timeout,
};
use uuid::Uuid;

use crate::{
    address::SavedAddress,
    errors::LocationError,
    location::{LocationSource, ResolvedLocation},
    notify::UpdateSender,
    providers::{LocationSensor, PermissionProvider, ReverseGeocoder, SensorFailure},
    serviceability::ServiceRegistry,
    state::{LocationState, LocationUiState},
    store::{self, LocationStore},
};

/// Bounds on the two provider crossings that can hang. On expiry the
/// acquisition fails with [LocationError::Timeout] instead of blocking the
/// caller indefinitely.
#[derive(Debug, Clone, Copy)]
pub struct AcquisitionTimeouts {
    pub sensor: Duration,
    pub geocoder: Duration,
}

impl Default for AcquisitionTimeouts {
    fn default() -> Self {
        Self {
            sensor: Duration::from_secs(10),
            geocoder: Duration::from_secs(10),
        }
    }
}

/// Owns all mutable location state: the resolved current location, the
/// permission flag, the saved address book, and the derived serviceability
/// flag. Orchestrates the permission → sense → geocode → persist pipeline
/// against the injected providers and notifies [UpdateSender] after every
/// committed mutation.
///
/// Reads are synchronous against the in-memory mirror; every mutation
/// persists the full state through [LocationStore] before it becomes
/// visible, so a restart never observes a torn state.
pub struct LocationManager<P, S, G, K, U>
where
    P: PermissionProvider,
    S: LocationSensor,
    G: ReverseGeocoder,
    K: LocationStore,
    U: UpdateSender,
{
    permissions: P,
    sensor: S,
    geocoder: G,
    store: K,
    updates: U,
    registry: ServiceRegistry,
    timeouts: AcquisitionTimeouts,
    state: RwLock<LocationState>,
    // Serializes acquisitions, a second caller queues behind the in-flight
    // one instead of interleaving with it
    acquire_gate: Mutex<()>,
}

impl<P, S, G, K, U> LocationManager<P, S, G, K, U>
where
    P: PermissionProvider,
    S: LocationSensor,
    G: ReverseGeocoder,
    K: LocationStore,
    U: UpdateSender,
{
    /// Load persisted state, reconcile it with the OS-reported permission,
    /// and return the manager. A cached device-derived location is only
    /// trusted while the OS still reports permission as granted; on a
    /// mismatch it is discarded (user-chosen locations survive) and the
    /// purge is persisted before the manager is handed out.
    pub async fn initialize(
        timeouts: AcquisitionTimeouts,
        registry: ServiceRegistry,
        permissions: P,
        sensor: S,
        geocoder: G,
        store: K,
        updates: U,
    ) -> Result<Arc<Self>, LocationError> {
        let mut state = store::load_state(&store);
        let os_granted = permissions.status().await.is_granted();

        if state.permission_granted != os_granted {
            if state.purge_device_location() {
                warn!("Discarding cached location, permission changed since last run");
            }
            state.permission_granted = os_granted;
            store::persist_state(&store, &state)?;
        }

        Ok(Arc::new(Self {
            permissions,
            sensor,
            geocoder,
            store,
            updates,
            registry,
            timeouts,
            state: RwLock::new(state),
            acquire_gate: Mutex::new(()),
        }))
    }

    // == Queries ==

    pub async fn current_location(&self) -> Option<ResolvedLocation> {
        self.state.read().await.current_location.clone()
    }

    pub async fn permission_granted(&self) -> bool {
        self.state.read().await.permission_granted
    }

    /// Pure read of the derived flag, `false` while no location is resolved
    pub async fn check_service_availability(&self) -> bool {
        self.state.read().await.service_available
    }

    pub async fn saved_addresses(&self) -> Vec<SavedAddress> {
        self.state.read().await.saved_addresses.clone()
    }

    /// Snapshot for the consuming shell, call after receiving an update
    pub async fn ui_state(&self) -> LocationUiState {
        self.state.read().await.as_ui_state(&self.registry)
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    // == Commands ==

    /// Prompt the user for location permission outside of an acquisition.
    /// Returns whether permission is now granted.
    pub async fn request_permission(&self) -> Result<bool, LocationError> {
        let granted = self.permissions.request().await.is_granted();

        let mut state = self.state.write().await;
        if state.permission_granted != granted {
            let mut next = state.clone();
            if !granted && next.purge_device_location() {
                warn!("Dropping cached device location after permission denial");
            }
            next.permission_granted = granted;
            store::persist_state(&self.store, &next)?;
            *state = next;
            drop(state);
            self.updates.send_update();
        }

        Ok(granted)
    }

    /// Run the full acquisition pipeline: request permission, read the
    /// device coordinate, reverse-geocode it, then commit location and
    /// derived serviceability together. Failures leave the committed state
    /// untouched except for permission denial, which also drops any cached
    /// device-derived location.
    pub async fn acquire_current_location(&self) -> Result<ResolvedLocation, LocationError> {
        let _in_flight = self.acquire_gate.lock().await;

        debug!("Starting location acquisition");
        if !self.permissions.request().await.is_granted() {
            self.commit_permission_denied().await?;
            return Err(LocationError::PermissionDenied);
        }

        let coordinate = match timeout(self.timeouts.sensor, self.sensor.current_coordinate())
            .await
        {
            Err(_) => {
                warn!("Sensor timed out after {:?}", self.timeouts.sensor);
                return Err(LocationError::Timeout);
            }
            Ok(Err(SensorFailure::Unavailable)) => return Err(LocationError::Unavailable),
            Ok(Err(SensorFailure::Failed(why))) => {
                warn!("Sensor failed: {why}");
                return Err(LocationError::Unavailable);
            }
            Ok(Ok(coordinate)) => coordinate,
        };
        debug!("Sensor reported ({}, {})", coordinate.latitude, coordinate.longitude);

        let geocoded =
            match timeout(self.timeouts.geocoder, self.geocoder.reverse_geocode(coordinate)).await
            {
                Err(_) => {
                    warn!("Geocoder timed out after {:?}", self.timeouts.geocoder);
                    return Err(LocationError::Timeout);
                }
                Ok(Err(why)) => {
                    warn!("Reverse geocode failed: {why:?}");
                    return Err(LocationError::GeocodeFailed);
                }
                Ok(Ok(geocoded)) => geocoded,
            };

        let resolved = ResolvedLocation::from_geocode(coordinate, geocoded);
        debug!("Resolved to {}", resolved.formatted_address);

        let mut state = self.state.write().await;
        let mut next = state.clone();
        next.permission_granted = true;
        next.apply_device_location(resolved.clone(), &self.registry);
        store::persist_state(&self.store, &next)?;
        *state = next;
        drop(state);
        self.updates.send_update();

        Ok(resolved)
    }

    async fn commit_permission_denied(&self) -> Result<(), LocationError> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        next.permission_granted = false;
        if next.purge_device_location() {
            warn!("Dropping cached device location after permission denial");
        }
        store::persist_state(&self.store, &next)?;
        *state = next;
        // No update notification, failed acquisitions only surface through
        // the returned error
        Ok(())
    }

    /// Set a location chosen by the user, bypassing the sensor pipeline
    /// entirely. Serviceability is re-derived from the postal allow-list
    /// when the code is usable, from the coordinate otherwise. The stored
    /// location is marked [LocationSource::Manual], exempting it from
    /// permission purges.
    pub async fn set_manual_location(
        &self,
        mut location: ResolvedLocation,
    ) -> Result<(), LocationError> {
        location.source = LocationSource::Manual;

        let mut state = self.state.write().await;
        let mut next = state.clone();
        next.apply_chosen_location(location, &self.registry);
        store::persist_state(&self.store, &next)?;
        *state = next;
        drop(state);
        self.updates.send_update();

        Ok(())
    }

    /// Re-point the current location at an already-known one, e.g. a saved
    /// address. Same derivation and persistence as [Self::set_manual_location].
    pub async fn select_location(&self, location: ResolvedLocation) -> Result<(), LocationError> {
        self.set_manual_location(location).await
    }

    /// Upsert into the saved address book: appends when the id is new,
    /// replaces in place when it already exists. Returns the stored value.
    pub async fn save_address(
        &self,
        address: SavedAddress,
    ) -> Result<SavedAddress, LocationError> {
        address.validate()?;

        let mut state = self.state.write().await;
        let mut next = state.clone();
        next.upsert_address(address.clone());
        store::persist_state(&self.store, &next)?;
        *state = next;
        drop(state);
        self.updates.send_update();

        Ok(address)
    }

    /// Remove by id. Removing an id that is not present is a no-op, not an
    /// error.
    pub async fn remove_address(&self, id: Uuid) -> Result<(), LocationError> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        if !next.remove_address(id) {
            return Ok(());
        }
        store::persist_state(&self.store, &next)?;
        *state = next;
        drop(state);
        self.updates.send_update();

        Ok(())
    }
}
