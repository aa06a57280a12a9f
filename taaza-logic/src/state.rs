use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    address::SavedAddress,
    location::{LocationSource, ResolvedLocation, postal_code_is_valid},
    serviceability::{ComingSoonArea, ServiceRegistry},
};

/// The mutable subsystem state. `service_available` is never set on its own:
/// every change to `current_location` re-derives it in the same step.
#[derive(Debug, Clone, Default)]
pub(crate) struct LocationState {
    pub(crate) current_location: Option<ResolvedLocation>,
    pub(crate) permission_granted: bool,
    pub(crate) service_available: bool,
    pub(crate) saved_addresses: Vec<SavedAddress>,
}

/// Snapshot of the subsystem for the consuming shell, cloned out on demand
/// after an update notification.
#[derive(Debug, Clone, Serialize, Deserialize, specta::Type)]
pub struct LocationUiState {
    pub current_location: Option<ResolvedLocation>,
    pub permission_granted: bool,
    pub service_available: bool,
    pub saved_addresses: Vec<SavedAddress>,
    /// Name of the serviceable city the current coordinate falls in
    pub serviceable_city: Option<String>,
    /// Launch info when the resolved city is on the coming-soon list
    pub coming_soon: Option<ComingSoonArea>,
}

impl LocationState {
    /// Commit a device-acquired location, deriving serviceability from the
    /// coordinate.
    pub(crate) fn apply_device_location(
        &mut self,
        location: ResolvedLocation,
        registry: &ServiceRegistry,
    ) {
        self.service_available = registry.serviceable_by_coordinate(location.coordinate);
        self.current_location = Some(location);
    }

    /// Commit a user-chosen location. The postal allow-list is authoritative
    /// when the code is usable, the coordinate test is the fallback.
    pub(crate) fn apply_chosen_location(
        &mut self,
        location: ResolvedLocation,
        registry: &ServiceRegistry,
    ) {
        self.service_available = if postal_code_is_valid(&location.postal_code) {
            registry.serviceable_by_postal_code(&location.postal_code)
        } else {
            registry.serviceable_by_coordinate(location.coordinate)
        };
        self.current_location = Some(location);
    }

    /// Drop the cached location when permission can no longer back it.
    /// Manual locations do not depend on the sensor and survive. Returns
    /// whether anything was dropped.
    pub(crate) fn purge_device_location(&mut self) -> bool {
        let device_derived = self
            .current_location
            .as_ref()
            .is_some_and(|loc| loc.source == LocationSource::Device);

        if device_derived {
            self.current_location = None;
            self.service_available = false;
        }

        device_derived
    }

    /// Append a new address or replace the entry with the same id in place,
    /// preserving display order.
    pub(crate) fn upsert_address(&mut self, address: SavedAddress) {
        if let Some(slot) = self
            .saved_addresses
            .iter_mut()
            .find(|existing| existing.id == address.id)
        {
            *slot = address;
        } else {
            self.saved_addresses.push(address);
        }
    }

    /// Remove by id, returns whether an entry was removed
    pub(crate) fn remove_address(&mut self, id: Uuid) -> bool {
        let before = self.saved_addresses.len();
        self.saved_addresses.retain(|address| address.id != id);
        self.saved_addresses.len() != before
    }

    pub(crate) fn as_ui_state(&self, registry: &ServiceRegistry) -> LocationUiState {
        let serviceable_city = self
            .current_location
            .as_ref()
            .and_then(|loc| registry.city_name_for(loc.coordinate))
            .map(str::to_string);
        let coming_soon = self
            .current_location
            .as_ref()
            .and_then(|loc| registry.coming_soon_info(&loc.city))
            .cloned();

        LocationUiState {
            current_location: self.current_location.clone(),
            permission_granted: self.permission_granted,
            service_available: self.service_available,
            saved_addresses: self.saved_addresses.clone(),
            serviceable_city,
            coming_soon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{address::AddressKind, location::Coordinate};

    fn mumbai_manual(postal_code: &str) -> ResolvedLocation {
        ResolvedLocation::manual(
            Coordinate::new(19.0760, 72.8777),
            "Fort",
            "Mumbai",
            "Maharashtra",
            postal_code,
        )
    }

    #[test]
    fn test_chosen_location_postal_is_authoritative() {
        let registry = ServiceRegistry::default();
        let mut state = LocationState::default();

        // Valid but unconfigured code: the allow-list decides, even though
        // the coordinate is inside the Mumbai radius
        state.apply_chosen_location(mumbai_manual("999999"), &registry);
        assert!(!state.service_available);

        state.apply_chosen_location(mumbai_manual("400001"), &registry);
        assert!(state.service_available);
    }

    #[test]
    fn test_chosen_location_falls_back_to_coordinate() {
        let registry = ServiceRegistry::default();
        let mut state = LocationState::default();

        // Unusable code, coordinate inside the radius
        state.apply_chosen_location(mumbai_manual("000000"), &registry);
        assert!(state.service_available);
    }

    #[test]
    fn test_purge_spares_manual_locations() {
        let registry = ServiceRegistry::default();
        let mut state = LocationState::default();

        state.apply_chosen_location(mumbai_manual("400001"), &registry);
        assert!(!state.purge_device_location());
        assert!(state.current_location.is_some());
        assert!(state.service_available);

        let mut device = mumbai_manual("400001");
        device.source = LocationSource::Device;
        state.apply_device_location(device, &registry);
        assert!(state.purge_device_location());
        assert!(state.current_location.is_none());
        assert!(!state.service_available);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut state = LocationState::default();

        let first = SavedAddress::new(AddressKind::Home, "Home", mumbai_manual("400001"));
        let second = SavedAddress::new(AddressKind::Office, "Work", mumbai_manual("400020"));
        state.upsert_address(first.clone());
        state.upsert_address(second.clone());

        let mut edited = first.clone();
        edited.label = "Family home".to_string();
        state.upsert_address(edited);

        assert_eq!(state.saved_addresses.len(), 2);
        assert_eq!(state.saved_addresses[0].id, first.id, "order preserved");
        assert_eq!(state.saved_addresses[0].label, "Family home");
        assert_eq!(state.saved_addresses[1].id, second.id);
    }

    #[test]
    fn test_ui_state_flags_coming_soon_city() {
        let registry = ServiceRegistry::default();
        let mut state = LocationState::default();

        // Connaught Place, Delhi: not serviceable, on the coming-soon list
        let delhi = ResolvedLocation::manual(
            Coordinate::new(28.6315, 77.2167),
            "Connaught Place",
            "Delhi",
            "Delhi",
            "110001",
        );
        state.apply_chosen_location(delhi, &registry);

        let ui = state.as_ui_state(&registry);
        assert!(!ui.service_available);
        assert_eq!(ui.serviceable_city, None);
        assert_eq!(ui.coming_soon.map(|area| area.name), Some("Delhi".to_string()));
    }
}
