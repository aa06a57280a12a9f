use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::LocationError,
    location::{ResolvedLocation, postal_code_is_valid},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, specta::Type)]
pub enum AddressKind {
    Home,
    Office,
    Other,
}

/// A user-saved, named location. The id is generated once at creation and is
/// the address's identity: editing fields (including the coordinate) replaces
/// the stored value under the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, specta::Type)]
pub struct SavedAddress {
    pub id: Uuid,
    pub kind: AddressKind,
    pub label: String,
    pub location: ResolvedLocation,
}

impl SavedAddress {
    /// Create a new address with a fresh id
    pub fn new(kind: AddressKind, label: impl Into<String>, location: ResolvedLocation) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            label: label.into(),
            location,
        }
    }

    /// Check the fields an address must carry before it can be saved.
    /// Returns a [LocationError::Validation], the caller fixes the input and
    /// retries.
    pub fn validate(&self) -> Result<(), LocationError> {
        fn required(field: &str, value: &str) -> Result<(), LocationError> {
            if value.trim().is_empty() {
                Err(LocationError::Validation(format!("{field} must not be empty")))
            } else {
                Ok(())
            }
        }

        required("label", &self.label)?;
        required("address line", &self.location.area_label)?;
        required("city", &self.location.city)?;
        required("state", &self.location.state)?;

        if !postal_code_is_valid(&self.location.postal_code) {
            return Err(LocationError::Validation(format!(
                "postal code {:?} is not a valid 6-digit code",
                self.location.postal_code
            )));
        }

        Ok(())
    }
}
