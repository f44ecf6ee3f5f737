//! GPS check-in and check-out for an assigned shift.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use shield_core::pay;
use shield_core::repository::{CheckInRecord, RepoError, ShieldStore};
use shield_core::CoreError;

pub type DeviceError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn label(&self) -> String {
        format!("{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Ask for foreground location access. `false` means denied.
    async fn request_permission(&self) -> bool;

    async fn current_position(&self) -> Result<Coordinates, DeviceError>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, coordinates: Coordinates) -> Result<Option<String>, DeviceError>;
}

/// A position and address reported by the client device itself.
#[derive(Debug, Clone)]
pub struct ReportedLocation {
    pub coordinates: Coordinates,
    pub permission_granted: bool,
    pub address: Option<String>,
}

#[async_trait]
impl LocationProvider for ReportedLocation {
    async fn request_permission(&self) -> bool {
        self.permission_granted
    }

    async fn current_position(&self) -> Result<Coordinates, DeviceError> {
        Ok(self.coordinates)
    }
}

#[async_trait]
impl Geocoder for ReportedLocation {
    async fn reverse(&self, _coordinates: Coordinates) -> Result<Option<String>, DeviceError> {
        Ok(self.address.clone())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckInReceipt {
    pub shift_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
    pub coordinates: Coordinates,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckOutReceipt {
    pub shift_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
    pub checked_out_at: DateTime<Utc>,
    pub total_hours: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Could not determine location: {0}")]
    Location(String),
    #[error("Shift not found: {0}")]
    ShiftNotFound(Uuid),
    #[error("Shift {0} is not assigned to this guard")]
    NotAssigned(Uuid),
    #[error("Already checked in to shift {0}")]
    AlreadyCheckedIn(Uuid),
    #[error("Not checked in to shift {0}")]
    NotCheckedIn(Uuid),
    #[error("Already checked out of shift {0}")]
    AlreadyCheckedOut(Uuid),
    #[error(transparent)]
    Invalid(#[from] CoreError),
    #[error("Repository error: {0}")]
    Repository(RepoError),
}

impl From<RepoError> for TrackerError {
    fn from(err: RepoError) -> Self {
        TrackerError::Repository(err)
    }
}

pub struct ShiftTracker {
    store: Arc<dyn ShieldStore>,
}

impl ShiftTracker {
    pub fn new(store: Arc<dyn ShieldStore>) -> Self {
        Self { store }
    }

    pub async fn check_in(
        &self,
        location: &dyn LocationProvider,
        geocoder: &dyn Geocoder,
        shift_id: Uuid,
        personnel_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<CheckInReceipt, TrackerError> {
        let shift = self
            .store
            .get_shift(shift_id)
            .await?
            .ok_or(TrackerError::ShiftNotFound(shift_id))?;

        if shift.personnel_id != Some(personnel_id) {
            return Err(TrackerError::NotAssigned(shift_id));
        }
        if shift.check_in_time.is_some() {
            return Err(TrackerError::AlreadyCheckedIn(shift_id));
        }

        if !location.request_permission().await {
            return Err(TrackerError::PermissionDenied);
        }
        let coordinates = location
            .current_position()
            .await
            .map_err(|e| TrackerError::Location(e.to_string()))?;

        let address = match geocoder.reverse(coordinates).await {
            Ok(Some(address)) if !address.trim().is_empty() => address,
            Ok(_) => coordinates.label(),
            Err(e) => {
                warn!("Reverse geocoding failed for shift {}: {}", shift_id, e);
                coordinates.label()
            }
        };

        let record = CheckInRecord {
            at,
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            address: address.clone(),
        };
        self.store.record_check_in(shift_id, &record).await?;

        info!("Personnel {} checked in to shift {} at {}", personnel_id, shift_id, address);
        Ok(CheckInReceipt { shift_id, checked_in_at: at, coordinates, address })
    }

    pub async fn check_out(
        &self,
        shift_id: Uuid,
        personnel_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<CheckOutReceipt, TrackerError> {
        let shift = self
            .store
            .get_shift(shift_id)
            .await?
            .ok_or(TrackerError::ShiftNotFound(shift_id))?;

        if shift.personnel_id != Some(personnel_id) {
            return Err(TrackerError::NotAssigned(shift_id));
        }
        let checked_in_at = shift.check_in_time.ok_or(TrackerError::NotCheckedIn(shift_id))?;
        if shift.check_out_time.is_some() {
            return Err(TrackerError::AlreadyCheckedOut(shift_id));
        }

        let total_hours = pay::elapsed_hours(checked_in_at, at)?;
        self.store.record_check_out(shift_id, at, total_hours).await?;

        info!("Personnel {} checked out of shift {} after {}h", personnel_id, shift_id, total_hours);
        Ok(CheckOutReceipt { shift_id, checked_in_at, checked_out_at: at, total_hours })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use shield_core::models::{Personnel, Shift};
    use shield_store::MemoryStore;

    struct FailingGeocoder;

    #[async_trait]
    impl Geocoder for FailingGeocoder {
        async fn reverse(&self, _c: Coordinates) -> Result<Option<String>, DeviceError> {
            Err("geocoder offline".into())
        }
    }

    fn setup() -> (Arc<MemoryStore>, ShiftTracker, Shift, Personnel) {
        let store = Arc::new(MemoryStore::new());
        let guard = Personnel { id: Uuid::new_v4(), user_id: Uuid::new_v4(), display_name: "Sam".into() };
        let start = Utc.with_ymd_and_hms(2030, 7, 4, 20, 0, 0).unwrap();
        let mut shift = Shift::new(Uuid::new_v4(), "Steward", 13.5, start, start + Duration::hours(4));
        shift.personnel_id = Some(guard.id);
        store.insert_personnel(guard.clone());
        store.insert_shift(shift.clone());
        let tracker = ShiftTracker::new(store.clone());
        (store, tracker, shift, guard)
    }

    fn camden(permission_granted: bool, address: Option<&str>) -> ReportedLocation {
        ReportedLocation {
            coordinates: Coordinates { latitude: 51.54321, longitude: -0.14765 },
            permission_granted,
            address: address.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_check_in_then_out() {
        let (store, tracker, shift, guard) = setup();
        let device = camden(true, Some("Chalk Farm Rd, London NW1 8EH"));
        let check_in = Utc.with_ymd_and_hms(2030, 7, 4, 20, 0, 0).unwrap();

        let receipt = tracker.check_in(&device, &device, shift.id, guard.id, check_in).await.unwrap();
        assert_eq!(receipt.address, "Chalk Farm Rd, London NW1 8EH");

        let stored = store.shift(shift.id).unwrap();
        assert_eq!(stored.check_in_time, Some(check_in));
        assert_eq!(stored.check_in_latitude, Some(51.54321));

        let check_out = Utc.with_ymd_and_hms(2030, 7, 4, 23, 30, 0).unwrap();
        let out = tracker.check_out(shift.id, guard.id, check_out).await.unwrap();
        assert_eq!(out.total_hours, 3.5);
        assert_eq!(store.shift(shift.id).unwrap().total_hours, Some(3.5));
    }

    #[tokio::test]
    async fn test_permission_denied() {
        let (store, tracker, shift, guard) = setup();
        let device = camden(false, None);

        let err = tracker.check_in(&device, &device, shift.id, guard.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, TrackerError::PermissionDenied));
        assert!(store.shift(shift.id).unwrap().check_in_time.is_none());
    }

    #[tokio::test]
    async fn test_geocoder_failure_falls_back_to_coordinates() {
        let (_store, tracker, shift, guard) = setup();
        let device = camden(true, None);

        let receipt = tracker
            .check_in(&device, &FailingGeocoder, shift.id, guard.id, Utc::now())
            .await
            .unwrap();
        assert_eq!(receipt.address, "51.54321, -0.14765");
    }

    #[tokio::test]
    async fn test_state_guards() {
        let (_store, tracker, shift, guard) = setup();
        let device = camden(true, None);
        let t0 = Utc.with_ymd_and_hms(2030, 7, 4, 20, 0, 0).unwrap();

        let err = tracker.check_out(shift.id, guard.id, t0).await.unwrap_err();
        assert!(matches!(err, TrackerError::NotCheckedIn(_)));

        let err = tracker.check_in(&device, &device, shift.id, Uuid::new_v4(), t0).await.unwrap_err();
        assert!(matches!(err, TrackerError::NotAssigned(_)));

        tracker.check_in(&device, &device, shift.id, guard.id, t0).await.unwrap();
        let err = tracker.check_in(&device, &device, shift.id, guard.id, t0).await.unwrap_err();
        assert!(matches!(err, TrackerError::AlreadyCheckedIn(_)));

        let err = tracker.check_out(shift.id, guard.id, t0 - Duration::minutes(5)).await.unwrap_err();
        assert!(matches!(err, TrackerError::Invalid(_)));

        tracker.check_out(shift.id, guard.id, t0 + Duration::hours(1)).await.unwrap();
        let err = tracker.check_out(shift.id, guard.id, t0 + Duration::hours(2)).await.unwrap_err();
        assert!(matches!(err, TrackerError::AlreadyCheckedOut(_)));
    }

    #[tokio::test]
    async fn test_unknown_shift() {
        let (_store, tracker, _shift, guard) = setup();
        let err = tracker.check_out(Uuid::new_v4(), guard.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, TrackerError::ShiftNotFound(_)));
    }
}
