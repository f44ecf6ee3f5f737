use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::models::{Booking, ClaimResponse, NewNotification, Notification, Personnel, Shift, Venue};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;
pub type RepoResult<T> = Result<T, RepoError>;

/// Location captured when a guard checks in.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInRecord {
    pub at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

/// Repository trait for shift data access
#[async_trait]
pub trait ShiftRepository: Send + Sync {
    /// Shifts with no personnel whose start is at or after `now`.
    async fn list_open_shifts(
        &self,
        now: DateTime<Utc>,
    ) -> RepoResult<Vec<Shift>>;

    async fn get_shift(
        &self,
        id: Uuid,
    ) -> RepoResult<Option<Shift>>;

    async fn list_personnel_shifts(
        &self,
        personnel_id: Uuid,
    ) -> RepoResult<Vec<Shift>>;

    /// Invoke the backend `claim_shift` procedure. Exclusivity is the backend's job.
    async fn claim_shift(
        &self,
        shift_id: Uuid,
        personnel_id: Uuid,
    ) -> RepoResult<ClaimResponse>;

    async fn record_check_in(
        &self,
        shift_id: Uuid,
        check_in: &CheckInRecord,
    ) -> RepoResult<()>;

    async fn record_check_out(
        &self,
        shift_id: Uuid,
        at: DateTime<Utc>,
        total_hours: f64,
    ) -> RepoResult<()>;
}

/// Parent lookups for shift display and notification routing
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn get_bookings(
        &self,
        ids: &[Uuid],
    ) -> RepoResult<Vec<Booking>>;

    async fn get_venues(
        &self,
        ids: &[Uuid],
    ) -> RepoResult<Vec<Venue>>;
}

#[async_trait]
pub trait PersonnelRepository: Send + Sync {
    async fn get_personnel(
        &self,
        id: Uuid,
    ) -> RepoResult<Option<Personnel>>;

    async fn get_personnel_by_user(
        &self,
        user_id: Uuid,
    ) -> RepoResult<Option<Personnel>>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert_notification(
        &self,
        notification: &NewNotification,
    ) -> RepoResult<Uuid>;

    async fn list_notifications(
        &self,
        user_id: Uuid,
    ) -> RepoResult<Vec<Notification>>;
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Invoke the backend `create_mission_control_chat` procedure, returning the chat id.
    async fn create_mission_control_chat(
        &self,
        booking_id: Uuid,
    ) -> RepoResult<Uuid>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Round-trip to the backend. `Err` means it is unreachable.
    async fn ping(&self) -> RepoResult<()>;
}

/// Everything the job board needs from the backend.
pub trait ShieldStore:
    ShiftRepository + BookingRepository + PersonnelRepository + NotificationRepository + ChatRepository + HealthCheck
{
}

impl<T> ShieldStore for T where
    T: ShiftRepository
        + BookingRepository
        + PersonnelRepository
        + NotificationRepository
        + ChatRepository
        + HealthCheck
{
}
