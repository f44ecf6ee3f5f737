pub mod models;
pub mod repository;
pub mod pay;
pub mod dedupe;
pub mod events;

pub use models::{
    AvailableShift, Booking, ClaimResponse, NewNotification, Notification, NotificationType,
    Personnel, Shift, Venue,
};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
