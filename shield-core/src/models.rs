use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error code returned by `claim_shift` when another guard won the race.
pub const CLAIM_CONFLICT_CODE: &str = "SHIFT_ALREADY_CLAIMED";

/// A single bookable slot inside a venue booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shift {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub role: String,
    pub hourly_rate: f64,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    /// `None` while the shift is unclaimed
    pub personnel_id: Option<Uuid>,
    #[serde(default)]
    pub check_in_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub check_in_latitude: Option<f64>,
    #[serde(default)]
    pub check_in_longitude: Option<f64>,
    #[serde(default)]
    pub check_in_address: Option<String>,
    #[serde(default)]
    pub check_out_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_hours: Option<f64>,
}

impl Shift {
    pub fn new(
        booking_id: Uuid,
        role: impl Into<String>,
        hourly_rate: f64,
        scheduled_start: DateTime<Utc>,
        scheduled_end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id,
            role: role.into(),
            hourly_rate,
            scheduled_start,
            scheduled_end,
            personnel_id: None,
            check_in_time: None,
            check_in_latitude: None,
            check_in_longitude: None,
            check_in_address: None,
            check_out_time: None,
            total_hours: None,
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.personnel_id.is_some()
    }

    /// Unclaimed and not yet started relative to `now`.
    pub fn is_available_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_claimed() && self.scheduled_start >= now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub event_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Venue {
    pub id: Uuid,
    pub name: String,
    pub owner_user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Personnel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    ShiftClaimed,
    ShiftReminder,
    BookingUpdate,
    Message,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::ShiftClaimed => "shift_claimed",
            NotificationType::ShiftReminder => "shift_reminder",
            NotificationType::BookingUpdate => "booking_update",
            NotificationType::Message => "message",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "shift_claimed" => Some(NotificationType::ShiftClaimed),
            "shift_reminder" => Some(NotificationType::ShiftReminder),
            "booking_update" => Some(NotificationType::BookingUpdate),
            "message" => Some(NotificationType::Message),
            _ => None,
        }
    }
}

/// Row to insert into `notifications`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_new(new: NewNotification) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            notification_type: new.notification_type,
            title: new.title,
            body: new.body,
            data: new.data,
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// Payload returned by the `claim_shift` RPC.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaimResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ClaimResponse {
    pub fn claimed() -> Self {
        Self {
            success: true,
            error: None,
            message: Some("Shift claimed".to_string()),
        }
    }

    pub fn failed(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(code.to_string()),
            message: Some(message.into()),
        }
    }

    /// True when the backend reports that someone else holds the shift.
    pub fn is_conflict(&self) -> bool {
        !self.success && self.error.as_deref() == Some(CLAIM_CONFLICT_CODE)
    }
}

/// Display-ready row for the job board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailableShift {
    pub shift_id: Uuid,
    pub booking_id: Uuid,
    pub venue_id: Option<Uuid>,
    pub role: String,
    pub hourly_rate: f64,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub event_name: String,
    pub venue_name: String,
    pub hours: f64,
    pub estimated_pay: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_claim_response_deserialization() {
        let json = r#"{ "success": false, "error": "SHIFT_ALREADY_CLAIMED", "message": "taken" }"#;
        let resp: ClaimResponse = serde_json::from_str(json).expect("Failed to deserialize");
        assert!(resp.is_conflict());

        let ok: ClaimResponse = serde_json::from_str(r#"{ "success": true }"#).unwrap();
        assert!(ok.success);
        assert!(!ok.is_conflict());
    }

    #[test]
    fn test_shift_availability() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut shift = Shift::new(Uuid::new_v4(), "Door Supervisor", 15.0, now + Duration::hours(1), now + Duration::hours(9));
        assert!(shift.is_available_at(now));

        shift.personnel_id = Some(Uuid::new_v4());
        assert!(!shift.is_available_at(now));

        shift.personnel_id = None;
        assert!(!shift.is_available_at(now + Duration::hours(2)));
    }

    #[test]
    fn test_notification_type_serialization() {
        let value = serde_json::to_value(NotificationType::ShiftClaimed).unwrap();
        assert_eq!(value, serde_json::json!("shift_claimed"));
        assert_eq!(NotificationType::parse("shift_claimed"), Some(NotificationType::ShiftClaimed));
        assert_eq!(NotificationType::parse("bogus"), None);
    }
}
