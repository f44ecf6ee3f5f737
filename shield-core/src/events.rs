use uuid::Uuid;

/// Broadcast to realtime subscribers once a claim is confirmed by the backend.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ShiftClaimedEvent {
    pub shift_id: Uuid,
    pub booking_id: Uuid,
    pub personnel_id: Uuid,
    pub claimed_at: i64,
}
