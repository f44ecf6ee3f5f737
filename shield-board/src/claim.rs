//! First-come-first-served shift claiming.
//!
//! Exclusivity is decided by the backend's `claim_shift` procedure. This
//! layer only interprets its answer: losers get a "too slow" outcome and the
//! shift disappears from the local board; winners trigger chat creation and a
//! venue-owner notification as detached, best-effort side effects.

use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;
use shield_core::events::ShiftClaimedEvent;
use shield_core::models::{NewNotification, NotificationType, Personnel, Shift};
use shield_core::pay;
use shield_core::repository::{RepoError, RepoResult, ShieldStore};
use shield_core::CoreError;
use crate::discovery::ShiftPoller;

pub const TOO_SLOW_MESSAGE: &str = "Too Slow! Another guard claimed this shift first.";
pub const ALREADY_YOURS_MESSAGE: &str = "You have already claimed this shift.";

/// Data for the confirm dialog.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClaimQuote {
    pub shift_id: Uuid,
    pub role: String,
    pub hourly_rate: f64,
    pub hours: f64,
    pub pay: f64,
    pub display: String,
}

#[derive(Debug)]
pub enum ClaimOutcome {
    Claimed { shift_id: Uuid, side_effects: SideEffects },
    /// Someone else won the race; the shift has been dropped locally.
    TooSlow { message: String },
    /// Refused for any other reason. Only a repeat claim by the holder drops the shift locally.
    Rejected { code: Option<String>, message: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SideEffectReport {
    pub chat_created: bool,
    pub owner_notified: bool,
}

/// Handle to the detached side effects of a successful claim.
///
/// Dropping it leaves the task running in the background.
pub struct SideEffects(JoinHandle<SideEffectReport>);

impl SideEffects {
    pub async fn wait(self) -> SideEffectReport {
        match self.0.await {
            Ok(report) => report,
            Err(e) => {
                warn!("Claim side effects task did not complete: {}", e);
                SideEffectReport::default()
            }
        }
    }
}

impl fmt::Debug for SideEffects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SideEffects").field("finished", &self.0.is_finished()).finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    #[error("Shift not found: {0}")]
    ShiftNotFound(Uuid),
    #[error(transparent)]
    Invalid(#[from] CoreError),
    #[error("Repository error: {0}")]
    Repository(RepoError),
}

impl From<RepoError> for ClaimError {
    fn from(err: RepoError) -> Self {
        ClaimError::Repository(err)
    }
}

pub struct ClaimService {
    store: Arc<dyn ShieldStore>,
    poller: Option<Arc<ShiftPoller>>,
    events: Option<broadcast::Sender<ShiftClaimedEvent>>,
}

impl ClaimService {
    pub fn new(store: Arc<dyn ShieldStore>) -> Self {
        Self { store, poller: None, events: None }
    }

    /// Keep this poller's list in sync with claim results.
    pub fn with_poller(mut self, poller: Arc<ShiftPoller>) -> Self {
        self.poller = Some(poller);
        self
    }

    pub fn with_events(mut self, events: broadcast::Sender<ShiftClaimedEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn quote(&self, shift: &Shift) -> Result<ClaimQuote, ClaimError> {
        let hours = pay::scheduled_hours(shift.scheduled_start, shift.scheduled_end)?;
        let amount = pay::shift_pay(shift.hourly_rate, shift.scheduled_start, shift.scheduled_end)?;

        Ok(ClaimQuote {
            shift_id: shift.id,
            role: shift.role.clone(),
            hourly_rate: shift.hourly_rate,
            hours,
            pay: amount,
            display: pay::format_gbp(amount),
        })
    }

    pub async fn quote_for(&self, shift_id: Uuid) -> Result<ClaimQuote, ClaimError> {
        let shift = self.load_shift(shift_id).await?;
        self.quote(&shift)
    }

    pub async fn claim(&self, shift_id: Uuid, personnel: &Personnel) -> Result<ClaimOutcome, ClaimError> {
        let shift = self.load_shift(shift_id).await?;

        if shift.personnel_id == Some(personnel.id) {
            info!("Personnel {} already holds shift {}", personnel.id, shift_id);
            self.drop_from_board(shift_id);
            return Ok(ClaimOutcome::Rejected { code: None, message: ALREADY_YOURS_MESSAGE.to_string() });
        }

        let response = self.store.claim_shift(shift_id, personnel.id).await?;

        if response.is_conflict() {
            info!("Shift {} lost to another guard (personnel {})", shift_id, personnel.id);
            self.drop_from_board(shift_id);
            return Ok(ClaimOutcome::TooSlow { message: TOO_SLOW_MESSAGE.to_string() });
        }

        if !response.success {
            let message = response
                .message
                .clone()
                .or_else(|| response.error.clone())
                .unwrap_or_else(|| "Unable to claim shift".to_string());
            warn!("Claim of shift {} rejected: {:?} {}", shift_id, response.error, message);
            return Ok(ClaimOutcome::Rejected { code: response.error, message });
        }

        info!("Shift {} claimed by personnel {}", shift_id, personnel.id);
        self.drop_from_board(shift_id);

        if let Some(events) = &self.events {
            // No subscribers is fine
            let _ = events.send(ShiftClaimedEvent {
                shift_id,
                booking_id: shift.booking_id,
                personnel_id: personnel.id,
                claimed_at: Utc::now().timestamp(),
            });
        }

        let side_effects = SideEffects(tokio::spawn(run_side_effects(
            self.store.clone(),
            shift,
            personnel.clone(),
        )));

        Ok(ClaimOutcome::Claimed { shift_id, side_effects })
    }

    async fn load_shift(&self, shift_id: Uuid) -> Result<Shift, ClaimError> {
        self.store
            .get_shift(shift_id)
            .await?
            .ok_or(ClaimError::ShiftNotFound(shift_id))
    }

    fn drop_from_board(&self, shift_id: Uuid) {
        if let Some(poller) = &self.poller {
            poller.remove(shift_id);
        }
    }
}

async fn run_side_effects(store: Arc<dyn ShieldStore>, shift: Shift, personnel: Personnel) -> SideEffectReport {
    let (chat, notified) = tokio::join!(
        store.create_mission_control_chat(shift.booking_id),
        notify_venue_owner(store.as_ref(), &shift, &personnel),
    );

    let chat_created = match chat {
        Ok(chat_id) => {
            info!("Mission control chat {} ready for booking {}", chat_id, shift.booking_id);
            true
        }
        Err(e) => {
            warn!("Non-critical: chat creation failed for booking {}: {}", shift.booking_id, e);
            false
        }
    };

    let owner_notified = match notified {
        Ok(()) => true,
        Err(e) => {
            warn!("Non-critical: venue notification failed for shift {}: {}", shift.id, e);
            false
        }
    };

    SideEffectReport { chat_created, owner_notified }
}

async fn notify_venue_owner(store: &dyn ShieldStore, shift: &Shift, personnel: &Personnel) -> RepoResult<()> {
    let booking = store
        .get_bookings(&[shift.booking_id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| format!("booking {} not found", shift.booking_id))?;

    let venue = store
        .get_venues(&[booking.venue_id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| format!("venue {} not found", booking.venue_id))?;

    let notification = NewNotification {
        user_id: venue.owner_user_id,
        notification_type: NotificationType::ShiftClaimed,
        title: "Shift Claimed".to_string(),
        body: format!(
            "{} has claimed the {} shift for {}",
            personnel.display_name, shift.role, booking.event_name
        ),
        data: serde_json::json!({
            "shift_id": shift.id,
            "booking_id": shift.booking_id,
            "personnel_id": personnel.id,
        }),
    };

    store.insert_notification(&notification).await?;
    Ok(())
}
