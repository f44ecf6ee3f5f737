//! In-process store honouring the same contract as the Supabase schema.
//!
//! `claim_shift` is a conditional update under a single lock, which gives the
//! one-winner guarantee the real procedure provides. Failure switches let
//! callers simulate a flaky backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;
use shield_core::models::{
    Booking, ClaimResponse, NewNotification, Notification, Personnel, Shift, Venue, CLAIM_CONFLICT_CODE,
};
use shield_core::repository::{
    BookingRepository, ChatRepository, CheckInRecord, HealthCheck, NotificationRepository,
    PersonnelRepository, RepoResult, ShiftRepository,
};

#[derive(Default)]
struct State {
    shifts: Vec<Shift>,
    bookings: HashMap<Uuid, Booking>,
    venues: HashMap<Uuid, Venue>,
    personnel: HashMap<Uuid, Personnel>,
    notifications: Vec<Notification>,
    chats: HashMap<Uuid, Uuid>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_reads: AtomicBool,
    fail_chat: AtomicBool,
    fail_notifications: AtomicBool,
    open_shift_queries: AtomicUsize,
}

#[derive(Debug, thiserror::Error)]
#[error("simulated backend failure: {0}")]
pub struct SimulatedFailure(&'static str);

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves plain data behind; keep serving it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert_venue(&self, venue: Venue) {
        self.lock().venues.insert(venue.id, venue);
    }

    pub fn insert_booking(&self, booking: Booking) {
        self.lock().bookings.insert(booking.id, booking);
    }

    pub fn insert_personnel(&self, personnel: Personnel) {
        self.lock().personnel.insert(personnel.id, personnel);
    }

    /// Rows are kept in insertion order, duplicates included, like an unkeyed view.
    pub fn insert_shift(&self, shift: Shift) {
        self.lock().shifts.push(shift);
    }

    pub fn shift(&self, id: Uuid) -> Option<Shift> {
        self.lock().shifts.iter().find(|s| s.id == id).cloned()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }

    pub fn chat_for_booking(&self, booking_id: Uuid) -> Option<Uuid> {
        self.lock().chats.get(&booking_id).copied()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_chat(&self, fail: bool) {
        self.fail_chat.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }

    /// Number of times the open-shift query has run.
    pub fn open_shift_queries(&self) -> usize {
        self.open_shift_queries.load(Ordering::SeqCst)
    }

    fn check_reads(&self) -> RepoResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Box::new(SimulatedFailure("reads")));
        }
        Ok(())
    }
}

#[async_trait]
impl ShiftRepository for MemoryStore {
    async fn list_open_shifts(&self, now: DateTime<Utc>) -> RepoResult<Vec<Shift>> {
        self.open_shift_queries.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;

        let mut shifts: Vec<Shift> = self
            .lock()
            .shifts
            .iter()
            .filter(|s| s.is_available_at(now))
            .cloned()
            .collect();
        shifts.sort_by_key(|s| s.scheduled_start);
        Ok(shifts)
    }

    async fn get_shift(&self, id: Uuid) -> RepoResult<Option<Shift>> {
        self.check_reads()?;
        Ok(self.shift(id))
    }

    async fn list_personnel_shifts(&self, personnel_id: Uuid) -> RepoResult<Vec<Shift>> {
        self.check_reads()?;
        let mut shifts: Vec<Shift> = self
            .lock()
            .shifts
            .iter()
            .filter(|s| s.personnel_id == Some(personnel_id))
            .cloned()
            .collect();
        shifts.sort_by_key(|s| s.scheduled_start);
        Ok(shifts)
    }

    async fn claim_shift(&self, shift_id: Uuid, personnel_id: Uuid) -> RepoResult<ClaimResponse> {
        let mut state = self.lock();

        if !state.personnel.contains_key(&personnel_id) {
            return Ok(ClaimResponse::failed("PERSONNEL_NOT_FOUND", "Personnel profile not found"));
        }

        let Some(shift) = state.shifts.iter_mut().find(|s| s.id == shift_id) else {
            return Ok(ClaimResponse::failed("SHIFT_NOT_FOUND", "Shift not found"));
        };

        if shift.personnel_id.is_some() {
            return Ok(ClaimResponse::failed(CLAIM_CONFLICT_CODE, "Shift has already been claimed"));
        }

        if shift.scheduled_start < Utc::now() {
            return Ok(ClaimResponse::failed("SHIFT_STARTED", "Shift has already started"));
        }

        shift.personnel_id = Some(personnel_id);
        Ok(ClaimResponse::claimed())
    }

    async fn record_check_in(&self, shift_id: Uuid, check_in: &CheckInRecord) -> RepoResult<()> {
        let mut state = self.lock();
        let shift = state
            .shifts
            .iter_mut()
            .find(|s| s.id == shift_id)
            .ok_or_else(|| format!("shift {} not found", shift_id))?;

        shift.check_in_time = Some(check_in.at);
        shift.check_in_latitude = Some(check_in.latitude);
        shift.check_in_longitude = Some(check_in.longitude);
        shift.check_in_address = Some(check_in.address.clone());
        Ok(())
    }

    async fn record_check_out(&self, shift_id: Uuid, at: DateTime<Utc>, total_hours: f64) -> RepoResult<()> {
        let mut state = self.lock();
        let shift = state
            .shifts
            .iter_mut()
            .find(|s| s.id == shift_id)
            .ok_or_else(|| format!("shift {} not found", shift_id))?;

        shift.check_out_time = Some(at);
        shift.total_hours = Some(total_hours);
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn get_bookings(&self, ids: &[Uuid]) -> RepoResult<Vec<Booking>> {
        self.check_reads()?;
        let state = self.lock();
        Ok(ids.iter().filter_map(|id| state.bookings.get(id).cloned()).collect())
    }

    async fn get_venues(&self, ids: &[Uuid]) -> RepoResult<Vec<Venue>> {
        self.check_reads()?;
        let state = self.lock();
        Ok(ids.iter().filter_map(|id| state.venues.get(id).cloned()).collect())
    }
}

#[async_trait]
impl PersonnelRepository for MemoryStore {
    async fn get_personnel(&self, id: Uuid) -> RepoResult<Option<Personnel>> {
        Ok(self.lock().personnel.get(&id).cloned())
    }

    async fn get_personnel_by_user(&self, user_id: Uuid) -> RepoResult<Option<Personnel>> {
        Ok(self
            .lock()
            .personnel
            .values()
            .find(|p| p.user_id == user_id)
            .cloned())
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert_notification(&self, notification: &NewNotification) -> RepoResult<Uuid> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(Box::new(SimulatedFailure("notifications")));
        }
        let row = Notification::from_new(notification.clone());
        let id = row.id;
        self.lock().notifications.push(row);
        Ok(id)
    }

    async fn list_notifications(&self, user_id: Uuid) -> RepoResult<Vec<Notification>> {
        let mut rows: Vec<Notification> = self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

#[async_trait]
impl ChatRepository for MemoryStore {
    async fn create_mission_control_chat(&self, booking_id: Uuid) -> RepoResult<Uuid> {
        if self.fail_chat.load(Ordering::SeqCst) {
            return Err(Box::new(SimulatedFailure("chat")));
        }
        // One mission-control chat per booking
        let mut state = self.lock();
        let chat_id = *state.chats.entry(booking_id).or_insert_with(Uuid::new_v4);
        Ok(chat_id)
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> RepoResult<()> {
        self.check_reads()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn personnel(name: &str) -> Personnel {
        Personnel { id: Uuid::new_v4(), user_id: Uuid::new_v4(), display_name: name.to_string() }
    }

    fn future_shift() -> Shift {
        let start = Utc::now() + Duration::hours(4);
        Shift::new(Uuid::new_v4(), "Door Supervisor", 15.0, start, start + Duration::hours(8))
    }

    #[tokio::test]
    async fn test_claimed_shift_leaves_open_list() {
        let store = MemoryStore::new();
        let guard = personnel("Sam");
        store.insert_personnel(guard.clone());
        let shift = future_shift();
        store.insert_shift(shift.clone());

        assert_eq!(store.list_open_shifts(Utc::now()).await.unwrap().len(), 1);

        let resp = store.claim_shift(shift.id, guard.id).await.unwrap();
        assert!(resp.success);

        assert!(store.list_open_shifts(Utc::now()).await.unwrap().is_empty());
        let mine = store.list_personnel_shifts(guard.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, shift.id);
    }

    #[tokio::test]
    async fn test_second_claim_conflicts() {
        let store = MemoryStore::new();
        let first = personnel("First");
        let second = personnel("Second");
        store.insert_personnel(first.clone());
        store.insert_personnel(second.clone());
        let shift = future_shift();
        store.insert_shift(shift.clone());

        assert!(store.claim_shift(shift.id, first.id).await.unwrap().success);
        let resp = store.claim_shift(shift.id, second.id).await.unwrap();
        assert!(resp.is_conflict());
        assert_eq!(store.shift(shift.id).unwrap().personnel_id, Some(first.id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_single_winner() {
        let store = Arc::new(MemoryStore::new());
        let shift = future_shift();
        let shift_id = shift.id;
        store.insert_shift(shift);

        let guards: Vec<Personnel> = (0..16).map(|i| personnel(&format!("guard-{}", i))).collect();
        for g in &guards {
            store.insert_personnel(g.clone());
        }

        let handles: Vec<_> = guards
            .iter()
            .map(|g| {
                let store = store.clone();
                let guard_id = g.id;
                tokio::spawn(async move { store.claim_shift(shift_id, guard_id).await.unwrap() })
            })
            .collect();

        let mut winners = 0;
        let mut conflicts = 0;
        for h in handles {
            let resp = h.await.unwrap();
            if resp.success {
                winners += 1;
            } else if resp.is_conflict() {
                conflicts += 1;
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(conflicts, 15);
    }

    #[tokio::test]
    async fn test_claim_unknown_shift() {
        let store = MemoryStore::new();
        let guard = personnel("Sam");
        store.insert_personnel(guard.clone());

        let resp = store.claim_shift(Uuid::new_v4(), guard.id).await.unwrap();
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("SHIFT_NOT_FOUND"));
        assert!(!resp.is_conflict());
    }

    #[tokio::test]
    async fn test_chat_is_per_booking() {
        let store = MemoryStore::new();
        let booking_id = Uuid::new_v4();
        let a = store.create_mission_control_chat(booking_id).await.unwrap();
        let b = store.create_mission_control_chat(booking_id).await.unwrap();
        assert_eq!(a, b);

        store.set_fail_chat(true);
        assert!(store.create_mission_control_chat(Uuid::new_v4()).await.is_err());
    }
}
