//! Job board discovery: the open-shift query plus a fixed-interval poller.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;
use shield_core::dedupe::{dedupe_by_key, unique_keys};
use shield_core::models::{AvailableShift, Booking, Shift, Venue};
use shield_core::pay;
use shield_core::repository::{RepoResult, ShieldStore};

pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(15);

const FALLBACK_EVENT_NAME: &str = "Event";
const FALLBACK_VENUE_NAME: &str = "Venue";

/// Clamp a configured interval into the supported 10-15 second window.
pub fn poll_interval(seconds: u64) -> Duration {
    Duration::from_secs(seconds).clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL)
}

/// Reads open shifts and resolves their booking and venue names.
pub struct ShiftFeed {
    store: Arc<dyn ShieldStore>,
}

impl ShiftFeed {
    pub fn new(store: Arc<dyn ShieldStore>) -> Self {
        Self { store }
    }

    pub async fn fetch_available(&self, now: DateTime<Utc>) -> RepoResult<Vec<AvailableShift>> {
        let shifts = self.store.list_open_shifts(now).await?;

        // Don't trust the backend filter: claimed or already-started rows never reach the board.
        let shifts: Vec<Shift> = shifts.into_iter().filter(|s| s.is_available_at(now)).collect();
        let shifts = dedupe_by_key(shifts, |s| s.id);

        let booking_ids = unique_keys(&shifts, |s| s.booking_id);
        let booking_rows = self.store.get_bookings(&booking_ids).await?;

        let venue_ids = unique_keys(&booking_rows, |b| b.venue_id);
        let bookings: HashMap<Uuid, Booking> = booking_rows.into_iter().map(|b| (b.id, b)).collect();
        let venues: HashMap<Uuid, Venue> = self
            .store
            .get_venues(&venue_ids)
            .await?
            .into_iter()
            .map(|v| (v.id, v))
            .collect();

        let mut available: Vec<AvailableShift> = shifts
            .into_iter()
            .filter_map(|shift| to_available(shift, &bookings, &venues))
            .collect();
        available.sort_by_key(|s| s.scheduled_start);

        debug!("Resolved {} available shifts", available.len());
        Ok(available)
    }
}

fn to_available(
    shift: Shift,
    bookings: &HashMap<Uuid, Booking>,
    venues: &HashMap<Uuid, Venue>,
) -> Option<AvailableShift> {
    let hours = match pay::scheduled_hours(shift.scheduled_start, shift.scheduled_end) {
        Ok(h) => h,
        Err(e) => {
            warn!("Skipping shift {}: {}", shift.id, e);
            return None;
        }
    };
    let estimated_pay = pay::round2(shift.hourly_rate * hours);

    let booking = bookings.get(&shift.booking_id);
    let venue = booking.and_then(|b| venues.get(&b.venue_id));

    Some(AvailableShift {
        shift_id: shift.id,
        booking_id: shift.booking_id,
        venue_id: booking.map(|b| b.venue_id),
        role: shift.role,
        hourly_rate: shift.hourly_rate,
        scheduled_start: shift.scheduled_start,
        scheduled_end: shift.scheduled_end,
        event_name: booking
            .map(|b| b.event_name.clone())
            .unwrap_or_else(|| FALLBACK_EVENT_NAME.to_string()),
        venue_name: venue
            .map(|v| v.name.clone())
            .unwrap_or_else(|| FALLBACK_VENUE_NAME.to_string()),
        hours,
        estimated_pay,
    })
}

/// Owns the polling task and the latest published list.
///
/// Failed polls are logged and leave the previous snapshot in place. Shifts
/// removed locally stay hidden until the backend stops returning them, so an
/// in-flight poll cannot resurrect a shift that was just lost.
pub struct ShiftPoller {
    feed: Arc<ShiftFeed>,
    tx: Arc<watch::Sender<Vec<AvailableShift>>>,
    hidden: Arc<Mutex<HashSet<Uuid>>>,
    task: JoinHandle<()>,
    interval: Duration,
}

impl ShiftPoller {
    /// Spawn the poll loop. The first poll runs immediately.
    pub fn start(feed: Arc<ShiftFeed>, interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        let tx = Arc::new(tx);
        let hidden = Arc::new(Mutex::new(HashSet::new()));

        let task = tokio::spawn(poll_loop(feed.clone(), tx.clone(), hidden.clone(), interval));
        tracing::info!("Shift poller started (every {}s)", interval.as_secs());

        Self { feed, tx, hidden, task, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn snapshot(&self) -> Vec<AvailableShift> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<AvailableShift>> {
        self.tx.subscribe()
    }

    /// Pull-to-refresh: poll now and return the fresh list.
    pub async fn refresh(&self) -> RepoResult<Vec<AvailableShift>> {
        match self.feed.fetch_available(Utc::now()).await {
            Ok(list) => Ok(publish(&self.tx, &self.hidden, list)),
            Err(e) => {
                error!("Manual refresh failed: {}", e);
                Err(e)
            }
        }
    }

    /// Optimistically drop a shift from the local list. Returns true if it was listed.
    pub fn remove(&self, shift_id: Uuid) -> bool {
        let mut hidden = lock_hidden(&self.hidden);
        hidden.insert(shift_id);
        self.tx.send_if_modified(|list| {
            let before = list.len();
            list.retain(|s| s.shift_id != shift_id);
            list.len() != before
        })
    }

    pub fn shutdown(&self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for ShiftPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll_loop(
    feed: Arc<ShiftFeed>,
    tx: Arc<watch::Sender<Vec<AvailableShift>>>,
    hidden: Arc<Mutex<HashSet<Uuid>>>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match feed.fetch_available(Utc::now()).await {
            Ok(list) => {
                publish(&tx, &hidden, list);
            }
            Err(e) => error!("Failed to poll available shifts: {}", e),
        }
    }
}

fn publish(
    tx: &watch::Sender<Vec<AvailableShift>>,
    hidden: &Mutex<HashSet<Uuid>>,
    mut list: Vec<AvailableShift>,
) -> Vec<AvailableShift> {
    // Held across the send so a concurrent remove() cannot interleave.
    let mut hidden = lock_hidden(hidden);
    // Forget ids the backend no longer returns
    hidden.retain(|id| list.iter().any(|s| s.shift_id == *id));
    list.retain(|s| !hidden.contains(&s.shift_id));
    tx.send_replace(list.clone());
    list
}

fn lock_hidden(hidden: &Mutex<HashSet<Uuid>>) -> std::sync::MutexGuard<'_, HashSet<Uuid>> {
    hidden.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
