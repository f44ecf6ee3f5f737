use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use shield_board::assistant::ChatBackend;
use shield_board::{ClaimService, ShiftFeed, ShiftPoller, ShiftTracker};
use shield_core::events::ShiftClaimedEvent;
use shield_core::repository::ShieldStore;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ShieldStore>,
    pub poller: Arc<ShiftPoller>,
    pub claims: Arc<ClaimService>,
    pub tracker: Arc<ShiftTracker>,
    pub chat: Arc<dyn ChatBackend>,
    pub events: broadcast::Sender<ShiftClaimedEvent>,
    pub auth: AuthConfig,
}

impl AppState {
    /// Wire the board services together and start polling. Requires a tokio runtime.
    pub fn new(
        store: Arc<dyn ShieldStore>,
        chat: Arc<dyn ChatBackend>,
        auth: AuthConfig,
        poll_interval: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(100);

        let feed = Arc::new(ShiftFeed::new(store.clone()));
        let poller = Arc::new(ShiftPoller::start(feed, poll_interval));
        let claims = ClaimService::new(store.clone())
            .with_poller(poller.clone())
            .with_events(events.clone());
        let tracker = ShiftTracker::new(store.clone());

        Self {
            store,
            poller,
            claims: Arc::new(claims),
            tracker: Arc::new(tracker),
            chat,
            events,
            auth,
        }
    }
}
