pub mod discovery;
pub mod claim;
pub mod tracker;
pub mod assistant;
pub mod deeplink;

pub use discovery::{ShiftFeed, ShiftPoller};
pub use claim::{ClaimError, ClaimOutcome, ClaimQuote, ClaimService};
pub use tracker::{ShiftTracker, TrackerError};
pub use assistant::Assistant;
