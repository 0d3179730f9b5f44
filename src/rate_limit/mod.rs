// ============================================================================
// Rate Limiting
// ============================================================================
//
// Token-bucket admission keyed by client, in three tiers (global, auth, api).
//
// - clock: injectable monotonic time source
// - bucket: refill-then-spend arithmetic for one client
// - store: keyed bucket map with idle-bucket sweeping
// - tiers: the three stores and their rejection messages
//
// ============================================================================

mod bucket;
mod clock;
mod store;
mod tiers;

pub use bucket::ClientBucket;
pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{BucketStore, SweeperHandle};
pub use tiers::{RateLimiterTiers, RateTier, TierSweepers};
