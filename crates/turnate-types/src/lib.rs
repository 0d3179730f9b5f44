// ============================================================================
// Turnate Types - Core Data Types
// ============================================================================
//
// Domain vocabulary shared by the gateway crates. No business logic, no
// storage, no HTTP.
//
// Contents:
// - Roles and principals (the user registry's view of a user)
// - Channels, visibility and memberships
// - Messages and thread links
// - Session claims and the authenticated request context
//
// ============================================================================

pub mod channel;
pub mod message;
pub mod principal;
pub mod session;

pub use channel::*;
pub use message::*;
pub use principal::*;
pub use session::*;
