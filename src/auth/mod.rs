//! Session authentication
//!
//! `tokens` signs and verifies session tokens, `session` turns a bearer
//! header into an [`AuthContext`](turnate_types::AuthContext) after checking
//! the principal against the user registry.

mod session;
mod tokens;

pub use session::SessionAuthenticator;
pub use tokens::{IssuedToken, SessionManager};
