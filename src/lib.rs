//! Turnate admission and authorization gateway
//!
//! Everything a request passes through before a messaging handler runs:
//! tiered token-bucket rate limiting, an ordered interceptor chain (security
//! headers, input screening, content-type validation, a deadline), session
//! authentication re-checked against the user registry, and the channel
//! authorization rules applied by [`channels::ChannelService`] and
//! [`users::UserService`].

pub mod access;
pub mod auth;
pub mod channels;
pub mod extractors;
pub mod gateway;
pub mod interceptors;
pub mod logging;
pub mod memory;
pub mod rate_limit;
pub mod registry;
pub mod users;
pub mod utils;

pub use gateway::Gateway;
pub use turnate_config::Config;
pub use turnate_error::{AppError, AppResult};
