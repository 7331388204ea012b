//! Tableside Client - shared plumbing for the storefront and admin screens.
//!
//! # Layers
//!
//! - [`storage`] - durable and transient key-value stores
//! - [`session`] - bearer token persistence on top of a durable store
//! - [`gateway`] - the REST client: envelope handling, auth headers, caching
//! - [`realtime`] - STOMP-over-WebSocket notification channel with reconnect
//!   and polling fallback
//! - [`identity`] - the current-user context built from session + gateway
//! - [`guard`] - route access decisions for admin screens
//!
//! [`AppContext`] wires all of them together from a [`ClientConfig`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod context;
pub mod gateway;
pub mod guard;
pub mod identity;
pub mod realtime;
pub mod session;
pub mod storage;
pub mod telemetry;

pub use config::{ClientConfig, ConfigError};
pub use context::{AppContext, ContextError};
pub use gateway::{ApiClient, GatewayError, GatewayErrorKind};
pub use guard::{
    DEFAULT_AFTER_LOGIN, GuardInput, GuardOutcome, LOGIN_PATH, UNAUTHORIZED_PATH, post_login_target,
};
pub use identity::{IdentityState, SessionContext, SessionError};
pub use realtime::{ChannelEvent, ConnectionState, NotificationChannel, Retry, Viewer};
pub use session::SessionStore;
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
