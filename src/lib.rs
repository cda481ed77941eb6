//! servicebot — Telegram bot for controlling systemd services remotely
//!
//! Whitelisted users issue lifecycle commands (status/start/stop) for a
//! configured set of services. Start/stop runs a two-step flow: a chooser
//! prompt with an inline keyboard, then a callback tap that performs the
//! action and edits the prompt in place.
//!
//! # Architecture
//!
//! ```text
//! Telegram ──► Dispatcher ──► message endpoint ──► Command Parser
//!                  │                │                   │
//!                  │           Session Store ◄──────────┤
//!                  │                │                   ▼
//!                  └─► callback ────┴──────────► systemctl facade
//!                      endpoint
//! ```

pub mod commands;
pub mod config;
pub mod handler;
pub mod keyboards;
pub mod session;
pub mod status;
pub mod systemctl;
pub mod telegram;

pub use commands::{Command, ServiceAction};
pub use config::{Config, ConfigError};
pub use handler::{handle_command, resolve_callback, AppContext, CallbackOutcome, Reply};
pub use keyboards::CallbackAction;
pub use session::{Session, SessionState, SessionStore};
pub use systemctl::{ServiceControl, Systemctl};
