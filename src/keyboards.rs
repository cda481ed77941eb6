//! Keyboards and callback payloads
//!
//! Two artifact kinds: the persistent reply keyboard with command shortcuts,
//! and the transient inline chooser attached to a "select service" prompt.
//! Inline buttons carry a [`CallbackAction`] payload; the callback resolver
//! decodes it back, rejecting anything malformed.

use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
};

use crate::commands::{
    ServiceAction, CMD_CANCEL, CMD_HELP, CMD_SERVICE_START, CMD_SERVICE_STATUS, CMD_SERVICE_STOP,
    CMD_STATUS, MSG_CANCEL,
};

/// Action encoded in an inline button's callback data.
///
/// A payload is always fully qualified: either Cancel, or a service action
/// with its service name. There is no "chooser" payload — the chooser itself
/// is a message, not a callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Cancel,
    Start(String),
    Stop(String),
}

impl CallbackAction {
    pub fn for_service(action: ServiceAction, service: &str) -> Self {
        match action {
            ServiceAction::Start => Self::Start(service.to_string()),
            ServiceAction::Stop => Self::Stop(service.to_string()),
        }
    }

    /// Encode as callback data. The wire format is the command token followed
    /// by the service name, so a payload reads like the command it stands for.
    pub fn encode(&self) -> String {
        match self {
            Self::Cancel => CMD_CANCEL.to_string(),
            Self::Start(service) => format!("{CMD_SERVICE_START} {service}"),
            Self::Stop(service) => format!("{CMD_SERVICE_STOP} {service}"),
        }
    }

    /// Decode callback data. Returns `None` for anything that is not an exact
    /// cancel token or a service action with a non-empty name.
    pub fn decode(data: &str) -> Option<Self> {
        if data == CMD_CANCEL {
            return Some(Self::Cancel);
        }
        if let Some(rest) = data.strip_prefix(CMD_SERVICE_START) {
            let service = rest.trim();
            if !rest.starts_with(' ') || service.is_empty() {
                return None;
            }
            return Some(Self::Start(service.to_string()));
        }
        if let Some(rest) = data.strip_prefix(CMD_SERVICE_STOP) {
            let service = rest.trim();
            if !rest.starts_with(' ') || service.is_empty() {
                return None;
            }
            return Some(Self::Stop(service.to_string()));
        }
        None
    }
}

/// Persistent reply keyboard with the command shortcuts, shown below the
/// composer and auto-resized.
pub fn command_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(CMD_SERVICE_STATUS),
            KeyboardButton::new(CMD_SERVICE_START),
            KeyboardButton::new(CMD_SERVICE_STOP),
        ],
        vec![KeyboardButton::new(CMD_STATUS), KeyboardButton::new(CMD_HELP)],
    ])
    .resize_keyboard()
}

/// Inline chooser: one button per controllable service (one per row) plus a
/// trailing Cancel row.
pub fn service_chooser(services: &[String], action: ServiceAction) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = services
        .iter()
        .map(|service| {
            vec![InlineKeyboardButton::callback(
                service.clone(),
                CallbackAction::for_service(action, service).encode(),
            )]
        })
        .collect();

    rows.push(vec![InlineKeyboardButton::callback(
        MSG_CANCEL,
        CallbackAction::Cancel.encode(),
    )]);

    InlineKeyboardMarkup::new(rows)
}
