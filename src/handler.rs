//! Command engine
//!
//! Transport-free core of the bot: [`AppContext`] holds the immutable
//! configuration, the session store and the service-control facade;
//! [`handle_command`] turns message text into a reply and
//! [`resolve_callback`] turns a callback payload into an outcome. The
//! transport endpoints in [`crate::telegram`] do the actual send/edit/answer
//! calls around these.

use std::sync::Arc;
use std::time::Instant;

use teloxide::types::InlineKeyboardMarkup;

use crate::commands::{
    self, help_text, Command, ServiceAction, MSG_CANCELED, MSG_DEFAULT,
    MSG_NO_CONTROLLABLE_SERVICES, MSG_UNKNOWN_COMMAND,
};
use crate::config::Config;
use crate::keyboards::{service_chooser, CallbackAction};
use crate::session::SessionStore;
use crate::status::bot_status;
use crate::systemctl::ServiceControl;

/// Application context, constructed once at startup and shared by the
/// dispatcher endpoints. Replaces process-global state: the whitelist and
/// service set are read-only, the session store carries the only lock.
pub struct AppContext {
    available_ids: Vec<String>,
    controllable_services: Vec<String>,
    pub sessions: SessionStore,
    pub control: Arc<dyn ServiceControl>,
    started_at: Instant,
}

impl AppContext {
    pub fn new(config: &Config, control: Arc<dyn ServiceControl>) -> Self {
        Self {
            available_ids: config.available_ids.clone(),
            controllable_services: config.controllable_services.clone(),
            sessions: SessionStore::new(&config.available_ids),
            control,
            started_at: Instant::now(),
        }
    }

    /// True iff the identity is on the configured whitelist.
    pub fn is_authorized(&self, identity: &str) -> bool {
        self.available_ids.iter().any(|id| id == identity)
    }

    /// True iff the service name exactly matches a configured service.
    pub fn is_controllable(&self, service: &str) -> bool {
        self.controllable_services.iter().any(|s| s == service)
    }

    pub fn controllable_services(&self) -> &[String] {
        &self.controllable_services
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

/// Reply computed for one inbound message. When `keyboard` is `None` the
/// transport attaches the persistent command keyboard instead.
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }
}

/// Outcome of a resolved callback: an optional toast for the callback-query
/// answer and the text the originating message is edited to.
#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    pub toast: Option<String>,
    pub edit_text: String,
}

/// Handle one message's text and compute the reply. Callers hold the session
/// store lock across this, so the facade call inside is serialized.
pub async fn handle_command(ctx: &AppContext, text: &str) -> Reply {
    match commands::parse(text) {
        Command::Start => Reply::text(MSG_DEFAULT),
        Command::ServiceStatus => service_status(ctx).await,
        Command::ServiceStart(candidate) => {
            service_action(ctx, ServiceAction::Start, candidate).await
        }
        Command::ServiceStop(candidate) => {
            service_action(ctx, ServiceAction::Stop, candidate).await
        }
        Command::Status => Reply::text(bot_status(ctx.started_at)),
        Command::Help => Reply::text(help_text()),
        Command::Cancel => Reply::text(MSG_CANCELED),
        Command::Unknown(input) => Reply::text(format!("*{input}*: {MSG_UNKNOWN_COMMAND}")),
    }
}

/// `/servicestatus`: one line per configured service, one facade query total.
async fn service_status(ctx: &AppContext) -> Reply {
    match ctx.control.status(ctx.controllable_services()).await {
        Ok(states) => {
            let mut text = String::new();
            for (service, state) in states {
                text.push_str(&format!("{service}: *{state}*\n"));
            }
            if text.is_empty() {
                text = MSG_NO_CONTROLLABLE_SERVICES.to_string();
            }
            Reply::text(text)
        }
        Err(e) => {
            tracing::error!("Failed to query service status: {}", e);
            Reply::text(e.to_string())
        }
    }
}

/// Two-phase start/stop resolution. Phase 1 (no valid selection): prompt with
/// the chooser keyboard. Phase 2 (selected service): perform the action.
async fn service_action(
    ctx: &AppContext,
    action: ServiceAction,
    candidate: Option<String>,
) -> Reply {
    if ctx.controllable_services().is_empty() {
        return Reply::text(MSG_NO_CONTROLLABLE_SERVICES);
    }

    match candidate.filter(|s| ctx.is_controllable(s)) {
        Some(service) => Reply::text(perform_action(ctx, action, &service).await),
        None => Reply {
            text: action.prompt().to_string(),
            keyboard: Some(service_chooser(ctx.controllable_services(), action)),
        },
    }
}

/// Invoke the facade for a selected service. Success names the service; a
/// failure relays the facade's diagnostic verbatim.
async fn perform_action(ctx: &AppContext, action: ServiceAction, service: &str) -> String {
    let (output, ok) = match action {
        ServiceAction::Start => ctx.control.start(service).await,
        ServiceAction::Stop => ctx.control.stop(service).await,
    };

    if ok {
        match action {
            ServiceAction::Start => format!("Started service: {service}"),
            ServiceAction::Stop => format!("Stopped service: {service}"),
        }
    } else {
        tracing::warn!("systemctl reported failure for {}: {}", service, output);
        output
    }
}

/// Resolve a callback payload. `None` means the payload is rejected: it failed
/// to decode, or names a service outside the controllable set. Callers hold
/// the session store lock across this.
pub async fn resolve_callback(ctx: &AppContext, payload: &str) -> Option<CallbackOutcome> {
    match CallbackAction::decode(payload)? {
        CallbackAction::Cancel => Some(CallbackOutcome {
            toast: None,
            edit_text: MSG_CANCELED.to_string(),
        }),
        CallbackAction::Start(service) => resolve_service(ctx, ServiceAction::Start, service).await,
        CallbackAction::Stop(service) => resolve_service(ctx, ServiceAction::Stop, service).await,
    }
}

async fn resolve_service(
    ctx: &AppContext,
    action: ServiceAction,
    service: String,
) -> Option<CallbackOutcome> {
    if !ctx.is_controllable(&service) {
        tracing::warn!("Callback names uncontrollable service: {}", service);
        return None;
    }

    let text = perform_action(ctx, action, &service).await;
    Some(CallbackOutcome {
        toast: Some(text.clone()),
        edit_text: text,
    })
}
