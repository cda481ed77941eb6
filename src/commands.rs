//! Command parsing
//!
//! Maps raw message text to a command by literal prefix matching, in a fixed
//! priority order. `/servicestart` and `/servicestop` carry the rest of the
//! text (trimmed) as the candidate service name.

/// Command tokens
pub const CMD_START: &str = "/start";
pub const CMD_STATUS: &str = "/status";
pub const CMD_HELP: &str = "/help";
pub const CMD_CANCEL: &str = "/cancel";

/// Command tokens for systemctl
pub const CMD_SERVICE_STATUS: &str = "/servicestatus";
pub const CMD_SERVICE_START: &str = "/servicestart";
pub const CMD_SERVICE_STOP: &str = "/servicestop";

/// Canned messages
pub const MSG_DEFAULT: &str = "Input your command:";
pub const MSG_UNKNOWN_COMMAND: &str = "Unknown command.";
pub const MSG_NO_CONTROLLABLE_SERVICES: &str = "No controllable services.";
pub const MSG_SERVICE_TO_START: &str = "Select service to start:";
pub const MSG_SERVICE_TO_STOP: &str = "Select service to stop:";
pub const MSG_CANCEL: &str = "Cancel";
pub const MSG_CANCELED: &str = "Canceled.";

/// A recognized (or not) top-level command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    ServiceStatus,
    /// Start a service; `None` means no selection was made yet.
    ServiceStart(Option<String>),
    /// Stop a service; `None` means no selection was made yet.
    ServiceStop(Option<String>),
    Status,
    Help,
    Cancel,
    /// Anything else, carrying the raw input for the echo reply.
    Unknown(String),
}

/// Which service action a chooser or callback refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
}

impl ServiceAction {
    pub fn token(self) -> &'static str {
        match self {
            Self::Start => CMD_SERVICE_START,
            Self::Stop => CMD_SERVICE_STOP,
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            Self::Start => MSG_SERVICE_TO_START,
            Self::Stop => MSG_SERVICE_TO_STOP,
        }
    }
}

/// Parse message text into a [`Command`].
///
/// Prefixes are checked in priority order so that `/servicestatus` wins over
/// `/status` and the service commands are resolved before their arguments are
/// inspected.
pub fn parse(text: &str) -> Command {
    if text.starts_with(CMD_START) {
        Command::Start
    } else if text.starts_with(CMD_SERVICE_STATUS) {
        Command::ServiceStatus
    } else if text.starts_with(CMD_SERVICE_START) {
        Command::ServiceStart(argument_of(text, CMD_SERVICE_START))
    } else if text.starts_with(CMD_SERVICE_STOP) {
        Command::ServiceStop(argument_of(text, CMD_SERVICE_STOP))
    } else if text.starts_with(CMD_STATUS) {
        Command::Status
    } else if text.starts_with(CMD_HELP) {
        Command::Help
    } else if text.starts_with(CMD_CANCEL) {
        Command::Cancel
    } else {
        Command::Unknown(text.to_string())
    }
}

/// The trimmed remainder after a command prefix, if non-empty.
fn argument_of(text: &str, prefix: &str) -> Option<String> {
    let rest = text[prefix.len()..].trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Help message listing the supported commands.
pub fn help_text() -> String {
    format!(
        "Following commands are supported:\n\
        \n\
        *For Systemctl*\n\
        \n\
        {CMD_SERVICE_STATUS} : show status of each service (systemctl is-active)\n\
        {CMD_SERVICE_START} : start a service (systemctl start)\n\
        {CMD_SERVICE_STOP} : stop a service (systemctl stop)\n\
        \n\
        *Others*\n\
        \n\
        {CMD_STATUS} : show this bot's status\n\
        {CMD_HELP} : show this help message\n"
    )
}
