//! User-visible notices emitted at operation boundaries.

use std::sync::Mutex;

use tracing::{info, warn};

use crate::error::PanelError;
use crate::models::Role;
use crate::session::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
    /// The role's session is gone; the caller should send the user to login.
    LoginRequired(Role),
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    fn success(&self, message: &str) {
        self.notify(Notice::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.notify(Notice::Error(message.to_string()));
    }
}

/// Sends notices to the tracing subscriber only.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Success(msg) => info!(notice = "success", "{msg}"),
            Notice::Error(msg) => warn!(notice = "error", "{msg}"),
            Notice::LoginRequired(role) => warn!(notice = "login_required", role = role.as_str()),
        }
    }
}

/// Prints notices for the CLI.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Success(msg) => println!("✅ {msg}"),
            Notice::Error(msg) => eprintln!("❌ {msg}"),
            Notice::LoginRequired(role) => {
                eprintln!("🔑 Run `docspot-panel login --role {}` to continue.", role.as_str())
            }
        }
    }
}

/// Keeps every notice in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|n| match n {
                Notice::Error(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    pub fn login_required(&self) -> bool {
        self.notices().iter().any(|n| matches!(n, Notice::LoginRequired(_)))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(notice);
    }
}

/// Operation boundary for failures: authorization errors clear the session
/// and signal a redirect, everything becomes an error notice.
pub(crate) fn report_failure(
    session: &SessionStore,
    notifier: &dyn Notifier,
    operation: &str,
    err: &PanelError,
    fallback: &str,
) {
    warn!(operation, role = session.role().as_str(), kind = ?err.kind(), error = %err, "operation failed");
    if err.is_authorization() {
        if let Err(clear_err) = session.clear() {
            warn!(error = %clear_err, "could not clear expired session");
        }
        notifier.notify(Notice::LoginRequired(session.role()));
    }
    notifier.error(&err.user_message(fallback));
}
