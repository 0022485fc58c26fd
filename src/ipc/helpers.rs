use serde_json::Value;

use crate::ipc::error::err;
use crate::ipc::types::AppState;
use crate::session::SessionStore;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Form-validation failure: surfaced inline, never preceded by a
    /// network call.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation", message)
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

pub fn get_optional_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Required field in the user-facing sense: present but blank is a
/// validation error with the given message, not a protocol error.
pub fn get_trimmed_field(params: &Value, key: &str, blank_message: &str) -> Result<String, HandlerErr> {
    let value = params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .unwrap_or("");
    if value.is_empty() {
        return Err(HandlerErr::validation(blank_message));
    }
    Ok(value.to_string())
}

pub fn require_session(state: &AppState) -> Result<&SessionStore, HandlerErr> {
    state
        .session
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_profile", "select a profile first"))
}

/// Minimal email shape check, matching the page-side rule: one `@`,
/// non-empty local and domain parts, a dot in the domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|part| !part.is_empty())
}
