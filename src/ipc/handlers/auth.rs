use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::ApiError;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required_str, get_trimmed_field, require_session, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::session::{keys, Role};

/// Delay before the shell navigates to the dashboard, so the success
/// message is visible. Returned as data; the daemon never sleeps.
const REDIRECT_DELAY_MS: u64 = 800;

const LOGIN_PAGE: &str = "login.html";

fn parse_role(params: &Value) -> Result<Role, HandlerErr> {
    let raw = get_required_str(params, "role")?;
    Role::parse(&raw).ok_or_else(|| {
        HandlerErr::validation("Invalid role selected. Please refresh and try again.")
    })
}

fn login(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let role = parse_role(&req.params)?;
    let email = get_trimmed_field(
        &req.params,
        "email",
        "Please enter both email and password.",
    )?;
    let password = get_trimmed_field(
        &req.params,
        "password",
        "Please enter both email and password.",
    )?;
    let session = require_session(state)?;

    let endpoint = format!("{}/login", role.api_prefix());
    let body = match state
        .api
        .post_json(&endpoint, &json!({ "email": email, "password": password }), None)
    {
        Ok(body) => body,
        // A rejected login is an ordinary HTTP error here, 401 included:
        // nothing is stored and the server's message wins.
        Err(e @ (ApiError::Status { .. } | ApiError::Unauthorized { .. })) => {
            warn!(role = role.as_str(), error = %e, "login rejected");
            let message = match (e.server_message(), &e) {
                (Some(m), _) => m.to_string(),
                (None, ApiError::Status { status, .. })
                | (None, ApiError::Unauthorized { status, .. }) => {
                    format!("Login failed: {status}")
                }
                _ => "Login failed.".to_string(),
            };
            return Err(HandlerErr::new("http_error", message));
        }
        Err(ApiError::InvalidBody) => {
            return Err(HandlerErr::new(
                "bad_response",
                "Invalid response from server. Please try again.",
            ));
        }
        Err(e) => {
            warn!(role = role.as_str(), error = %e, "login transport failure");
            let message = if e.is_connect() {
                "Unable to connect to server. Please check if the backend API is running."
            } else {
                "Network error. Please check your connection and try again."
            };
            return Err(HandlerErr::new("network", message));
        }
    };

    let Some(token) = body.get("token").and_then(Value::as_str) else {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Login failed. No authentication token received.");
        return Err(HandlerErr::new("http_error", message.to_string()));
    };

    store_credentials(session, role, &email, token, &body)
        .map_err(|e| HandlerErr::new("session_error", format!("{e:?}")))?;
    info!(role = role.as_str(), "login succeeded");

    Ok(json!({
        "message": "Login successful! Redirecting...",
        "redirect": { "url": role.dashboard_page(), "delayMs": REDIRECT_DELAY_MS },
    }))
}

fn store_credentials(
    session: &crate::session::SessionStore,
    role: Role,
    email: &str,
    token: &str,
    body: &Value,
) -> anyhow::Result<()> {
    session.set(keys::TOKEN, token)?;
    session.set(keys::USER_ROLE, role.as_str())?;
    session.set(keys::USER_EMAIL, email)?;
    if let Some(user) = body.get("user") {
        session.set(keys::USER_DATA, &user.to_string())?;
    }
    match role {
        Role::Staff => {
            session.set(keys::STAFF_TOKEN, token)?;
            if let Some(staff) = body.get("staff") {
                session.set(keys::STAFF_DATA, &staff.to_string())?;
            }
        }
        Role::Admin => session.set(keys::ADMIN_TOKEN, token)?,
        Role::Student => {}
    }
    Ok(())
}

/// Report whether a token + role pair is present, without touching the
/// network. The login page uses this to skip itself.
fn session_status(state: &AppState) -> Result<Value, HandlerErr> {
    let session = require_session(state)?;
    let pair = session
        .auth_pair()
        .map_err(|e| HandlerErr::new("session_error", format!("{e:?}")))?;
    Ok(match pair {
        Some((_, role)) => json!({
            "authenticated": true,
            "role": role.as_str(),
            "dashboard": role.dashboard_page(),
        }),
        None => json!({ "authenticated": false }),
    })
}

fn logout(state: &AppState) -> Result<Value, HandlerErr> {
    let session = require_session(state)?;
    session
        .clear_auth()
        .map_err(|e| HandlerErr::new("session_error", format!("{e:?}")))?;
    Ok(json!({ "redirect": { "url": LOGIN_PAGE } }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let handled = match req.method.as_str() {
        "auth.login" => login(state, req),
        "auth.session" => session_status(state),
        "auth.logout" => logout(state),
        _ => return None,
    };
    Some(match handled {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    })
}
