use std::thread;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::{ApiError, DashboardMetrics, StaffMember, StudentRecord};
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_optional_str, get_required_str, get_trimmed_field, require_session, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::render;
use crate::session::{keys, Role, SessionStore};

const LOGIN_PAGE: &str = "login.html";

fn parse_dashboard_role(params: &Value) -> Result<Role, HandlerErr> {
    let raw = get_required_str(params, "role")?;
    match Role::parse(&raw) {
        Some(role @ (Role::Staff | Role::Admin)) => Ok(role),
        Some(Role::Student) | None => Err(HandlerErr::new(
            "bad_params",
            format!("unsupported dashboard role: {raw}"),
        )),
    }
}

fn forced_logout(session: &SessionStore) -> Value {
    warn!("access denied, redirecting to login");
    if let Err(e) = session.clear_auth() {
        warn!(error = ?e, "failed to clear session during forced logout");
    }
    json!({ "authenticated": false, "redirect": { "url": LOGIN_PAGE } })
}

/// A fetch thread that died renders as that section failing; the others
/// are unaffected.
fn join_fetch(handle: thread::ScopedJoinHandle<'_, Result<Value, ApiError>>) -> Result<Value, ApiError> {
    handle.join().unwrap_or(Err(ApiError::InvalidBody))
}

fn handle_open(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let role = parse_dashboard_role(&req.params)?;
    let session = require_session(state)?;

    let token = session
        .get(keys::TOKEN)
        .map_err(|e| HandlerErr::new("session_error", format!("{e:?}")))?;
    let stored_role = session
        .get(keys::USER_ROLE)
        .map_err(|e| HandlerErr::new("session_error", format!("{e:?}")))?;

    // Missing token always redirects; so does a role mismatch.
    let Some(token) = token else {
        return Ok(forced_logout(session));
    };
    if stored_role.as_deref() != Some(role.as_str()) {
        return Ok(forced_logout(session));
    }

    let prefix = role.api_prefix();
    let api = &state.api;
    let (dash, students, team) = thread::scope(|s| {
        let dash = s.spawn(|| api.get_json(&format!("{prefix}/dashboard"), Some(&token)));
        let students = s.spawn(|| api.get_json(&format!("{prefix}/students"), Some(&token)));
        let team = s.spawn(|| api.get_json(&format!("{prefix}/team"), Some(&token)));
        (join_fetch(dash), join_fetch(students), join_fetch(team))
    });

    // 401/403 on any section forces a logout, unless the server is
    // demanding a password change, which keeps the session alive and
    // opens the prompt instead.
    let mut must_change_password = false;
    let mut unauthorized = false;
    for outcome in [&dash, &students, &team] {
        if let Err(ApiError::Unauthorized {
            must_change_password: must_change,
            ..
        }) = outcome
        {
            if *must_change {
                must_change_password = true;
            } else {
                unauthorized = true;
            }
        }
    }
    if unauthorized && !must_change_password {
        return Ok(forced_logout(session));
    }

    let account = match &dash {
        Ok(body) => {
            if body
                .get("mustChangePassword")
                .and_then(Value::as_bool)
                .unwrap_or(false)
            {
                must_change_password = true;
            }
            let metrics: DashboardMetrics = body
                .get("metrics")
                .cloned()
                .and_then(|m| serde_json::from_value(m).ok())
                .unwrap_or_default();
            let staff: StaffMember = body
                .get("staff")
                .cloned()
                .and_then(|s| serde_json::from_value(s).ok())
                .unwrap_or_default();
            json!({
                "ok": true,
                "metrics": render::metrics_values(&metrics),
                "staffInfo": render::staff_info(&staff),
            })
        }
        Err(e) => {
            warn!(error = %e, "dashboard metrics fetch failed");
            json!({
                "ok": false,
                "metrics": render::metrics_values(&DashboardMetrics::default()),
                "error": "Unable to load account",
            })
        }
    };

    let students_section = match &students {
        Ok(body) => match parse_students(body) {
            Some(rows) => json!({ "ok": true, "markup": render::student_rows(&rows) }),
            None => failed_students_section(),
        },
        Err(e) => {
            warn!(error = %e, "students fetch failed");
            failed_students_section()
        }
    };

    let team_section = match &team {
        Ok(body) => {
            let members: Vec<StaffMember> = body
                .get("staff")
                .cloned()
                .and_then(|s| serde_json::from_value(s).ok())
                .unwrap_or_default();
            json!({ "ok": true, "markup": render::team_list(&members) })
        }
        Err(e) => {
            warn!(error = %e, "team fetch failed");
            json!({ "ok": false, "markup": "<li>Failed to load team members</li>" })
        }
    };

    Ok(json!({
        "authenticated": true,
        "mustChangePassword": must_change_password,
        "sections": {
            "account": account,
            "students": students_section,
            "team": team_section,
        },
    }))
}

fn failed_students_section() -> Value {
    json!({
        "ok": false,
        "markup": "<tr><td colspan=\"7\">Failed to load students</td></tr>",
    })
}

fn parse_students(body: &Value) -> Option<Vec<StudentRecord>> {
    let list = body.get("students").cloned().unwrap_or(Value::Null);
    if list.is_null() {
        return Some(Vec::new());
    }
    serde_json::from_value(list).ok()
}

/// Commit an inline edit of the two editable fields. Numeric-looking
/// ages go up as numbers, anything else as the raw string; the row is
/// reconciled from the server's returned record.
fn handle_student_update(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let id = get_required_str(&req.params, "id")?;
    let age = get_optional_str(&req.params, "age").map(|s| s.trim().to_string());
    let phone = get_optional_str(&req.params, "phone").map(|s| s.trim().to_string());

    let mut patch = serde_json::Map::new();
    if let Some(age) = age.filter(|s| !s.is_empty()) {
        let value = match (age.parse::<i64>(), age.parse::<f64>()) {
            (Ok(n), _) => json!(n),
            (Err(_), Ok(n)) => json!(n),
            _ => json!(age),
        };
        patch.insert("age".to_string(), value);
    }
    if let Some(phone) = phone.filter(|s| !s.is_empty()) {
        patch.insert("phone".to_string(), json!(phone));
    }
    if patch.is_empty() {
        // Nothing to send; the page just drops back to read-only.
        return Ok(json!({ "unchanged": true }));
    }

    let session = require_session(state)?;
    let Some((token, role)) = session
        .auth_pair()
        .map_err(|e| HandlerErr::new("session_error", format!("{e:?}")))?
    else {
        return Ok(forced_logout(session));
    };

    let path = format!("{}/students/{id}", role.api_prefix());
    match state.api.put_json(&path, &Value::Object(patch), Some(&token)) {
        Ok(body) => {
            let student: Option<StudentRecord> = body
                .get("student")
                .cloned()
                .and_then(|s| serde_json::from_value(s).ok());
            let (age_text, phone_text, markup) = match &student {
                Some(s) => (
                    render_loose(&s.age),
                    s.phone.clone().unwrap_or_default(),
                    Some(render::student_row(s)),
                ),
                None => (String::new(), String::new(), None),
            };
            info!(student = %id, "student record updated");
            Ok(json!({
                "age": age_text,
                "phone": phone_text,
                "markup": markup,
            }))
        }
        Err(ApiError::Unauthorized {
            must_change_password: true,
            ..
        }) => Ok(json!({ "mustChangePassword": true })),
        Err(e @ ApiError::Unauthorized { .. }) => {
            warn!(error = %e, "student update unauthorized");
            Ok(forced_logout(session))
        }
        Err(e) => {
            warn!(error = %e, student = %id, "student update failed");
            Err(HandlerErr::new("update_failed", "Failed to update student"))
        }
    }
}

fn render_loose(v: &Option<Value>) -> String {
    match v {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn handle_change_password(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let current = get_trimmed_field(
        &req.params,
        "currentPassword",
        "Current password is required",
    )?;
    let new = get_trimmed_field(&req.params, "newPassword", "New password is required")?;

    let session = require_session(state)?;
    let Some((token, role)) = session
        .auth_pair()
        .map_err(|e| HandlerErr::new("session_error", format!("{e:?}")))?
    else {
        return Ok(forced_logout(session));
    };

    let path = format!("{}/change-password", role.api_prefix());
    let body = json!({ "currentPassword": current, "newPassword": new });
    match state.api.post_json(&path, &body, Some(&token)) {
        Ok(_) => {
            info!(role = role.as_str(), "password changed");
            Ok(json!({ "message": "Password changed successfully!" }))
        }
        Err(e @ (ApiError::Status { .. } | ApiError::Unauthorized { .. })) => {
            warn!(error = %e, "password change rejected");
            Err(HandlerErr::new(
                "http_error",
                e.server_message()
                    .unwrap_or("Failed to change password")
                    .to_string(),
            ))
        }
        Err(e) => {
            warn!(error = %e, "password change transport failure");
            Err(HandlerErr::new(
                "network",
                "Network error. Please check your connection and try again.",
            ))
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let handled = match req.method.as_str() {
        "dashboard.open" => handle_open(state, req),
        "students.update" => handle_student_update(state, req),
        "dashboard.changePassword" => handle_change_password(state, req),
        _ => return None,
    };
    Some(match handled {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    })
}
