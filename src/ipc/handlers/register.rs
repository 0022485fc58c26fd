use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::ApiError;
use crate::ipc::error::ok;
use crate::ipc::helpers::{
    get_optional_str, get_trimmed_field, is_valid_email, require_session, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::session::keys;

const LOGIN_PAGE: &str = "login.html";

/// Delay before the shell leaves the registration page; covers the
/// success animation the page plays first.
const SUCCESS_REDIRECT_DELAY_MS: u64 = 3000;

/// Password strength: how many of the five requirements hold. The form
/// accepts four or better.
fn strength_score(password: &str) -> usize {
    let mut score = 0;
    if password.len() >= 8 {
        score += 1;
    }
    if password.chars().any(|c| c.is_ascii_lowercase()) {
        score += 1;
    }
    if password.chars().any(|c| c.is_ascii_uppercase()) {
        score += 1;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        score += 1;
    }
    if password.chars().any(|c| "!@#$%^&*(),.?\":{}|<>".contains(c)) {
        score += 1;
    }
    score
}

fn is_strong_password(password: &str) -> bool {
    strength_score(password) >= 4
}

fn network_message(e: &ApiError) -> &'static str {
    if e.is_connect() {
        "Unable to connect to server. Please check if the backend API is running."
    } else {
        "Network error. Please check your connection and try again."
    }
}

fn student_register(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let params = &req.params;
    let student_id = get_trimmed_field(params, "studentId", "Student ID is required to register.")?;
    let first_name = get_trimmed_field(params, "firstName", "First Name is required")?;
    let last_name = get_trimmed_field(params, "lastName", "Last Name is required")?;
    let email = get_trimmed_field(params, "email", "Email is required")?;
    let age = get_trimmed_field(params, "age", "Age is required")?;
    let phone = get_trimmed_field(params, "phone", "Phone is required")?;
    let password = get_trimmed_field(params, "password", "Password is required")?;
    let confirm = get_trimmed_field(params, "confirmPassword", "Please confirm your password")?;

    if !is_valid_email(&email) {
        return Err(HandlerErr::validation("Please enter a valid email address"));
    }
    match age.parse::<i64>() {
        Ok(n) if (1..=150).contains(&n) => {}
        _ => return Err(HandlerErr::validation("Please enter a valid age")),
    }
    if !params
        .get("privacyAccepted")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        return Err(HandlerErr::validation(
            "You must accept the privacy policy to register.",
        ));
    }
    if !is_strong_password(&password) {
        return Err(HandlerErr::validation(
            "Please create a stronger password that meets all requirements.",
        ));
    }
    if password != confirm {
        return Err(HandlerErr::validation(
            "Passwords do not match. Please try again.",
        ));
    }

    let session = require_session(state)?;
    let body = json!({
        "studentId": student_id,
        "Firstname": first_name,
        "Lastname": last_name,
        "email": email,
        "age": age,
        "phone": phone,
        "password": password,
        "confirmpassword": confirm,
    });
    match state.api.post_json("/students/register", &body, None) {
        Ok(_) => {
            // One-shot markers the login page consumes to pre-fill the
            // email field.
            session
                .set(keys::REGISTRATION_SUCCESS, "true")
                .and_then(|()| session.set(keys::REGISTERED_EMAIL, &email))
                .map_err(|e| HandlerErr::new("session_error", format!("{e:?}")))?;
            info!("student registration accepted");
            Ok(json!({
                "message": "Registration successful! Please login with your credentials.",
                "redirect": { "url": LOGIN_PAGE, "delayMs": SUCCESS_REDIRECT_DELAY_MS },
            }))
        }
        Err(e @ (ApiError::Status { .. } | ApiError::Unauthorized { .. })) => {
            warn!(error = %e, "registration rejected");
            Err(HandlerErr::new(
                "http_error",
                e.server_message()
                    .unwrap_or("Registration failed. Please try again.")
                    .to_string(),
            ))
        }
        Err(ApiError::InvalidBody) => Err(HandlerErr::new(
            "bad_response",
            "Invalid response from server. Please try again.",
        )),
        Err(e) => {
            warn!(error = %e, "registration transport failure");
            Err(HandlerErr::new("network", network_message(&e)))
        }
    }
}

/// Start the password-recovery flow: the server emails an OTP.
fn request_otp(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let email = get_trimmed_field(&req.params, "email", "Email is required")?;
    match state
        .api
        .post_json("/students/forget-password", &json!({ "email": email }), None)
    {
        Ok(_) => Ok(json!({
            "message": "OTP sent to your email! Please check your inbox.",
        })),
        Err(e) => Err(recovery_error(e, "Failed to send OTP")),
    }
}

fn verify_otp(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let otp = get_trimmed_field(&req.params, "otp", "OTP is required")?;
    let session = require_session(state)?;
    match state
        .api
        .post_json("/students/verify-otp", &json!({ "otp": otp }), None)
    {
        Ok(body) => {
            let student_id = body
                .get("studentId")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| body.get("studentId").and_then(Value::as_i64).map(|n| n.to_string()));
            let Some(student_id) = student_id else {
                return Err(HandlerErr::new(
                    "bad_response",
                    "Invalid response from server. Please try again.",
                ));
            };
            session
                .set(keys::RESET_STUDENT_ID, &student_id)
                .map_err(|e| HandlerErr::new("session_error", format!("{e:?}")))?;
            Ok(json!({
                "message": "OTP verified successfully! You can now reset your password.",
            }))
        }
        Err(e) => Err(recovery_error(e, "Invalid OTP")),
    }
}

fn reset_password(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let password = get_trimmed_field(&req.params, "password", "Both password fields are required")?;
    let confirm = get_trimmed_field(
        &req.params,
        "confirmPassword",
        "Both password fields are required",
    )?;
    if password != confirm {
        return Err(HandlerErr::validation("Passwords do not match"));
    }
    if password.len() < 6 {
        return Err(HandlerErr::validation(
            "Password must be at least 6 characters long",
        ));
    }

    let session = require_session(state)?;
    let Some(student_id) = session
        .get(keys::RESET_STUDENT_ID)
        .map_err(|e| HandlerErr::new("session_error", format!("{e:?}")))?
    else {
        return Err(HandlerErr::validation(
            "Password reset session expired. Please start over.",
        ));
    };

    let body = json!({ "newPassword": password, "confirmedPassword": confirm });
    match state
        .api
        .put_json(&format!("/students/reset-password/{student_id}"), &body, None)
    {
        Ok(_) => {
            session
                .remove(keys::RESET_STUDENT_ID)
                .map_err(|e| HandlerErr::new("session_error", format!("{e:?}")))?;
            Ok(json!({
                "message": "Password reset successfully! You can now login with your new password.",
                "redirect": { "url": LOGIN_PAGE },
            }))
        }
        Err(e) => Err(recovery_error(e, "Password reset failed")),
    }
}

fn recovery_error(e: ApiError, fallback: &str) -> HandlerErr {
    match e {
        e @ (ApiError::Status { .. } | ApiError::Unauthorized { .. }) => HandlerErr::new(
            "http_error",
            e.server_message().unwrap_or(fallback).to_string(),
        ),
        ApiError::InvalidBody => HandlerErr::new(
            "bad_response",
            "Invalid response from server. Please try again.",
        ),
        e => {
            warn!(error = %e, "recovery flow transport failure");
            HandlerErr::new("network", network_message(&e))
        }
    }
}

/// One-shot prefill for the login page after a successful registration.
fn prefill(state: &AppState) -> Result<Value, HandlerErr> {
    let session = require_session(state)?;
    let success = session
        .take(keys::REGISTRATION_SUCCESS)
        .map_err(|e| HandlerErr::new("session_error", format!("{e:?}")))?;
    if success.as_deref() != Some("true") {
        return Ok(json!({ "email": Value::Null }));
    }
    let email = session
        .take(keys::REGISTERED_EMAIL)
        .map_err(|e| HandlerErr::new("session_error", format!("{e:?}")))?;
    Ok(json!({ "email": email }))
}

/// Faculty options for the application form dropdown.
fn faculty_options(state: &AppState) -> Result<Value, HandlerErr> {
    let options: Vec<Value> = state
        .api
        .fetch_faculties()
        .into_iter()
        .map(|f| {
            let label = match &f.icon {
                Some(icon) => format!("{icon} {}", f.name),
                None => f.name.clone(),
            };
            json!({ "value": f.key(), "label": label })
        })
        .collect();
    Ok(json!({ "options": options }))
}

/// Department options for the dropdown chained to a faculty selection.
fn department_options(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let faculty_id = get_optional_str(&req.params, "facultyId");
    if faculty_id.is_none() {
        // No faculty picked yet: the department select stays disabled.
        return Ok(json!({ "options": [], "enabled": false }));
    }
    let options: Vec<Value> = state
        .api
        .fetch_departments(faculty_id.as_deref())
        .into_iter()
        .map(|d| json!({ "value": d.remote_id, "label": d.name }))
        .collect();
    Ok(json!({ "options": options, "enabled": true }))
}

fn search_departments(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let query = get_trimmed_field(&req.params, "q", "Search query is required")?;
    let faculty_id = get_optional_str(&req.params, "facultyId");
    let matches: Vec<Value> = state
        .api
        .search_departments(&query, faculty_id.as_deref())
        .into_iter()
        .map(|d| json!({ "value": d.remote_id, "label": d.name }))
        .collect();
    Ok(json!({ "departments": matches }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let handled = match req.method.as_str() {
        "register.student" => student_register(state, req),
        "register.requestOtp" => request_otp(state, req),
        "register.verifyOtp" => verify_otp(state, req),
        "register.resetPassword" => reset_password(state, req),
        "register.prefill" => prefill(state),
        "register.facultyOptions" => faculty_options(state),
        "register.departmentOptions" => department_options(state, req),
        "register.searchDepartments" => search_departments(state, req),
        _ => return None,
    };
    Some(match handled {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strength_counts_requirements() {
        assert_eq!(strength_score(""), 0);
        assert_eq!(strength_score("abc"), 1); // lowercase only
        assert_eq!(strength_score("Abc12345"), 4); // length, lower, upper, digit
        assert_eq!(strength_score("Abc123!@"), 5);
    }

    #[test]
    fn four_of_five_requirements_pass() {
        assert!(is_strong_password("Abc12345"));
        assert!(is_strong_password("abc123!@")); // no uppercase, still 4
        assert!(!is_strong_password("abc12345")); // lower + digit + length = 3
        assert!(!is_strong_password("passw0rd")); // lower + digit + length = 3
    }
}
