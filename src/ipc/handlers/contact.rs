use serde_json::json;
use tracing::warn;

use crate::api::ApiError;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_trimmed_field, HandlerErr};
use crate::ipc::types::{AppState, Request};

/// Contact form submission. Validation runs before any network call; a
/// blank field means no request is issued at all. The form is reset only
/// on a success response.
fn submit(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let params = &req.params;
    let name = get_trimmed_field(params, "name", "Please fill in all fields.")?;
    let email = get_trimmed_field(params, "email", "Please fill in all fields.")?;
    let subject = get_trimmed_field(params, "subject", "Please fill in all fields.")?;
    let message = get_trimmed_field(params, "message", "Please fill in all fields.")?;
    // The page-side rule here is deliberately loose: just "looks like an
    // address"; the registration form is the strict one.
    if !email.contains('@') {
        return Err(HandlerErr::validation("Please enter a valid email address."));
    }

    let body = json!({
        "name": name,
        "email": email,
        "subject": subject,
        "message": message,
    });
    match state.api.post_expect_ok("/contact", &body) {
        Ok(()) => Ok(json!({
            "message": "Thank you! Your message has been sent successfully. We will get back to you soon.",
            "resetForm": true,
        })),
        Err(e @ (ApiError::Status { .. } | ApiError::Unauthorized { .. })) => {
            warn!(error = %e, "contact submission rejected");
            Err(HandlerErr::new(
                "http_error",
                e.server_message()
                    .unwrap_or("Failed to send message. Please try again.")
                    .to_string(),
            ))
        }
        Err(e) => {
            warn!(error = %e, "contact submission failed in transit");
            Err(HandlerErr::new(
                "network",
                "An error occurred while sending your message. Please check your connection and try again.",
            ))
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "contact.submit" => Some(match submit(state, req) {
            Ok(result) => ok(&req.id, result),
            Err(e) => e.response(&req.id),
        }),
        _ => None,
    }
}
