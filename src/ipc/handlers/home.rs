use serde_json::json;
use tracing::{error, warn};

use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use crate::programs::{self, StaticCatalog};
use crate::render::{self, PanelState};

fn handle_programs_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    match programs::resolve_programs(&state.api, &StaticCatalog::bundled()) {
        Some(resolution) => ok(
            &req.id,
            json!({
                "source": resolution.source.as_str(),
                "facultyCount": resolution.faculties.len(),
                "markup": render::accordion(&resolution.faculties),
                "panels": PanelState::Ready.flags(),
            }),
        ),
        None => {
            // Live and static paths both came back empty; the page shows
            // the error panel and does not retry on its own.
            error!("program resolution failed on both live and static paths");
            ok(
                &req.id,
                json!({
                    "source": serde_json::Value::Null,
                    "facultyCount": 0,
                    "markup": "",
                    "panels": PanelState::Failed.flags(),
                }),
            )
        }
    }
}

fn handle_student_count(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.api.student_count() {
        Ok(total) => ok(
            &req.id,
            json!({ "totalStudents": total, "display": format!("{total}+") }),
        ),
        Err(e) => {
            // The banner is decorative; a failed count never fails the page.
            warn!(error = %e, "student count fetch failed");
            ok(
                &req.id,
                json!({ "totalStudents": serde_json::Value::Null, "display": "—" }),
            )
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "programs.load" => Some(handle_programs_load(state, req)),
        "home.studentCount" => Some(handle_student_count(state, req)),
        _ => None,
    }
}
