use std::path::PathBuf;

use serde_json::json;
use tracing::info;

use crate::api::RemoteApi;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::get_optional_str;
use crate::ipc::types::{AppState, Request};
use crate::session::SessionStore;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "profilePath": state.profile.as_ref().map(|p| p.to_string_lossy().to_string()),
            "apiBase": state.api.base(),
        }),
    )
}

fn handle_profile_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = path else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    // Optional origin override; default stays the hardcoded one.
    if let Some(base) = get_optional_str(&req.params, "apiBase") {
        match RemoteApi::new(&base) {
            Ok(api) => state.api = api,
            Err(e) => return err(&req.id, "api_init_failed", format!("{e:?}"), None),
        }
    }

    match SessionStore::open(&path) {
        Ok(store) => {
            info!(profile = %path.display(), "profile selected");
            state.profile = Some(path.clone());
            state.session = Some(store);
            ok(&req.id, json!({ "profilePath": path.to_string_lossy() }))
        }
        Err(e) => err(&req.id, "profile_open_failed", format!("{e:?}"), None),
    }
}

fn handle_api_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, state.api.status())
}

fn handle_api_probe(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, state.api.probe())
}

fn handle_api_clear_caches(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.api.clear_caches();
    ok(&req.id, json!({ "cleared": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "profile.select" => Some(handle_profile_select(state, req)),
        "api.status" => Some(handle_api_status(state, req)),
        "api.probe" => Some(handle_api_probe(state, req)),
        "api.clearCaches" => Some(handle_api_clear_caches(state, req)),
        _ => None,
    }
}
