use std::path::PathBuf;

use serde::Deserialize;

use crate::api::RemoteApi;
use crate::session::SessionStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub profile: Option<PathBuf>,
    pub session: Option<SessionStore>,
    pub api: RemoteApi,
}
