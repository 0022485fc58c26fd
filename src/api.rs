//! Blocking client for the portal REST API.
//!
//! List-shaped fetches (faculties, departments) degrade to an empty
//! vector on any failure after logging; callers must treat "empty" as
//! "unknown", not "confirmed zero". Everything else surfaces a typed
//! [`ApiError`] so controllers can pick the right user-facing message.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Default API origin. Pages hardcode this; `profile.select` may
/// override it (the integration-test seam).
pub const DEFAULT_API_BASE: &str = "https://school-management-api-zeta-two.vercel.app/api";

/// Fixed timeout applied to list fetches.
const LIST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-success HTTP status outside the 401/403 pair.
    #[error("request failed with status {status}")]
    Status {
        status: u16,
        server_message: Option<String>,
    },
    /// 401 or 403. `must_change_password` is set when the response body
    /// carries the marker; that case must not force a logout.
    #[error("unauthorized (status {status})")]
    Unauthorized {
        status: u16,
        must_change_password: bool,
        server_message: Option<String>,
    },
    /// Success status but the body did not parse as JSON.
    #[error("invalid JSON in response body")]
    InvalidBody,
    /// Transport-level failure: DNS, refused connection, timeout.
    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),
}

impl ApiError {
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { server_message, .. } | Self::Unauthorized { server_message, .. } => {
                server_message.as_deref()
            }
            _ => None,
        }
    }

    /// True when the failure was a refused/unreachable connection, as
    /// opposed to a timeout or mid-stream error.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect())
    }
}

/// Course entry as served by the departments endpoints. The `type`
/// label is carried but the accordion renders names only.
#[derive(Debug, Clone, Deserialize)]
pub struct Course {
    pub name: String,
    #[allow(dead_code)]
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Department {
    pub name: String,
    #[serde(default, rename = "_id")]
    pub remote_id: Option<String>,
    #[serde(default)]
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Faculty {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, rename = "_id")]
    pub remote_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

impl Faculty {
    /// Persistence id preferred, plain id as fallback.
    pub fn key(&self) -> Option<&str> {
        self.remote_id.as_deref().or(self.id.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    #[serde(default)]
    pub total_students: Option<i64>,
    #[serde(default)]
    pub active_courses: Option<i64>,
    #[serde(default)]
    pub pending_applications: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub last_login: Option<String>,
}

/// Student record in the shape the dashboard endpoints serve. Field
/// casing drifted over API versions (`Firstname` vs `firstName`), and
/// age/studentId arrive as either numbers or strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub student_id: Option<Value>,
    #[serde(default, alias = "Firstname")]
    pub first_name: Option<String>,
    #[serde(default, alias = "Lastname")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub age: Option<Value>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

pub struct RemoteApi {
    base: String,
    http: Client,
    // Connectivity of the most recent list fetch / probe, for api.status.
    connected: Mutex<Option<bool>>,
    last_error: Mutex<Option<String>>,
    // Written at most once per daemon lifetime barring an explicit clear.
    faculties: Mutex<Option<Vec<Faculty>>>,
    departments: Mutex<Option<Vec<Department>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RemoteApi {
    pub fn new(base: &str) -> anyhow::Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            http,
            connected: Mutex::new(None),
            last_error: Mutex::new(None),
            faculties: Mutex::new(None),
            departments: Mutex::new(None),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn execute(&self, req: RequestBuilder, token: Option<&str>) -> Result<Value, ApiError> {
        let req = match token {
            Some(t) => req.bearer_auth(t),
            None => req,
        };
        let resp = req.send().map_err(ApiError::Transport)?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = resp.json::<Value>().ok();
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
                must_change_password: body
                    .as_ref()
                    .and_then(|b| b.get("mustChangePassword"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                server_message: extract_message(body.as_ref()),
            });
        }
        if !status.is_success() {
            let body = resp.json::<Value>().ok();
            return Err(ApiError::Status {
                status: status.as_u16(),
                server_message: extract_message(body.as_ref()),
            });
        }
        resp.json::<Value>().map_err(|e| {
            if e.is_decode() {
                ApiError::InvalidBody
            } else {
                ApiError::Transport(e)
            }
        })
    }

    pub fn get_json(&self, path: &str, token: Option<&str>) -> Result<Value, ApiError> {
        self.execute(self.http.get(self.url(path)), token)
    }

    pub fn post_json(
        &self,
        path: &str,
        body: &Value,
        token: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.execute(self.http.post(self.url(path)).json(body), token)
    }

    pub fn put_json(
        &self,
        path: &str,
        body: &Value,
        token: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.execute(self.http.put(self.url(path)).json(body), token)
    }

    /// POST where only the status matters: a success response with an
    /// unparseable body still counts as success (the contact endpoint is
    /// consumed this way).
    pub fn post_expect_ok(&self, path: &str, body: &Value) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .map_err(ApiError::Transport)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.json::<Value>().ok();
        Err(ApiError::Status {
            status: status.as_u16(),
            server_message: extract_message(body.as_ref()),
        })
    }

    fn list_request(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        let resp = self
            .http
            .get(self.url(path))
            .query(query)
            .timeout(LIST_TIMEOUT)
            .send()
            .map_err(ApiError::Transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                server_message: None,
            });
        }
        resp.json::<Value>().map_err(|_| ApiError::InvalidBody)
    }

    /// All faculties. Cached for the daemon lifetime (a successful empty
    /// list is cached too); any failure degrades to an empty vector.
    pub fn fetch_faculties(&self) -> Vec<Faculty> {
        if let Some(cached) = lock(&self.faculties).as_ref() {
            return cached.clone();
        }
        match self
            .list_request("/faculties", &[])
            .and_then(|v| parse_wrapped_list(v, "faculties"))
        {
            Ok(list) => {
                self.note_success();
                debug!(count = list.len(), "faculties fetched");
                *lock(&self.faculties) = Some(list.clone());
                list
            }
            Err(e) => {
                self.note_failure(&e);
                warn!(error = %e, base = %self.base, "faculties fetch failed; treating as unavailable");
                Vec::new()
            }
        }
    }

    /// All departments, optionally filtered by faculty id. Only the
    /// unfiltered sequence is cached.
    pub fn fetch_departments(&self, faculty_id: Option<&str>) -> Vec<Department> {
        if faculty_id.is_none() {
            if let Some(cached) = lock(&self.departments).as_ref() {
                return cached.clone();
            }
        }
        let query: Vec<(&str, &str)> = match faculty_id {
            Some(id) => vec![("facultyId", id)],
            None => Vec::new(),
        };
        match self
            .list_request("/departments", &query)
            .and_then(|v| parse_wrapped_list(v, "departments"))
        {
            Ok(list) => {
                self.note_success();
                if faculty_id.is_none() {
                    *lock(&self.departments) = Some(list.clone());
                }
                list
            }
            Err(e) => {
                self.note_failure(&e);
                warn!(error = %e, base = %self.base, "departments fetch failed; treating as unavailable");
                Vec::new()
            }
        }
    }

    /// Departments nested under one faculty. The endpoint's envelope
    /// drifted across API versions; accept all three observed shapes.
    pub fn faculty_departments(&self, faculty_key: &str) -> Vec<Department> {
        let path = format!("/faculties/{faculty_key}/departments");
        let body = match self.list_request(&path, &[]) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, faculty = faculty_key, "faculty departments fetch failed");
                return Vec::new();
            }
        };
        let nested = body
            .get("faculty")
            .and_then(|f| f.get("departments"))
            .or_else(|| body.get("departments"))
            .cloned()
            .unwrap_or(body);
        match serde_json::from_value::<Vec<Department>>(nested) {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, faculty = faculty_key, "unexpected departments payload shape");
                Vec::new()
            }
        }
    }

    /// Department search by free-text query, optionally scoped to one
    /// faculty. Empty on failure, like the other list fetches.
    pub fn search_departments(&self, query: &str, faculty_id: Option<&str>) -> Vec<Department> {
        let mut params = vec![("q", query)];
        if let Some(id) = faculty_id {
            params.push(("facultyId", id));
        }
        match self
            .list_request("/departments/search", &params)
            .and_then(|v| parse_wrapped_list(v, "departments"))
        {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, query, "department search failed");
                Vec::new()
            }
        }
    }

    pub fn student_count(&self) -> Result<i64, ApiError> {
        let body = self.get_json("/students/student-count", None)?;
        body.get("totalStudents")
            .and_then(Value::as_i64)
            .ok_or(ApiError::InvalidBody)
    }

    /// One-shot connectivity check against the faculties endpoint.
    pub fn probe(&self) -> Value {
        match self.list_request("/faculties", &[]) {
            Ok(_) => {
                self.note_success();
                json!({ "status": true, "message": "API is accessible" })
            }
            Err(e) => {
                self.note_failure(&e);
                match e {
                    ApiError::Status { status, .. } => json!({
                        "status": false,
                        "statusCode": status,
                        "message": format!("API returned error: {status}"),
                    }),
                    other => json!({
                        "status": false,
                        "message": format!("Cannot connect to API: {other}"),
                    }),
                }
            }
        }
    }

    /// Diagnostic snapshot: base URL, last-attempt connectivity, cache
    /// occupancy.
    pub fn status(&self) -> Value {
        let faculties = lock(&self.faculties);
        let departments = lock(&self.departments);
        json!({
            "apiBase": self.base,
            "connected": *lock(&self.connected),
            "error": *lock(&self.last_error),
            "faculties": {
                "cached": faculties.is_some(),
                "count": faculties.as_ref().map_or(0, Vec::len),
            },
            "departments": {
                "cached": departments.is_some(),
                "count": departments.as_ref().map_or(0, Vec::len),
            },
        })
    }

    pub fn clear_caches(&self) {
        *lock(&self.faculties) = None;
        *lock(&self.departments) = None;
    }

    fn note_success(&self) {
        *lock(&self.connected) = Some(true);
        *lock(&self.last_error) = None;
    }

    fn note_failure(&self, e: &ApiError) {
        *lock(&self.connected) = Some(false);
        *lock(&self.last_error) = Some(e.to_string());
    }
}

fn extract_message(body: Option<&Value>) -> Option<String> {
    body.and_then(|b| b.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Lists arrive either wrapped (`{"faculties": [...]}`) or bare.
fn parse_wrapped_list<T: serde::de::DeserializeOwned>(
    body: Value,
    key: &str,
) -> Result<Vec<T>, ApiError> {
    let list = match body.get(key) {
        Some(inner) => inner.clone(),
        None => body,
    };
    serde_json::from_value(list).map_err(|_| ApiError::InvalidBody)
}
