//! Persisted client-side session state.
//!
//! The browser build kept all of this in localStorage; the sidecar keeps
//! the same keys in a small SQLite table under the selected profile
//! directory. One row per key, last write wins.

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

/// Session keys, named exactly as the web pages named them.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const USER_ROLE: &str = "userRole";
    pub const USER_EMAIL: &str = "userEmail";
    pub const USER_DATA: &str = "userData";
    pub const STAFF_TOKEN: &str = "staffToken";
    pub const STAFF_DATA: &str = "staffData";
    pub const ADMIN_TOKEN: &str = "adminToken";
    pub const RESET_STUDENT_ID: &str = "resetStudentId";
    pub const REGISTRATION_SUCCESS: &str = "registrationSuccess";
    pub const REGISTERED_EMAIL: &str = "registeredEmail";
}

/// Keys removed by a forced or explicit logout.
pub const AUTH_KEYS: &[&str] = &[
    keys::TOKEN,
    keys::USER_ROLE,
    keys::USER_EMAIL,
    keys::USER_DATA,
    keys::STAFF_TOKEN,
    keys::STAFF_DATA,
    keys::ADMIN_TOKEN,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Admin,
    Staff,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "admin" => Some(Self::Admin),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
            Self::Staff => "staff",
        }
    }

    /// Path prefix the API mounts this role's router under.
    pub fn api_prefix(self) -> &'static str {
        match self {
            Self::Student => "/students",
            Self::Admin => "/admin",
            Self::Staff => "/staff",
        }
    }

    pub fn dashboard_page(self) -> &'static str {
        match self {
            Self::Student => "student_dashboard.html",
            Self::Admin => "admin_dashboard.html",
            Self::Staff => "staff_dashboard.html",
        }
    }
}

pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Open (creating if needed) the session database under `profile`.
    pub fn open(profile: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(profile)?;
        let conn = Connection::open(profile.join("portal-session.sqlite3"))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS session_kv(
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM session_kv WHERE key = ?", [key], |r| {
                r.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT INTO session_kv(key, value, updated_at) VALUES(?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            rusqlite::params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.conn
            .execute("DELETE FROM session_kv WHERE key = ?", [key])?;
        Ok(())
    }

    /// Read-and-clear, for one-shot markers like `registrationSuccess`.
    pub fn take(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value = self.get(key)?;
        if value.is_some() {
            self.remove(key)?;
        }
        Ok(value)
    }

    /// Remove every auth-related key. Used by logout and by forced
    /// 401/403 handling.
    pub fn clear_auth(&self) -> anyhow::Result<()> {
        for key in AUTH_KEYS {
            self.remove(key)?;
        }
        Ok(())
    }

    /// Current token + role pair, if both are present.
    pub fn auth_pair(&self) -> anyhow::Result<Option<(String, Role)>> {
        let token = self.get(keys::TOKEN)?;
        let role = self
            .get(keys::USER_ROLE)?
            .as_deref()
            .and_then(Role::parse);
        Ok(match (token, role) {
            (Some(t), Some(r)) => Some((t, r)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_profile(prefix: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ))
    }

    #[test]
    fn set_get_overwrite_remove() {
        let dir = temp_profile("portal-session");
        let store = SessionStore::open(&dir).expect("open store");

        assert_eq!(store.get(keys::TOKEN).expect("get"), None);
        store.set(keys::TOKEN, "t1").expect("set");
        assert_eq!(store.get(keys::TOKEN).expect("get"), Some("t1".into()));
        store.set(keys::TOKEN, "t2").expect("overwrite");
        assert_eq!(store.get(keys::TOKEN).expect("get"), Some("t2".into()));
        store.remove(keys::TOKEN).expect("remove");
        assert_eq!(store.get(keys::TOKEN).expect("get"), None);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn take_is_one_shot() {
        let dir = temp_profile("portal-session-take");
        let store = SessionStore::open(&dir).expect("open store");

        store
            .set(keys::REGISTERED_EMAIL, "a@b.com")
            .expect("set marker");
        assert_eq!(
            store.take(keys::REGISTERED_EMAIL).expect("take"),
            Some("a@b.com".into())
        );
        assert_eq!(store.take(keys::REGISTERED_EMAIL).expect("take again"), None);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn clear_auth_spares_flow_markers() {
        let dir = temp_profile("portal-session-auth");
        let store = SessionStore::open(&dir).expect("open store");

        store.set(keys::TOKEN, "t").expect("token");
        store.set(keys::USER_ROLE, "staff").expect("role");
        store.set(keys::STAFF_TOKEN, "t").expect("staff token");
        store.set(keys::RESET_STUDENT_ID, "s-1").expect("reset id");
        store.clear_auth().expect("clear");

        assert_eq!(store.get(keys::TOKEN).expect("get"), None);
        assert_eq!(store.get(keys::STAFF_TOKEN).expect("get"), None);
        assert_eq!(
            store.get(keys::RESET_STUDENT_ID).expect("get"),
            Some("s-1".into())
        );

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn auth_pair_requires_both_keys() {
        let dir = temp_profile("portal-session-pair");
        let store = SessionStore::open(&dir).expect("open store");

        assert!(store.auth_pair().expect("pair").is_none());
        store.set(keys::TOKEN, "t").expect("token");
        assert!(store.auth_pair().expect("pair").is_none());
        store.set(keys::USER_ROLE, "admin").expect("role");
        assert_eq!(
            store.auth_pair().expect("pair"),
            Some(("t".into(), Role::Admin))
        );

        let _ = std::fs::remove_dir_all(dir);
    }
}
