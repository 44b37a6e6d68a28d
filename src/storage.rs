use std::path::Path;

use sled::Db;

use crate::error::PanelResult;
use crate::models::{LoggedInDoctor, Role};

const ROLE_KEY: &str = "userRole";
const USER_DATA_KEY: &str = "userData";

/// Durable client-side state backed by Sled.
///
/// Holds one opaque token per role plus the summary of the logged-in doctor.
/// Every write is flushed before returning so a crash right after login or
/// logout never resurrects a stale token.
#[derive(Clone)]
pub struct TokenStorage {
    db: Db,
    sessions: sled::Tree,
}

impl TokenStorage {
    /// Open or create the Sled database at the given path
    pub fn open(path: impl AsRef<Path>) -> PanelResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// In-memory database discarded on drop.
    pub fn temporary() -> PanelResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> PanelResult<Self> {
        let sessions = db.open_tree("sessions")?;
        Ok(Self { db, sessions })
    }

    pub fn token(&self, role: Role) -> PanelResult<Option<String>> {
        self.get_string(role.storage_key())
    }

    /// Empty tokens are removed rather than stored.
    pub fn set_token(&self, role: Role, token: &str) -> PanelResult<()> {
        if token.is_empty() {
            self.remove(role.storage_key())
        } else {
            self.put(role.storage_key(), token.as_bytes())
        }
    }

    pub fn active_role(&self) -> PanelResult<Option<Role>> {
        Ok(match self.get_string(ROLE_KEY)?.as_deref() {
            Some("admin") => Some(Role::Admin),
            Some("doctor") => Some(Role::Doctor),
            _ => None,
        })
    }

    pub fn set_active_role(&self, role: Option<Role>) -> PanelResult<()> {
        match role {
            Some(role) => self.put(ROLE_KEY, role.as_str().as_bytes()),
            None => self.remove(ROLE_KEY),
        }
    }

    pub fn logged_in_doctor(&self) -> PanelResult<Option<LoggedInDoctor>> {
        match self.sessions.get(USER_DATA_KEY)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn set_logged_in_doctor(&self, doctor: Option<&LoggedInDoctor>) -> PanelResult<()> {
        match doctor {
            Some(doctor) => self.put(USER_DATA_KEY, &serde_json::to_vec(doctor)?),
            None => self.remove(USER_DATA_KEY),
        }
    }

    fn get_string(&self, key: &str) -> PanelResult<Option<String>> {
        Ok(self
            .sessions
            .get(key)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn put(&self, key: &str, value: &[u8]) -> PanelResult<()> {
        self.sessions.insert(key, value)?;
        self.db.flush()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> PanelResult<()> {
        self.sessions.remove(key)?;
        self.db.flush()?;
        Ok(())
    }
}
