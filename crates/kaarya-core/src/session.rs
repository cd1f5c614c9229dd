use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auth::AuthProvider;
use crate::prefs::write_atomic;
use crate::task::UserId;

/// Minimal user identity as known to the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: Identity,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }

    /// Treats a session as expired a little early so a call started now
    /// does not race the deadline.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|deadline| deadline - Duration::seconds(30) <= now)
    }
}

/// The saved session of the command-line front-end.
#[derive(Debug)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
        Ok(Self {
            path: data_dir.join("session.json"),
        })
    }

    pub fn load(&self) -> anyhow::Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed reading {}", self.path.display()))?;
        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                warn!(file = %self.path.display(), error = %err, "discarding unreadable session");
                Ok(None)
            }
        }
    }

    pub fn save(&self, session: &Session) -> anyhow::Result<()> {
        let payload = serde_json::to_string_pretty(session)?;
        write_atomic(&self.path, payload.as_bytes())
            .with_context(|| format!("failed to save session to {}", self.path.display()))?;
        debug!(user = %session.user_id(), "session saved");
        Ok(())
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("failed removing {}", self.path.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Auth,
    Tasks(Session),
}

pub struct SessionGate;

impl SessionGate {
    /// Picks the screen for a saved session, refreshing it when it has
    /// expired. A failed refresh lands on the auth screen.
    #[tracing::instrument(skip_all)]
    pub async fn resolve(
        saved: Option<Session>,
        auth: &dyn AuthProvider,
        now: DateTime<Utc>,
    ) -> Screen {
        let Some(session) = saved else {
            return Screen::Auth;
        };

        if !session.is_expired(now) {
            return Screen::Tasks(session);
        }

        info!(user = %session.user_id(), "session expired, refreshing");
        match auth.refresh(&session).await {
            Ok(fresh) => Screen::Tasks(fresh),
            Err(err) => {
                warn!(error = %err, "session refresh failed");
                Screen::Auth
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::tempdir;
    use uuid::Uuid;

    use super::{Identity, Session, SessionFile};

    fn session(expires_in: Option<i64>) -> Session {
        let now = Utc.with_ymd_and_hms(2026, 2, 16, 5, 0, 0).unwrap();
        Session {
            user: Identity {
                id: Uuid::new_v4(),
                email: "a@example.com".to_string(),
            },
            access_token: "token".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: expires_in.map(|secs| now + Duration::seconds(secs)),
        }
    }

    #[test]
    fn expiry_has_a_safety_margin() {
        let now = Utc.with_ymd_and_hms(2026, 2, 16, 5, 0, 0).unwrap();
        assert!(!session(None).is_expired(now));
        assert!(!session(Some(3600)).is_expired(now));
        assert!(session(Some(10)).is_expired(now));
        assert!(session(Some(-1)).is_expired(now));
    }

    #[test]
    fn session_file_round_trip_and_clear() {
        let temp = tempdir().expect("tempdir");
        let file = SessionFile::open(temp.path()).expect("open");
        assert_eq!(file.load().unwrap(), None);

        let saved = session(Some(3600));
        file.save(&saved).expect("save");
        assert_eq!(file.load().unwrap(), Some(saved));

        file.clear().expect("clear");
        assert_eq!(file.load().unwrap(), None);
        file.clear().expect("clearing twice is fine");
    }

    #[test]
    fn corrupt_session_file_reads_as_signed_out() {
        let temp = tempdir().expect("tempdir");
        std::fs::write(temp.path().join("session.json"), "{not json").unwrap();
        let file = SessionFile::open(temp.path()).expect("open");
        assert_eq!(file.load().unwrap(), None);
    }
}
