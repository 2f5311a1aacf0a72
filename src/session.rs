//! Current-user session
//!
//! The signed-in profile is an explicit value handed to the services that
//! need attribution or permission checks. A [`SessionStore`] caches it in a
//! JSON file between runs: `load` on start, `save` on sign-in, `clear` on
//! sign-out.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Member;
use crate::store::Stored;

/// Id of the fallback profile used when nobody signed in
pub const ANONYMOUS_ID: &str = "local-user";

/// Email used when the profile has none
pub const FALLBACK_EMAIL: &str = "user@hiel.church";

/// Display name of the fallback profile
pub const FALLBACK_NAME: &str = "히엘 팀원";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("'{action}' requires the team leader")]
    PermissionDenied { action: String },
}

impl SessionError {
    pub fn korean_desc(&self) -> String {
        match self {
            Self::Io(e) => format!("세션 파일 오류: {e}"),
            Self::Corrupt(_) => "세션 파일이 손상되었습니다".to_string(),
            Self::PermissionDenied { action } => format!("팀장만 할 수 있습니다: {action}"),
        }
    }
}

/// Profile of whoever is using the app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub is_team_leader: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    user: CurrentUser,
    started_at: DateTime<Utc>,
}

impl Session {
    /// Fallback profile: not a leader, generic name and email
    pub fn anonymous() -> Self {
        Self {
            user: CurrentUser {
                id: ANONYMOUS_ID.to_string(),
                email: FALLBACK_EMAIL.to_string(),
                display_name: FALLBACK_NAME.to_string(),
                is_team_leader: false,
            },
            started_at: Utc::now(),
        }
    }

    /// Profile derived from a member record
    ///
    /// Leadership is the 팀장 role for the year of `today`.
    pub fn sign_in(member: &Stored<Member>, today: NaiveDate) -> Self {
        Self {
            user: CurrentUser {
                id: member.id.clone(),
                email: member
                    .email
                    .clone()
                    .unwrap_or_else(|| FALLBACK_EMAIL.to_string()),
                display_name: member.name.clone(),
                is_team_leader: member.is_team_leader_in(today.year()),
            },
            started_at: Utc::now(),
        }
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_anonymous(&self) -> bool {
        self.user.id == ANONYMOUS_ID
    }

    pub fn can_delete(&self) -> bool {
        self.user.is_team_leader
    }

    /// Fail unless the user may delete records
    pub fn require_delete(&self, action: &str) -> Result<(), SessionError> {
        if self.can_delete() {
            Ok(())
        } else {
            tracing::warn!(user = %self.user.id, action, "Delete denied");
            Err(SessionError::PermissionDenied {
                action: action.to_string(),
            })
        }
    }

    /// Name stamped on authored records
    pub fn author_name(&self) -> &str {
        &self.user.display_name
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }
}

/// File-backed cache of the session between runs
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached session, or the anonymous one when nothing is cached
    pub fn load(&self) -> Result<Session, SessionError> {
        if !self.path.exists() {
            return Ok(Session::anonymous());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let session: Session = serde_json::from_reader(reader)?;
        tracing::debug!(path = %self.path.display(), user = %session.user.id, "Session loaded");
        Ok(session)
    }

    /// Write through a temp file, then rename
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        let writer = BufWriter::new(File::create(&temp_path)?);
        serde_json::to_writer_pretty(writer, session)?;
        fs::rename(&temp_path, &self.path)?;

        tracing::info!(user = %session.user.id, "Session saved");
        Ok(())
    }

    /// Sign out
    pub fn clear(&self) -> Result<(), SessionError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            tracing::info!(path = %self.path.display(), "Session cleared");
        }
        Ok(())
    }
}
