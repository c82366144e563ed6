//! JSONL session repository.
//!
//! One append-only file per session at `{root}/{app}/{user}/{id}.jsonl`.
//! The first line is a `meta` record; every later line is either an `event`
//! (one [`AgentEvent`]) or a `state` upsert. Loading a session replays the
//! file; unreadable lines are skipped with a warning. New files are
//! written under a temporary name and linked into place whole.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use murlix_domain::{AgentEvent, RepositoryError, Session, SessionInfo, SessionRepository};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const EXTENSION: &str = "jsonl";

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Record {
    Meta {
        id: String,
        app_name: String,
        user_id: String,
        created_at: DateTime<Utc>,
    },
    Event {
        event: AgentEvent,
    },
    State {
        key: String,
        value: Value,
        timestamp: DateTime<Utc>,
    },
}

/// Session repository writing one JSONL file per session
pub struct JsonlSessionRepository {
    root: PathBuf,
    /// Serializes appends so lines from concurrent writers never interleave.
    write_lock: Mutex<()>,
}

impl JsonlSessionRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `{data_dir}/murlix/sessions`, or `./.murlix/sessions` when the
    /// platform has no data directory.
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("murlix").join("sessions"))
            .unwrap_or_else(|| PathBuf::from(".murlix").join("sessions"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scope_dir(&self, app_name: &str, user_id: &str) -> PathBuf {
        self.root
            .join(path_component(app_name))
            .join(path_component(user_id))
    }

    fn session_path(&self, app_name: &str, user_id: &str, session_id: &str) -> PathBuf {
        self.scope_dir(app_name, user_id)
            .join(format!("{}.{}", path_component(session_id), EXTENSION))
    }

    async fn append_records(&self, path: &Path, records: &[Record]) -> Result<(), RepositoryError> {
        let buf = encode_records(records)?;
        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new().append(true).open(path).await?;
        file.write_all(buf.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn load(&self, path: &Path) -> Result<Option<Session>, RepositoryError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        replay(path, &content).map(Some)
    }
}

fn encode_records(records: &[Record]) -> Result<String, RepositoryError> {
    let mut buf = String::new();
    for record in records {
        let line =
            serde_json::to_string(record).map_err(|e| RepositoryError::Corrupt(e.to_string()))?;
        buf.push_str(&line);
        buf.push('\n');
    }
    Ok(buf)
}

/// Rebuild a session from the lines of its file.
fn replay(path: &Path, content: &str) -> Result<Session, RepositoryError> {
    let mut session: Option<Session> = None;

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: Record = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                warn!("{}:{}: skipping unreadable record: {}", path.display(), index + 1, e);
                continue;
            }
        };

        match (record, session.as_mut()) {
            (
                Record::Meta {
                    id,
                    app_name,
                    user_id,
                    created_at,
                },
                None,
            ) => {
                let mut s = Session::new(id, app_name, user_id);
                s.last_update_time = created_at;
                session = Some(s);
            }
            (Record::Meta { .. }, Some(_)) => {
                warn!("{}:{}: duplicate meta record ignored", path.display(), index + 1);
            }
            (Record::Event { event }, Some(s)) => {
                s.last_update_time = s.last_update_time.max(event.timestamp);
                s.events.push(event);
            }
            (
                Record::State {
                    key,
                    value,
                    timestamp,
                },
                Some(s),
            ) => {
                s.last_update_time = s.last_update_time.max(timestamp);
                s.state.insert(key, value);
            }
            (_, None) => {
                return Err(RepositoryError::Corrupt(format!(
                    "{}: first record is not a meta record",
                    path.display()
                )));
            }
        }
    }

    session.ok_or_else(|| RepositoryError::Corrupt(format!("{}: empty session file", path.display())))
}

/// Percent-encode a string into a single path component.
///
/// ASCII letters, digits, `-`, `_` and non-leading `.` pass through; every
/// other byte becomes `%XX`, so distinct names never share a directory.
fn path_component(raw: &str) -> String {
    if raw.is_empty() {
        return "%".to_string();
    }
    let mut out = String::with_capacity(raw.len());
    for (i, byte) in raw.bytes().enumerate() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(byte, b'-' | b'_')
            || (byte == b'.' && i > 0);
        if keep {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[async_trait]
impl SessionRepository for JsonlSessionRepository {
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<&str>,
        state: Map<String, Value>,
    ) -> Result<Session, RepositoryError> {
        let id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let dir = self.scope_dir(app_name, user_id);
        fs::create_dir_all(&dir).await?;
        let path = self.session_path(app_name, user_id, &id);

        let now = Utc::now();
        let mut records = vec![Record::Meta {
            id: id.clone(),
            app_name: app_name.to_string(),
            user_id: user_id.to_string(),
            created_at: now,
        }];
        records.extend(state.iter().map(|(key, value)| Record::State {
            key: key.clone(),
            value: value.clone(),
            timestamp: now,
        }));
        let buf = encode_records(&records)?;

        // Written under a temporary name, then linked into place: readers
        // never see an empty session file, even after a crash.
        let tmp = dir.join(format!(".{}.{}.tmp", path_component(&id), uuid::Uuid::new_v4()));
        {
            let _guard = self.write_lock.lock().await;
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&tmp)
                .await?;
            file.write_all(buf.as_bytes()).await?;
            file.flush().await?;
            drop(file);

            let linked = fs::hard_link(&tmp, &path).await;
            let _ = fs::remove_file(&tmp).await;
            match linked {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    return Err(RepositoryError::AlreadyExists(id));
                }
                Err(e) => return Err(e.into()),
            }
        }

        debug!("Created session file {}", path.display());
        let mut session = Session::new(id, app_name, user_id);
        session.state = state;
        session.last_update_time = now;
        Ok(session)
    }

    async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>, RepositoryError> {
        self.load(&self.session_path(app_name, user_id, session_id))
            .await
    }

    async fn list_sessions(
        &self,
        app_name: &str,
        user_id: &str,
    ) -> Result<Vec<SessionInfo>, RepositoryError> {
        let dir = self.scope_dir(app_name, user_id);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut sessions = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            match self.load(&path).await {
                Ok(Some(session)) => sessions.push(session.info()),
                Ok(None) => {}
                Err(e) => warn!("Skipping session file {}: {}", path.display(), e),
            }
        }
        Ok(sessions)
    }

    async fn delete_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<(), RepositoryError> {
        let path = self.session_path(app_name, user_id, session_id);
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted session file {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn append_event(
        &self,
        session: &mut Session,
        event: AgentEvent,
    ) -> Result<(), RepositoryError> {
        let path = self.session_path(&session.app_name, &session.user_id, &session.id);
        if !fs::try_exists(&path).await? {
            return Err(RepositoryError::NotFound(session.id.clone()));
        }
        let timestamp = event.timestamp;
        self.append_records(&path, &[Record::Event { event: event.clone() }])
            .await?;
        session.last_update_time = session.last_update_time.max(timestamp);
        session.events.push(event);
        Ok(())
    }

    async fn update_state(
        &self,
        session: &mut Session,
        key: &str,
        value: Value,
    ) -> Result<(), RepositoryError> {
        let path = self.session_path(&session.app_name, &session.user_id, &session.id);
        if !fs::try_exists(&path).await? {
            return Err(RepositoryError::NotFound(session.id.clone()));
        }
        let timestamp = Utc::now();
        self.append_records(
            &path,
            &[Record::State {
                key: key.to_string(),
                value: value.clone(),
                timestamp,
            }],
        )
        .await?;
        session.last_update_time = session.last_update_time.max(timestamp);
        session.state.insert(key.to_string(), value);
        Ok(())
    }
}
