//! Test doubles shared by the use case tests.

use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::toolset::{Toolset, ToolsetError};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use murlix_domain::{
    AgentEvent, LlmRequest, LlmResponse, RepositoryError, Session, SessionInfo, SessionRepository,
    ToolDefinition, ToolOutput,
};
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

// ==================== Gateway ====================

pub struct MockGateway {
    responses: Mutex<VecDeque<Result<LlmResponse, GatewayError>>>,
    pub requests: Mutex<Vec<LlmRequest>>,
    stall: bool,
}

impl MockGateway {
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
            stall: false,
        }
    }

    /// Records the request, then never answers.
    pub fn stalled() -> Self {
        let mut gateway = Self::new(vec![]);
        gateway.stall = true;
        gateway
    }

    pub fn failing(error: GatewayError) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from(vec![Err(error)])),
            requests: Mutex::new(Vec::new()),
            stall: false,
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmGateway for MockGateway {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.stall {
            std::future::pending::<()>().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::InvalidResponse("No more responses".into())))
    }
}

// ==================== Toolset ====================

pub struct MockToolset {
    name: String,
    tools: Vec<ToolDefinition>,
    fail_listing: bool,
    cancel_on_call: Option<CancellationToken>,
    pub calls: Mutex<Vec<(String, Value)>>,
    pub closed: AtomicBool,
}

impl MockToolset {
    pub fn new(name: &str, tools: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            tools: tools
                .iter()
                .map(|t| ToolDefinition::new(*t, format!("{t} tool")))
                .collect(),
            fail_listing: false,
            cancel_on_call: None,
            calls: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn broken(name: &str) -> Self {
        let mut toolset = Self::new(name, &[]);
        toolset.fail_listing = true;
        toolset
    }

    /// Cancels `token` from inside every call, as a user pressing Ctrl-C
    /// while the tool runs.
    pub fn cancelling(name: &str, tools: &[&str], token: CancellationToken) -> Self {
        let mut toolset = Self::new(name, tools);
        toolset.cancel_on_call = Some(token);
        toolset
    }
}

#[async_trait]
impl Toolset for MockToolset {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, ToolsetError> {
        if self.fail_listing {
            return Err(ToolsetError::Transport("server exited".into()));
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<ToolOutput, ToolsetError> {
        self.calls.lock().unwrap().push((name.to_string(), args));
        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }
        if name == "explode" {
            return Err(ToolsetError::Protocol("boom".into()));
        }
        Ok(ToolOutput::success(format!("{name} output")))
    }

    async fn close(&self) -> Result<(), ToolsetError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ==================== Session repository ====================

/// Keeps sessions in memory, keyed by `(app, user, id)`.
#[derive(Default)]
pub struct InMemorySessions {
    sessions: Mutex<HashMap<(String, String, String), Session>>,
    next_id: AtomicUsize,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self, app: &str, user: &str, id: &str) -> Option<Session> {
        self.sessions
            .lock()
            .unwrap()
            .get(&(app.to_string(), user.to_string(), id.to_string()))
            .cloned()
    }

    /// Shift a stored session's update time into the past.
    pub fn age(&self, app: &str, user: &str, id: &str, minutes: i64) {
        if let Some(session) = self
            .sessions
            .lock()
            .unwrap()
            .get_mut(&(app.to_string(), user.to_string(), id.to_string()))
        {
            session.last_update_time = Utc::now() - Duration::minutes(minutes);
        }
    }

    fn key(session: &Session) -> (String, String, String) {
        (
            session.app_name.clone(),
            session.user_id.clone(),
            session.id.clone(),
        )
    }
}

#[async_trait]
impl SessionRepository for InMemorySessions {
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<&str>,
        state: Map<String, Value>,
    ) -> Result<Session, RepositoryError> {
        let id = match session_id {
            Some(id) => id.to_string(),
            None => format!("session-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
        };
        let mut session = Session::new(&id, app_name, user_id);
        session.state = state;
        let mut sessions = self.sessions.lock().unwrap();
        let key = Self::key(&session);
        if sessions.contains_key(&key) {
            return Err(RepositoryError::AlreadyExists(id));
        }
        sessions.insert(key, session.clone());
        Ok(session)
    }

    async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>, RepositoryError> {
        Ok(self.stored(app_name, user_id, session_id))
    }

    async fn list_sessions(
        &self,
        app_name: &str,
        user_id: &str,
    ) -> Result<Vec<SessionInfo>, RepositoryError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.app_name == app_name && s.user_id == user_id)
            .map(Session::info)
            .collect())
    }

    async fn delete_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<(), RepositoryError> {
        self.sessions.lock().unwrap().remove(&(
            app_name.to_string(),
            user_id.to_string(),
            session_id.to_string(),
        ));
        Ok(())
    }

    async fn append_event(
        &self,
        session: &mut Session,
        event: AgentEvent,
    ) -> Result<(), RepositoryError> {
        session.last_update_time = event.timestamp;
        session.events.push(event);
        self.sessions
            .lock()
            .unwrap()
            .insert(Self::key(session), session.clone());
        Ok(())
    }

    async fn update_state(
        &self,
        session: &mut Session,
        key: &str,
        value: Value,
    ) -> Result<(), RepositoryError> {
        session.state.insert(key.to_string(), value);
        self.sessions
            .lock()
            .unwrap()
            .insert(Self::key(session), session.clone());
        Ok(())
    }
}
