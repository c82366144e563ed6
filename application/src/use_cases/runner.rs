//! Runner use case: the agent runtime.
//!
//! One call to [`Runner::run_async`] handles one user message:
//!
//! 1. load the session and append the user event
//! 2. ask the model, with the whole history and the tool catalog
//! 3. if the model asked for tools, run them, append their results and go
//!    back to 2; otherwise the turn is over
//!
//! Every appended event is also streamed to the caller through an
//! [`EventStream`], so the presentation layer can render tool calls while
//! the turn is still running.

use crate::config::RunnerConfig;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::toolset::Toolset;
use futures::Stream;
use murlix_domain::{
    AgentDefinition, AgentEvent, Content, LlmRequest, Part, RepositoryError, Role, SUMMARY_KEY,
    Session, SessionRepository, ToolDefinition, ToolOutput, truncate,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const EVENT_BUFFER: usize = 32;

/// Response recorded for tool calls that never ran.
const CANCELLED_OUTPUT: &str = "Cancelled";

/// Errors that end a turn.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Session storage error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Model error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Exceeded the limit of {0} model calls for one message")]
    TooManyLlmCalls(usize),

    #[error("Cancelled")]
    Cancelled,
}

/// Input for [`Runner::run_async`].
#[derive(Debug, Clone)]
pub struct RunInput {
    pub user_id: String,
    pub session_id: String,
    pub message: String,
    /// Model identifier used for every call of this turn.
    pub model: String,
    pub cancellation: Option<CancellationToken>,
}

impl RunInput {
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        message: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            message: message.into(),
            model: model.into(),
            cancellation: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

/// Events of one running turn.
///
/// Ends after the final response or after the first error. Dropping the
/// stream stops the turn at its next step.
pub struct EventStream {
    receiver: mpsc::Receiver<Result<AgentEvent, RunnerError>>,
}

impl EventStream {
    pub fn new(receiver: mpsc::Receiver<Result<AgentEvent, RunnerError>>) -> Self {
        Self { receiver }
    }

    pub async fn next_event(&mut self) -> Option<Result<AgentEvent, RunnerError>> {
        self.receiver.recv().await
    }

    /// Drain the stream and return the final response text.
    pub async fn final_text(mut self) -> Result<Option<String>, RunnerError> {
        let mut last = None;
        while let Some(item) = self.receiver.recv().await {
            let event = item?;
            if event.is_final_response() {
                last = Some(event.text());
            }
        }
        Ok(last)
    }
}

impl Stream for EventStream {
    type Item = Result<AgentEvent, RunnerError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Tool definitions plus which toolset serves each tool.
#[derive(Debug, Default)]
struct ToolCatalog {
    definitions: Vec<ToolDefinition>,
    owners: HashMap<String, usize>,
}

struct RunnerInner {
    app_name: String,
    agent: AgentDefinition,
    gateway: Arc<dyn LlmGateway>,
    sessions: Arc<dyn SessionRepository>,
    toolsets: Vec<Arc<dyn Toolset>>,
    config: RunnerConfig,
    conversation_logger: Arc<dyn ConversationLogger>,
    catalog: RwLock<Option<Arc<ToolCatalog>>>,
}

/// Drives the agent: model calls, tool calls and session persistence.
#[derive(Clone)]
pub struct Runner {
    inner: Arc<RunnerInner>,
}

impl Runner {
    pub fn new(
        app_name: impl Into<String>,
        agent: AgentDefinition,
        gateway: Arc<dyn LlmGateway>,
        sessions: Arc<dyn SessionRepository>,
        toolsets: Vec<Arc<dyn Toolset>>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(RunnerInner {
                app_name: app_name.into(),
                agent,
                gateway,
                sessions,
                toolsets,
                config,
                conversation_logger: Arc::new(NoConversationLogger),
                catalog: RwLock::new(None),
            }),
        }
    }

    /// Create with a conversation logger. Must be called before the runner
    /// is cloned.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => inner.conversation_logger = logger,
            None => warn!("Runner already shared; conversation logger not installed"),
        }
        self
    }

    /// Start a turn on the tokio runtime and return its event stream.
    pub fn run_async(&self, input: RunInput) -> EventStream {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(e) = inner.run_turn(input, &tx).await {
                warn!("Turn failed: {}", e);
                let _ = tx.send(Err(e)).await;
            }
        });
        EventStream::new(rx)
    }

    /// Every tool advertised by the configured toolsets.
    pub async fn tool_catalog(&self) -> Vec<ToolDefinition> {
        self.inner.catalog().await.definitions.clone()
    }

    /// Close every toolset. Failures are logged, not returned.
    pub async fn close(&self) {
        for toolset in &self.inner.toolsets {
            if let Err(e) = toolset.close().await {
                warn!("Failed to close toolset '{}': {}", toolset.name(), e);
            }
        }
    }
}

impl RunnerInner {
    async fn catalog(&self) -> Arc<ToolCatalog> {
        if let Some(catalog) = self.catalog.read().await.as_ref() {
            return Arc::clone(catalog);
        }

        let mut guard = self.catalog.write().await;
        if let Some(catalog) = guard.as_ref() {
            return Arc::clone(catalog);
        }

        let mut catalog = ToolCatalog::default();
        for (index, toolset) in self.toolsets.iter().enumerate() {
            match toolset.list_tools().await {
                Ok(tools) => {
                    debug!("Toolset '{}' provides {} tools", toolset.name(), tools.len());
                    for tool in tools {
                        if catalog.owners.contains_key(&tool.name) {
                            warn!(
                                "Tool '{}' from '{}' shadows an earlier definition; ignored",
                                tool.name,
                                toolset.name()
                            );
                            continue;
                        }
                        catalog.owners.insert(tool.name.clone(), index);
                        catalog.definitions.push(tool);
                    }
                }
                Err(e) => warn!("Skipping toolset '{}': {}", toolset.name(), e),
            }
        }

        let catalog = Arc::new(catalog);
        *guard = Some(Arc::clone(&catalog));
        catalog
    }

    async fn run_turn(
        &self,
        input: RunInput,
        tx: &mpsc::Sender<Result<AgentEvent, RunnerError>>,
    ) -> Result<(), RunnerError> {
        let message = input.message.trim();
        if message.is_empty() {
            return Err(RunnerError::EmptyMessage);
        }

        let mut session = self
            .sessions
            .get_session(&self.app_name, &input.user_id, &input.session_id)
            .await?
            .ok_or_else(|| RunnerError::SessionNotFound(input.session_id.clone()))?;

        let invocation_id = uuid::Uuid::new_v4().to_string();
        info!(
            "Turn {} in session {}: {}",
            invocation_id,
            session.id,
            truncate(message, 100)
        );

        self.sessions
            .append_event(&mut session, AgentEvent::user_message(&invocation_id, message))
            .await?;
        if session.summary().is_none() {
            let summary = truncate(message, self.config.summary_chars);
            self.sessions
                .update_state(&mut session, SUMMARY_KEY, Value::String(summary))
                .await?;
        }
        self.conversation_logger.log(ConversationEvent::new(
            "user_message",
            json!({
                "session_id": session.id,
                "invocation_id": invocation_id,
                "model": input.model,
                "text": message,
            }),
        ));

        let catalog = self.catalog().await;
        let mut llm_calls = 0;

        loop {
            check_cancelled(&input.cancellation)?;
            llm_calls += 1;
            if llm_calls > self.config.max_llm_calls {
                return Err(RunnerError::TooManyLlmCalls(self.config.max_llm_calls));
            }

            let request = self.build_request(&input.model, &session, &catalog);
            debug!(
                "Model call {}/{} with {} contents",
                llm_calls,
                self.config.max_llm_calls,
                request.contents.len()
            );
            let response = match &input.cancellation {
                Some(token) => tokio::select! {
                    _ = token.cancelled() => return Err(RunnerError::Cancelled),
                    response = self.gateway.generate(&request) => response?,
                },
                None => self.gateway.generate(&request).await?,
            };

            let model_event = AgentEvent::new(&invocation_id, &self.agent.name, response.content);
            let calls: Vec<(String, String, Value)> = model_event
                .function_calls()
                .into_iter()
                .map(|(id, name, args)| (id.to_string(), name.to_string(), args.clone()))
                .collect();
            if calls.is_empty() {
                self.conversation_logger.log(ConversationEvent::new(
                    "model_response",
                    json!({
                        "session_id": session.id,
                        "invocation_id": invocation_id,
                        "model": response.model_version.as_deref().unwrap_or(&input.model),
                        "text": model_event.text(),
                    }),
                ));
            }
            let delivered = self.publish(&mut session, model_event, tx).await?;
            if calls.is_empty() {
                if delivered {
                    info!("Turn {} finished after {} model calls", invocation_id, llm_calls);
                }
                return Ok(());
            }

            // Every call gets a response, even when the turn stops midway.
            let mut stopped = !delivered;
            let mut parts = Vec::with_capacity(calls.len());
            for (id, name, args) in calls {
                stopped = stopped || is_cancelled(&input.cancellation) || tx.is_closed();
                let output = if stopped {
                    ToolOutput::error(CANCELLED_OUTPUT)
                } else {
                    match self
                        .execute_tool_cancellable(&catalog, &name, args.clone(), &input.cancellation)
                        .await
                    {
                        Some(output) => output,
                        None => {
                            stopped = true;
                            ToolOutput::error(CANCELLED_OUTPUT)
                        }
                    }
                };
                self.conversation_logger.log(ConversationEvent::new(
                    "tool_call",
                    json!({
                        "session_id": session.id,
                        "tool": name,
                        "args": args,
                        "is_error": output.is_error,
                        "bytes": output.content.len(),
                    }),
                ));
                parts.push(Part::function_response(
                    id,
                    name,
                    output.to_response_value(),
                    output.is_error,
                ));
            }
            let response_event = AgentEvent::new(
                &invocation_id,
                &self.agent.name,
                Content::new(Role::User, parts),
            );
            let delivered = self.publish(&mut session, response_event, tx).await?;
            if is_cancelled(&input.cancellation) {
                info!("Turn {} cancelled during tool calls", invocation_id);
                return Err(RunnerError::Cancelled);
            }
            if !delivered {
                return Ok(());
            }
        }
    }

    fn build_request(&self, model: &str, session: &Session, catalog: &ToolCatalog) -> LlmRequest {
        let contents = session
            .events
            .iter()
            .filter(|e| !e.partial && !e.content.is_empty())
            .map(|e| e.content.clone())
            .collect();
        LlmRequest::new(model, contents)
            .with_system_instruction(self.agent.instruction.clone())
            .with_tools(catalog.definitions.clone())
    }

    async fn execute_tool(&self, catalog: &ToolCatalog, name: &str, args: Value) -> ToolOutput {
        let Some(toolset) = catalog.owners.get(name).and_then(|&i| self.toolsets.get(i)) else {
            warn!("Model requested unknown tool '{}'", name);
            return ToolOutput::error(format!("Tool '{name}' not found"));
        };

        debug!("Calling tool '{}' on '{}'", name, toolset.name());
        match toolset.call_tool(name, args).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Tool '{}' failed: {}", name, e);
                ToolOutput::error(e.to_string())
            }
        }
    }

    /// Run a tool, giving up when the turn is cancelled. `None` means cancelled.
    async fn execute_tool_cancellable(
        &self,
        catalog: &ToolCatalog,
        name: &str,
        args: Value,
        cancellation: &Option<CancellationToken>,
    ) -> Option<ToolOutput> {
        match cancellation {
            Some(token) => tokio::select! {
                _ = token.cancelled() => None,
                output = self.execute_tool(catalog, name, args) => Some(output),
            },
            None => Some(self.execute_tool(catalog, name, args).await),
        }
    }

    /// Persist and emit an event. `Ok(false)` means the receiver is gone.
    async fn publish(
        &self,
        session: &mut Session,
        event: AgentEvent,
        tx: &mpsc::Sender<Result<AgentEvent, RunnerError>>,
    ) -> Result<bool, RunnerError> {
        self.sessions.append_event(session, event.clone()).await?;
        if tx.send(Ok(event)).await.is_err() {
            debug!("Event stream dropped; stopping turn");
            return Ok(false);
        }
        Ok(true)
    }
}

fn is_cancelled(token: &Option<CancellationToken>) -> bool {
    token.as_ref().is_some_and(CancellationToken::is_cancelled)
}

fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), RunnerError> {
    if is_cancelled(token) {
        return Err(RunnerError::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{InMemorySessions, MockGateway, MockToolset};
    use futures::StreamExt;
    use murlix_domain::LlmResponse;
    use serde_json::Map;
    use std::sync::atomic::Ordering;

    const APP: &str = "murlix-tests";
    const USER: &str = "tester";

    fn text_response(text: &str) -> LlmResponse {
        LlmResponse::new(Content::model_text(text))
    }

    fn call_response(calls: &[(&str, &str)]) -> LlmResponse {
        LlmResponse::new(Content::new(
            Role::Model,
            calls
                .iter()
                .map(|(id, name)| Part::function_call(*id, *name, json!({"path": "."})))
                .collect(),
        ))
    }

    async fn setup(
        responses: Vec<LlmResponse>,
        toolsets: Vec<Arc<dyn Toolset>>,
        config: RunnerConfig,
    ) -> (Runner, Arc<MockGateway>, Arc<InMemorySessions>, String) {
        let gateway = Arc::new(MockGateway::new(responses));
        let sessions = Arc::new(InMemorySessions::new());
        let session = sessions
            .create_session(APP, USER, None, Map::new())
            .await
            .unwrap();
        let runner = Runner::new(
            APP,
            AgentDefinition::default(),
            gateway.clone(),
            sessions.clone(),
            toolsets,
            config,
        );
        (runner, gateway, sessions, session.id)
    }

    async fn collect(stream: EventStream) -> Vec<Result<AgentEvent, RunnerError>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn test_plain_reply_is_streamed_and_persisted() {
        let (runner, gateway, sessions, id) =
            setup(vec![text_response("Hello there!")], vec![], RunnerConfig::default()).await;

        let events = collect(runner.run_async(RunInput::new(USER, &id, "hi", "gemini-2.0-flash"))).await;

        assert_eq!(events.len(), 1);
        let reply = events[0].as_ref().unwrap();
        assert!(reply.is_final_response());
        assert_eq!(reply.text(), "Hello there!");
        assert_eq!(reply.author, "murlix_assistant");

        let stored = sessions.stored(APP, USER, &id).unwrap();
        assert_eq!(stored.events.len(), 2);
        assert_eq!(stored.events[0].text(), "hi");
        assert_eq!(stored.summary(), Some("hi"));

        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests[0].model, "gemini-2.0-flash");
        assert!(requests[0].system_instruction.as_deref().unwrap().starts_with("You are Murlix"));
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let toolset = Arc::new(MockToolset::new("fs", &["list_dir"]));
        let (runner, gateway, sessions, id) = setup(
            vec![call_response(&[("c1", "list_dir")]), text_response("Two files.")],
            vec![toolset.clone()],
            RunnerConfig::default(),
        )
        .await;

        let events: Vec<AgentEvent> = collect(runner.run_async(RunInput::new(USER, &id, "ls", "m")))
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].function_calls()[0].1, "list_dir");
        assert!(!events[0].is_final_response());
        let responses = events[1].function_responses();
        assert_eq!(responses[0].0, "list_dir");
        assert_eq!(responses[0].1, &json!({"result": "list_dir output"}));
        assert!(!responses[0].2);
        assert!(events[2].is_final_response());

        assert_eq!(toolset.calls.lock().unwrap()[0].1, json!({"path": "."}));

        // Second request carries the whole history: user, call, response.
        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].contents.len(), 3);
        assert_eq!(requests[1].tools[0].name, "list_dir");

        assert_eq!(sessions.stored(APP, USER, &id).unwrap().events.len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_tool_yields_error_response() {
        let (runner, _gateway, _sessions, id) = setup(
            vec![call_response(&[("c1", "rm_rf")]), text_response("Sorry.")],
            vec![Arc::new(MockToolset::new("fs", &["list_dir"]))],
            RunnerConfig::default(),
        )
        .await;

        let events = collect(runner.run_async(RunInput::new(USER, &id, "delete", "m"))).await;
        let responses = events[1].as_ref().unwrap().function_responses();
        assert!(responses[0].2);
        assert_eq!(responses[0].1, &json!({"error": "Tool 'rm_rf' not found"}));
        assert!(events[2].as_ref().unwrap().is_final_response());
    }

    #[tokio::test]
    async fn test_toolset_failure_is_reported_to_model() {
        let (runner, _gateway, _sessions, id) = setup(
            vec![call_response(&[("c1", "explode")]), text_response("It failed.")],
            vec![Arc::new(MockToolset::new("fs", &["explode"]))],
            RunnerConfig::default(),
        )
        .await;

        let events = collect(runner.run_async(RunInput::new(USER, &id, "go", "m"))).await;
        assert!(events[1].as_ref().unwrap().function_responses()[0].2);
        assert_eq!(events[2].as_ref().unwrap().text(), "It failed.");
    }

    #[tokio::test]
    async fn test_too_many_llm_calls() {
        let responses = (0..5)
            .map(|i| call_response(&[(&*format!("c{i}"), "list_dir")]))
            .collect();
        let (runner, gateway, _sessions, id) = setup(
            responses,
            vec![Arc::new(MockToolset::new("fs", &["list_dir"]))],
            RunnerConfig::default().with_max_llm_calls(2),
        )
        .await;

        let events = collect(runner.run_async(RunInput::new(USER, &id, "loop", "m"))).await;
        assert!(matches!(
            events.last().unwrap(),
            Err(RunnerError::TooManyLlmCalls(2))
        ));
        assert_eq!(gateway.request_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_session() {
        let (runner, gateway, _sessions, _id) =
            setup(vec![text_response("x")], vec![], RunnerConfig::default()).await;

        let events = collect(runner.run_async(RunInput::new(USER, "nope", "hi", "m"))).await;
        assert!(matches!(&events[0], Err(RunnerError::SessionNotFound(id)) if id == "nope"));
        assert_eq!(gateway.request_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let (runner, _gateway, _sessions, id) =
            setup(vec![], vec![], RunnerConfig::default()).await;
        let events = collect(runner.run_async(RunInput::new(USER, &id, "   ", "m"))).await;
        assert!(matches!(events[0], Err(RunnerError::EmptyMessage)));
    }

    #[tokio::test]
    async fn test_gateway_error_ends_turn() {
        let gateway = Arc::new(MockGateway::failing(GatewayError::Http {
            status: 429,
            body: "quota".into(),
        }));
        let sessions = Arc::new(InMemorySessions::new());
        let session = sessions.create_session(APP, USER, None, Map::new()).await.unwrap();
        let runner = Runner::new(
            APP,
            AgentDefinition::default(),
            gateway,
            sessions,
            vec![],
            RunnerConfig::default(),
        );

        let events = collect(runner.run_async(RunInput::new(USER, &session.id, "hi", "m"))).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            Err(RunnerError::Gateway(GatewayError::Http { status: 429, .. }))
        ));
    }

    #[tokio::test]
    async fn test_summary_kept_after_first_message() {
        let (runner, _gateway, sessions, id) = setup(
            vec![text_response("a"), text_response("b")],
            vec![],
            RunnerConfig::default(),
        )
        .await;

        runner
            .run_async(RunInput::new(USER, &id, "first question", "m"))
            .final_text()
            .await
            .unwrap();
        let text = runner
            .run_async(RunInput::new(USER, &id, "second question", "m"))
            .final_text()
            .await
            .unwrap();

        assert_eq!(text.as_deref(), Some("b"));
        let stored = sessions.stored(APP, USER, &id).unwrap();
        assert_eq!(stored.summary(), Some("first question"));
        assert_eq!(stored.events.len(), 4);
    }

    #[tokio::test]
    async fn test_long_first_message_summary_truncated() {
        let (runner, _gateway, sessions, id) =
            setup(vec![text_response("ok")], vec![], RunnerConfig::default()).await;
        let message = "x".repeat(200);
        runner
            .run_async(RunInput::new(USER, &id, &message, "m"))
            .final_text()
            .await
            .unwrap();
        let summary = sessions.stored(APP, USER, &id).unwrap().summary().unwrap().to_string();
        assert_eq!(summary.chars().count(), 83);
        assert!(summary.ends_with("..."));
    }

    #[tokio::test]
    async fn test_cancelled_before_model_call() {
        let (runner, gateway, _sessions, id) =
            setup(vec![text_response("x")], vec![], RunnerConfig::default()).await;
        let token = CancellationToken::new();
        token.cancel();

        let events = collect(
            runner.run_async(RunInput::new(USER, &id, "hi", "m").with_cancellation(token)),
        )
        .await;
        assert!(matches!(events[0], Err(RunnerError::Cancelled)));
        assert_eq!(gateway.request_count(), 0);
    }

    /// Function calls and function responses across every request content.
    fn call_and_response_counts(request: &LlmRequest) -> (usize, usize) {
        request.contents.iter().flat_map(|c| &c.parts).fold((0, 0), |(calls, resps), part| {
            match part {
                Part::FunctionCall { .. } => (calls + 1, resps),
                Part::FunctionResponse { .. } => (calls, resps + 1),
                Part::Text { .. } => (calls, resps),
            }
        })
    }

    #[tokio::test]
    async fn test_cancel_between_tool_calls_answers_every_call() {
        let token = CancellationToken::new();
        let toolset = Arc::new(MockToolset::cancelling("fs", &["a", "b"], token.clone()));
        let (runner, gateway, sessions, id) = setup(
            vec![call_response(&[("c1", "a"), ("c2", "b")]), text_response("Back again.")],
            vec![toolset.clone()],
            RunnerConfig::default(),
        )
        .await;

        let events = collect(
            runner.run_async(RunInput::new(USER, &id, "run both", "m").with_cancellation(token)),
        )
        .await;
        assert!(matches!(events.last().unwrap(), Err(RunnerError::Cancelled)));
        assert_eq!(toolset.calls.lock().unwrap().len(), 1);

        let stored = sessions.stored(APP, USER, &id).unwrap();
        assert_eq!(stored.events.len(), 3);
        let responses = stored.events[2].function_responses();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].1, &json!({"result": "a output"}));
        assert_eq!(responses[1].0, "b");
        assert_eq!(responses[1].1, &json!({"error": "Cancelled"}));
        assert!(responses[1].2);

        // The next turn sends a history where every call has its response.
        let text = runner
            .run_async(RunInput::new(USER, &id, "again", "m"))
            .final_text()
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("Back again."));
        let requests = gateway.requests.lock().unwrap();
        let next = requests.last().unwrap();
        assert_eq!(call_and_response_counts(next), (2, 2));
        assert_eq!(next.contents.len(), 4);
    }

    #[tokio::test]
    async fn test_cancel_during_model_call() {
        let gateway = Arc::new(MockGateway::stalled());
        let sessions = Arc::new(InMemorySessions::new());
        let session = sessions.create_session(APP, USER, None, Map::new()).await.unwrap();
        let runner = Runner::new(
            APP,
            AgentDefinition::default(),
            gateway.clone(),
            sessions.clone(),
            vec![],
            RunnerConfig::default(),
        );

        let token = CancellationToken::new();
        let canceller = {
            let gateway = gateway.clone();
            let token = token.clone();
            tokio::spawn(async move {
                while gateway.request_count() == 0 {
                    tokio::task::yield_now().await;
                }
                token.cancel();
            })
        };

        let events = collect(
            runner.run_async(RunInput::new(USER, &session.id, "hi", "m").with_cancellation(token)),
        )
        .await;
        canceller.await.unwrap();

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(RunnerError::Cancelled)));
        let stored = sessions.stored(APP, USER, &session.id).unwrap();
        assert_eq!(stored.events.len(), 1);
        assert_eq!(stored.events[0].text(), "hi");
    }

    #[tokio::test]
    async fn test_dropped_stream_still_answers_calls() {
        let toolset = Arc::new(MockToolset::new("fs", &["a", "b"]));
        let (runner, _gateway, sessions, id) = setup(
            vec![call_response(&[("c1", "a"), ("c2", "b")])],
            vec![toolset.clone()],
            RunnerConfig::default(),
        )
        .await;

        drop(runner.run_async(RunInput::new(USER, &id, "run both", "m")));

        let mut stored = sessions.stored(APP, USER, &id).unwrap();
        for _ in 0..200 {
            if stored.events.len() == 3 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            stored = sessions.stored(APP, USER, &id).unwrap();
        }
        assert_eq!(stored.events.len(), 3);
        assert_eq!(stored.events[1].function_calls().len(), 2);
        let responses = stored.events[2].function_responses();
        assert_eq!(responses.len(), 2);
        assert!(responses.iter().all(|(_, value, is_error)| {
            *is_error && *value == &json!({"error": "Cancelled"})
        }));
        assert!(toolset.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tool_catalog_skips_broken_toolset() {
        let (runner, _gateway, _sessions, _id) = setup(
            vec![],
            vec![
                Arc::new(MockToolset::broken("docs")),
                Arc::new(MockToolset::new("fs", &["read_file", "list_dir"])),
                Arc::new(MockToolset::new("shell", &["run_command", "read_file"])),
            ],
            RunnerConfig::default(),
        )
        .await;

        let names: Vec<String> = runner.tool_catalog().await.into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["read_file", "list_dir", "run_command"]);
    }

    #[tokio::test]
    async fn test_close_closes_every_toolset() {
        let fs = Arc::new(MockToolset::new("fs", &[]));
        let shell = Arc::new(MockToolset::new("shell", &[]));
        let (runner, _gateway, _sessions, _id) = setup(
            vec![],
            vec![fs.clone(), shell.clone()],
            RunnerConfig::default(),
        )
        .await;

        runner.close().await;
        assert!(fs.closed.load(Ordering::SeqCst));
        assert!(shell.closed.load(Ordering::SeqCst));
    }
}
