//! Stdio JSON-RPC client for one MCP server process.
//!
//! The server speaks newline-delimited JSON-RPC 2.0 on its stdin/stdout.
//! [`McpClient`] runs a single background reader task that owns the child's
//! stdout and fulfils pending requests through `oneshot` channels keyed by
//! request id. Writes go through a `Mutex<BufWriter>` so concurrent requests
//! never interleave on the pipe.

use super::error::{McpError, Result};
use super::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, JsonRpcResponseOut};
use super::transport::{MessageKind, classify_message};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex, RwLock, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

type PendingMap = Arc<RwLock<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;
type SharedWriter = Arc<Mutex<BufWriter<ChildStdin>>>;

pub struct McpClient {
    /// Server name, used in log lines.
    name: String,
    _reader_handle: JoinHandle<()>,
    _stderr_handle: JoinHandle<()>,
    pending_responses: PendingMap,
    writer: SharedWriter,
    /// Set once stdout reaches EOF or `close()` runs.
    closed: Arc<AtomicBool>,
    /// Killed on close and on Drop.
    child: Mutex<Child>,
    timeout: Duration,
}

impl McpClient {
    /// Spawn `command args...` with piped stdio and start the reader.
    ///
    /// The command is looked up on `PATH` first so a missing binary is
    /// reported as [`McpError::CommandNotFound`] rather than a bare I/O error.
    pub async fn spawn(
        name: &str,
        command: &str,
        args: &[String],
        env: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<Self> {
        let program =
            which::which(command).map_err(|_| McpError::CommandNotFound(command.to_string()))?;
        debug!("Spawning MCP server '{}': {} {:?}", name, program.display(), args);

        let mut cmd = Command::new(&program);
        cmd.args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Linux: request kernel to send SIGTERM to child when parent dies.
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::SpawnError(std::io::Error::other("Failed to capture stdin")))?;
        let stdout = child.stdout.take().ok_or_else(|| {
            McpError::SpawnError(std::io::Error::other("Failed to capture stdout"))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            McpError::SpawnError(std::io::Error::other("Failed to capture stderr"))
        })?;

        let pending_responses: PendingMap = Arc::new(RwLock::new(HashMap::new()));
        let writer: SharedWriter = Arc::new(Mutex::new(BufWriter::new(stdin)));
        let closed = Arc::new(AtomicBool::new(false));

        let reader_handle = tokio::spawn(Self::reader_loop(
            name.to_string(),
            stdout,
            Arc::clone(&pending_responses),
            Arc::clone(&writer),
            Arc::clone(&closed),
        ));
        let stderr_handle = tokio::spawn(Self::stderr_loop(name.to_string(), stderr));

        info!("MCP server '{}' started", name);
        Ok(Self {
            name: name.to_string(),
            _reader_handle: reader_handle,
            _stderr_handle: stderr_handle,
            pending_responses,
            writer,
            closed,
            child: Mutex::new(child),
            timeout,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Background reader loop: single owner of the child's stdout.
    ///
    /// - **Response** → `pending_responses` oneshot
    /// - **IncomingRequest** → answered inline (`ping` gets `{}`, anything
    ///   else gets "method not found")
    /// - **Notification** → logged and dropped
    ///
    /// On EOF the client is marked closed and every pending sender is
    /// dropped, so waiting requests fail with [`McpError::Closed`].
    async fn reader_loop(
        name: String,
        stdout: ChildStdout,
        pending_responses: PendingMap,
        writer: SharedWriter,
        closed: Arc<AtomicBool>,
    ) {
        let mut lines = BufReader::new(stdout).lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("MCP '{}': stdout closed", name);
                    break;
                }
                Err(e) => {
                    warn!("MCP '{}': read error: {}", name, e);
                    break;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            trace!("MCP '{}' received: {}", name, trimmed);

            let json_value: Value = match serde_json::from_str(trimmed) {
                Ok(v) => v,
                Err(e) => {
                    // Servers sometimes print banners on stdout.
                    debug!("MCP '{}': ignoring non-JSON line ({}): {}", name, e, trimmed);
                    continue;
                }
            };

            match classify_message(&json_value) {
                MessageKind::Response => {
                    let response: JsonRpcResponse = match serde_json::from_value(json_value) {
                        Ok(r) => r,
                        Err(e) => {
                            warn!("MCP '{}': failed to parse response: {}", name, e);
                            continue;
                        }
                    };
                    let Some(id) = response.id else {
                        continue;
                    };
                    let sender = {
                        let mut pending = pending_responses.write().await;
                        pending.remove(&id)
                    };
                    match sender {
                        Some(tx) => {
                            let _ = tx.send(response);
                        }
                        None => debug!("MCP '{}': no pending request for id={}", name, id),
                    }
                }
                MessageKind::IncomingRequest { id } => {
                    let method = json_value
                        .get("method")
                        .and_then(|m| m.as_str())
                        .unwrap_or_default();
                    let reply = if method == "ping" {
                        JsonRpcResponseOut::result(id, serde_json::json!({}))
                    } else {
                        debug!("MCP '{}': rejecting server request '{}'", name, method);
                        JsonRpcResponseOut::method_not_found(id, method)
                    };
                    if let Err(e) = write_line(&writer, &reply).await {
                        warn!("MCP '{}': failed to answer '{}': {}", name, method, e);
                    }
                }
                MessageKind::Notification => {
                    trace!(
                        "MCP '{}': notification {}",
                        name,
                        json_value
                            .get("method")
                            .and_then(|m| m.as_str())
                            .unwrap_or("?")
                    );
                }
            }
        }

        closed.store(true, Ordering::SeqCst);
        pending_responses.write().await.clear();
        info!("MCP '{}': reader loop ended", name);
    }

    /// Forward the server's stderr to the debug log.
    async fn stderr_loop(name: String, stderr: ChildStderr) {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!("MCP '{}' stderr: {}", name, line);
        }
    }

    /// Send a request and wait for the correlated response's `result`.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let request = JsonRpcRequest::new(method, params);
        let request_id = request.id;
        let (tx, rx) = oneshot::channel();

        {
            let mut pending = self.pending_responses.write().await;
            pending.insert(request_id, tx);
        }
        if self.is_closed() {
            self.pending_responses.write().await.remove(&request_id);
            return Err(McpError::Closed);
        }

        if let Err(e) = write_line(&self.writer, &request).await {
            self.pending_responses.write().await.remove(&request_id);
            return Err(e);
        }

        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(McpError::Closed),
            Err(_) => {
                self.pending_responses.write().await.remove(&request_id);
                warn!("MCP '{}': {} timed out after {:?}", self.name, method, self.timeout);
                return Err(McpError::Timeout(self.timeout));
            }
        };

        if let Some(error) = response.error {
            return Err(McpError::RpcError {
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Send a notification (no response expected).
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        if self.is_closed() {
            return Err(McpError::Closed);
        }
        write_line(&self.writer, &JsonRpcNotification::new(method, params)).await
    }

    /// Kill the server and wait for it to exit. Safe to call repeatedly.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("MCP '{}': already closed", self.name);
        }
        let mut child = self.child.lock().await;
        if let Ok(Some(_)) = child.try_wait() {
            return Ok(());
        }
        if let Err(e) = child.start_kill() {
            debug!("MCP '{}': kill failed: {}", self.name, e);
        }
        let _ = child.wait().await;
        info!("MCP server '{}' stopped", self.name);
        Ok(())
    }
}

async fn write_line<T: Serialize>(writer: &SharedWriter, message: &T) -> Result<()> {
    let json = serde_json::to_string(message)?;
    trace!("MCP sending: {}", json);
    let mut w = writer.lock().await;
    w.write_all(json.as_bytes()).await?;
    w.write_all(b"\n").await?;
    w.flush().await?;
    Ok(())
}

impl Drop for McpClient {
    fn drop(&mut self) {
        debug!("McpClient '{}' dropping, killing server process", self.name);
        let _ = self.child.get_mut().start_kill();
    }
}
