//! Message classification for the stdio reader task.
//!
//! Every line the server prints is one JSON-RPC message. [`classify_message`]
//! decides whether it answers one of our requests, is a request from the
//! server, or is a notification.

/// Classification of an incoming JSON-RPC message.
#[derive(Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// A response to a request we sent (has `id`, no `method`).
    Response,
    /// A request from the server (has `id` + `method`), e.g. `ping`.
    IncomingRequest { id: u64 },
    /// A notification (has `method`, no `id`), e.g. `notifications/tools/list_changed`.
    Notification,
}

/// Classify a JSON-RPC message by inspecting `id` and `method` fields.
pub fn classify_message(json: &serde_json::Value) -> MessageKind {
    let has_id = json.get("id").and_then(|v| v.as_u64());
    let has_method = json.get("method").and_then(|v| v.as_str());

    match (has_id, has_method) {
        (Some(id), Some(_)) => MessageKind::IncomingRequest { id },
        (Some(_), None) => MessageKind::Response,
        _ => MessageKind::Notification,
    }
}
