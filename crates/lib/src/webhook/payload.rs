//! LINE webhook wire types (inbound payload).

use serde::Deserialize;

/// Webhook request body: `{ "events": [...] }`.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub events: Vec<InboundEvent>,
}

/// One event from the payload. Only `type == "message"` entries are processed.
#[derive(Debug, Deserialize)]
pub struct InboundEvent {
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(default)]
    pub message: Option<EventMessage>,
    /// Single-use token correlating this event to at most one reply call.
    #[serde(rename = "replyToken", default)]
    pub reply_token: Option<String>,
}

/// Message content union, keyed by the wire `type` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventMessage {
    /// Shared location: answered with the sun times for the coordinates.
    Location { latitude: f64, longitude: f64 },
    /// Free text: cancel keyword or anything else (prompt).
    Text { text: String },
    /// Stickers, images, and other subtypes are skipped.
    #[serde(other)]
    Other,
}
