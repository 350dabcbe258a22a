//! Webhook endpoint: LINE events in, sun-times replies out.
//!
//! A single HTTP server hosts the signed webhook route and a health probe.
//! Events in one payload are processed strictly in order; each event's failure
//! is contained so the rest of the batch still runs.

mod payload;
mod server;

pub use payload::{EventMessage, InboundEvent, WebhookPayload};
pub use server::run_webhook;
