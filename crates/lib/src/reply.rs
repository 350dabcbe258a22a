//! Outbound LINE reply messages and the composers for each conversation branch.
//!
//! The reply API accepts up to five messages per reply token; this bot always
//! sends exactly one.

use crate::suntimes::SunTimes;
use serde::Serialize;

/// Cancel keyword recognized in text messages. The quick-reply cancel action
/// re-sends this exact string.
pub const CANCEL_KEYWORD: &str = "やめる";

/// One outbound message: text with an optional quick-reply menu.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyMessage {
    #[serde(rename = "type")]
    pub typ: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_reply: Option<QuickReply>,
}

impl ReplyMessage {
    fn text(text: impl Into<String>) -> Self {
        Self {
            typ: "text".to_string(),
            text: text.into(),
            quick_reply: None,
        }
    }
}

/// Quick-reply menu: a small set of suggested actions attached to a text message.
#[derive(Debug, Clone, Serialize)]
pub struct QuickReply {
    pub items: Vec<QuickReplyItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickReplyItem {
    #[serde(rename = "type")]
    pub typ: String,
    pub action: Action,
}

impl QuickReplyItem {
    fn new(action: Action) -> Self {
        Self {
            typ: "action".to_string(),
            action,
        }
    }
}

/// Quick-reply action: a canned message send or a location-share request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    Message { label: String, text: String },
    Location { label: String },
}

/// Sun-times summary for a shared location.
pub fn location_reply(times: &SunTimes) -> Vec<ReplyMessage> {
    vec![ReplyMessage::text(format!(
        "その地点は、\n日の出：{}\n日の入り：{}\n南中時刻：{}\n昼の長さ：{}\nです。",
        times.sunrise.time, times.sunset.time, times.solar_noon.time, times.day_length
    ))]
}

/// Farewell for the cancel keyword.
pub fn farewell_reply() -> Vec<ReplyMessage> {
    vec![ReplyMessage::text("またね。")]
}

/// Prompt for any other text, with quick-reply actions to cancel or share a location.
pub fn prompt_reply() -> Vec<ReplyMessage> {
    vec![ReplyMessage {
        typ: "text".to_string(),
        text: "日の出・日の入り時刻を調べるよ。地点を教えてね。".to_string(),
        quick_reply: Some(QuickReply {
            items: vec![
                QuickReplyItem::new(Action::Message {
                    label: CANCEL_KEYWORD.to_string(),
                    text: CANCEL_KEYWORD.to_string(),
                }),
                QuickReplyItem::new(Action::Location {
                    label: "Location".to_string(),
                }),
            ],
        }),
    }]
}
