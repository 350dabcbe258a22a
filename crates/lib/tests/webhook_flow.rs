//! Integration tests: start the webhook on a free port with mocked LINE and
//! sun-times endpoints, POST signed payloads, and assert the dispatch behavior.
//! No real network access; the server tasks are left running when tests end.

use lib::config::Config;
use lib::signature;
use lib::webhook;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const SECRET: &str = "test-channel-secret";
const TOKEN: &str = "test-access-token";

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

struct TestBot {
    url: String,
    line: MockServer,
    suntimes: MockServer,
}

async fn start_bot() -> TestBot {
    let line = MockServer::start().await;
    let suntimes = MockServer::start().await;
    let port = free_port();

    let mut config = Config::default();
    config.webhook.port = port;
    config.webhook.bind = "127.0.0.1".to_string();
    config.line.channel_secret = Some(SECRET.to_string());
    config.line.channel_access_token = Some(TOKEN.to_string());
    config.line.api_base = Some(line.uri());
    config.suntimes.api_base = Some(suntimes.uri());

    tokio::spawn(async move {
        let _ = webhook::run_webhook(config).await;
    });
    wait_until_healthy(port).await;

    TestBot {
        url: format!("http://127.0.0.1:{}", port),
        line,
        suntimes,
    }
}

async fn wait_until_healthy(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/", port);
    for _ in 0..100 {
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                let json: serde_json::Value = resp.json().await.expect("health JSON");
                assert_eq!(json.get("runtime").and_then(|v| v.as_str()), Some("running"));
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("webhook did not become healthy at {}", url);
}

fn sign(body: &str) -> String {
    signature::compute(SECRET, body.as_bytes()).expect("signature")
}

async fn post_webhook(bot: &TestBot, body: String) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/webhook", bot.url))
        .header("x-line-signature", sign(&body))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .expect("post webhook")
}

/// Successful lookup for Tokyo Station around the June solstice (UTC instants).
fn suntimes_ok_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "results": {
            "sunrise": "2024-06-21T19:25:40+00:00",
            "sunset": "2024-06-22T10:00:34+00:00",
            "solar_noon": "2024-06-22T02:43:07+00:00",
            "day_length": 52494
        },
        "status": "OK"
    }))
}

async fn mount_line_ok(line: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/reply"))
        .and(header("Authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(line)
        .await;
}

fn location_event(reply_token: &str, lat: f64, lng: f64) -> serde_json::Value {
    serde_json::json!({
        "type": "message",
        "replyToken": reply_token,
        "message": {"type": "location", "latitude": lat, "longitude": lng}
    })
}

fn text_event(reply_token: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "message",
        "replyToken": reply_token,
        "message": {"type": "text", "text": text}
    })
}

fn reply_bodies(requests: &[Request]) -> Vec<serde_json::Value> {
    requests
        .iter()
        .map(|r| serde_json::from_slice(&r.body).expect("reply body JSON"))
        .collect()
}

#[tokio::test]
async fn location_event_replies_with_local_sun_times() {
    let bot = start_bot().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .and(query_param("lat", "35.681"))
        .and(query_param("lng", "139.767"))
        .and(query_param("formatted", "0"))
        .respond_with(suntimes_ok_response())
        .mount(&bot.suntimes)
        .await;
    mount_line_ok(&bot.line).await;

    let body = serde_json::json!({"events": [location_event("r-loc", 35.681, 139.767)]});
    let resp = post_webhook(&bot, body.to_string()).await;
    assert_eq!(resp.status(), 200);
    let resp_json: serde_json::Value = resp.json().await.expect("response JSON");
    assert_eq!(resp_json, serde_json::json!({}));

    let requests = bot.line.received_requests().await.expect("recording on");
    assert_eq!(requests.len(), 1);
    let reply = &reply_bodies(&requests)[0];
    assert_eq!(reply.get("replyToken").and_then(|v| v.as_str()), Some("r-loc"));
    let messages = reply.get("messages").and_then(|v| v.as_array()).expect("messages");
    assert_eq!(messages.len(), 1);
    let text = messages[0].get("text").and_then(|v| v.as_str()).expect("text");
    // All four fields interpolated as Japan local HH:MM:SS strings.
    assert!(text.contains("日の出：04:25:40"), "unexpected reply: {}", text);
    assert!(text.contains("日の入り：19:00:34"), "unexpected reply: {}", text);
    assert!(text.contains("南中時刻：11:43:07"), "unexpected reply: {}", text);
    assert!(text.contains("昼の長さ：14:34:54"), "unexpected reply: {}", text);
    assert!(messages[0].get("quickReply").is_none());
}

#[tokio::test]
async fn failed_lookup_skips_event_without_aborting_batch() {
    let bot = start_bot().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": "INVALID_REQUEST"})),
        )
        .mount(&bot.suntimes)
        .await;
    mount_line_ok(&bot.line).await;

    let body = serde_json::json!({"events": [
        location_event("r-bad", 999.0, 999.0),
        text_event("r-bye", "やめる")
    ]});
    let resp = post_webhook(&bot, body.to_string()).await;
    assert_eq!(resp.status(), 200);

    // The failed lookup produced no reply; the following event still did.
    let requests = bot.line.received_requests().await.expect("recording on");
    assert_eq!(requests.len(), 1);
    let reply = &reply_bodies(&requests)[0];
    assert_eq!(reply.get("replyToken").and_then(|v| v.as_str()), Some("r-bye"));
    let messages = reply.get("messages").and_then(|v| v.as_array()).expect("messages");
    assert_eq!(messages[0].get("text").and_then(|v| v.as_str()), Some("またね。"));
}

#[tokio::test]
async fn other_text_gets_prompt_with_quick_reply_menu() {
    let bot = start_bot().await;
    mount_line_ok(&bot.line).await;

    let body = serde_json::json!({"events": [text_event("r-text", "こんにちは")]});
    let resp = post_webhook(&bot, body.to_string()).await;
    assert_eq!(resp.status(), 200);

    let requests = bot.line.received_requests().await.expect("recording on");
    assert_eq!(requests.len(), 1);
    let reply = &reply_bodies(&requests)[0];
    let message = &reply.get("messages").and_then(|v| v.as_array()).expect("messages")[0];
    let items = message
        .pointer("/quickReply/items")
        .and_then(|v| v.as_array())
        .expect("quick reply items");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].pointer("/action/type").and_then(|v| v.as_str()), Some("message"));
    assert_eq!(items[0].pointer("/action/text").and_then(|v| v.as_str()), Some("やめる"));
    assert_eq!(items[1].pointer("/action/type").and_then(|v| v.as_str()), Some("location"));
}

#[tokio::test]
async fn non_message_and_unsupported_subtypes_are_skipped() {
    let bot = start_bot().await;
    mount_line_ok(&bot.line).await;

    let body = serde_json::json!({"events": [
        {"type": "follow", "replyToken": "r-follow"},
        {"type": "message", "replyToken": "r-sticker",
         "message": {"type": "sticker", "packageId": "446", "stickerId": "1988"}}
    ]});
    let resp = post_webhook(&bot, body.to_string()).await;
    assert_eq!(resp.status(), 200);

    let requests = bot.line.received_requests().await.expect("recording on");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn invalid_signature_is_rejected_before_processing() {
    let bot = start_bot().await;
    mount_line_ok(&bot.line).await;

    let body = serde_json::json!({"events": [text_event("r-1", "hello")]}).to_string();
    let resp = reqwest::Client::new()
        .post(format!("{}/webhook", bot.url))
        .header("x-line-signature", "bm90LXRoZS1zaWduYXR1cmU=")
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .expect("post webhook");
    assert_eq!(resp.status(), 403);
    let resp_json: serde_json::Value = resp.json().await.expect("response JSON");
    assert_eq!(resp_json, serde_json::json!({}));

    assert!(bot.line.received_requests().await.expect("recording on").is_empty());
    assert!(bot.suntimes.received_requests().await.expect("recording on").is_empty());
}

#[tokio::test]
async fn missing_signature_header_is_rejected() {
    let bot = start_bot().await;

    let body = serde_json::json!({"events": []}).to_string();
    let resp = reqwest::Client::new()
        .post(format!("{}/webhook", bot.url))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .expect("post webhook");
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn canonical_header_spelling_is_accepted() {
    let bot = start_bot().await;

    let body = serde_json::json!({"events": []}).to_string();
    let resp = reqwest::Client::new()
        .post(format!("{}/webhook", bot.url))
        .header("X-Line-Signature", sign(&body))
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await
        .expect("post webhook");
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn unparseable_body_with_valid_signature_is_bad_request() {
    let bot = start_bot().await;

    let resp = post_webhook(&bot, "definitely not json".to_string()).await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn send_failure_surfaces_500_but_later_events_still_run() {
    let bot = start_bot().await;
    // First reply send fails, second succeeds (mounted in evaluation order).
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/reply"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream error"))
        .up_to_n_times(1)
        .mount(&bot.line)
        .await;
    mount_line_ok(&bot.line).await;

    let body = serde_json::json!({"events": [
        text_event("r-1", "first"),
        text_event("r-2", "second")
    ]});
    let resp = post_webhook(&bot, body.to_string()).await;
    assert_eq!(resp.status(), 500);

    // Both events attempted a send; the failure did not block the second.
    let requests = bot.line.received_requests().await.expect("recording on");
    assert_eq!(requests.len(), 2);
    let bodies = reply_bodies(&requests);
    assert_eq!(bodies[0].get("replyToken").and_then(|v| v.as_str()), Some("r-1"));
    assert_eq!(bodies[1].get("replyToken").and_then(|v| v.as_str()), Some("r-2"));
}
