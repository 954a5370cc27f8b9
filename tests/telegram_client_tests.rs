use linkdigest::errors::DigestError;
use linkdigest::telegram::markup::retry_keyboard;
use linkdigest::telegram::{Messenger, PressAnswer, TelegramClient, TextFormat};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "123:abc";

fn client(server: &MockServer) -> TelegramClient {
    TelegramClient::with_api_base(TOKEN.to_string(), server.uri())
}

#[tokio::test]
async fn test_send_message_returns_message_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_partial_json(json!({
            "chat_id": -1002,
            "parse_mode": "HTML",
            "reply_markup": { "inline_keyboard": [[{ "text": "🔄 Retry", "callback_data": "retry" }]] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {
                "message_id": 321,
                "chat": { "id": -1002, "type": "channel" },
                "text": "x"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let id = client(&server)
        .send_message(-1002, "<b>x</b>", TextFormat::Html, Some(&retry_keyboard()))
        .await
        .expect("send ok");
    assert_eq!(id, 321);
}

#[tokio::test]
async fn test_unparseable_markup_maps_to_render_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: can't parse entities: Unsupported start tag \"h1\" at byte offset 0"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .send_message(-1002, "<h1>x</h1>", TextFormat::Html, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DigestError::RenderRejected(_)));
}

#[tokio::test]
async fn test_not_modified_edit_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/editMessageText")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: message is not modified: specified new message content and reply markup are exactly the same as a current content and reply markup of the message"
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .edit_message(-1002, 7, "same", TextFormat::Html, None)
        .await
        .expect("not modified counts as success");
}

#[tokio::test]
async fn test_edit_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/editMessageReplyMarkup")))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({
            "ok": false,
            "error_code": 502,
            "description": "Bad Gateway"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/editMessageReplyMarkup")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": true })))
        .mount(&server)
        .await;

    client(&server)
        .edit_keyboard(-1002, 7, None)
        .await
        .expect("second attempt succeeds");
}

#[tokio::test]
async fn test_other_client_errors_are_telegram_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/answerCallbackQuery")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: query is too old and response timeout expired or query ID is invalid"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .answer_press("cb-1", &PressAnswer::notice("hi"))
        .await
        .unwrap_err();
    match err {
        DigestError::TelegramError(msg) => assert!(msg.contains("query is too old")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_get_updates_parses_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getUpdates")))
        .and(body_partial_json(json!({ "offset": 41 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": [
                { "update_id": 41, "channel_post": {
                    "message_id": 1,
                    "chat": { "id": -1001, "type": "channel" },
                    "text": "https://example.com"
                } },
                { "update_id": 42, "edited_message": {} }
            ]
        })))
        .mount(&server)
        .await;

    let updates = client(&server).get_updates(Some(41)).await.expect("updates");
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].update_id, 41);
    assert!(updates[0].channel_post.is_some());
    assert!(updates[1].message.is_none());
}

#[tokio::test]
async fn test_get_me_reads_username() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getMe")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "id": 1, "is_bot": true, "first_name": "Digest", "username": "digest_bot" }
        })))
        .mount(&server)
        .await;

    let me = client(&server).get_me().await.expect("getMe");
    assert_eq!(me.username.as_deref(), Some("digest_bot"));
}
