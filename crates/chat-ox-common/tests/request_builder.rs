use chat_ox_common::{
    AuthMethod, CommonRequestError, Endpoint, HttpMethod, OpenAiFrames, RequestBuilder,
    RequestConfig, decode_deltas,
};
use futures_util::StreamExt;
use serde_json::json;
use std::sync::Arc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, query_param},
};

fn builder(server: &MockServer, auth: AuthMethod) -> RequestBuilder {
    let config = RequestConfig::new(server.uri())
        .with_auth(auth)
        .with_header("x-client", "chat-ox");
    RequestBuilder::new(reqwest::Client::new(), config)
}

#[tokio::test]
async fn test_send_raw_applies_auth_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("x-client", "chat-ox"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({"model": "m"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = Endpoint::new("v1/chat/completions", HttpMethod::Post);
    let mut body = builder(&server, AuthMethod::Bearer("sk-test".to_string()))
        .send_raw(&endpoint, &json!({"model": "m"}))
        .await
        .unwrap();

    let mut collected = Vec::new();
    while let Some(chunk) = body.next().await {
        collected.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(collected, b"ok");
}

#[tokio::test]
async fn test_send_raw_query_param_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini:generateContent"))
        .and(query_param("key", "g-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = Endpoint::new("models/gemini:generateContent", HttpMethod::Post);
    let result = builder(
        &server,
        AuthMethod::QueryParam("key".to_string(), "g-key".to_string()),
    )
    .send_raw(&endpoint, &json!({}))
    .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_non_success_status_carries_code_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_string(r#"{"error":{"message":"slow down"}}"#),
        )
        .mount(&server)
        .await;

    let endpoint = Endpoint::new("chat/completions", HttpMethod::Post);
    let err = builder(&server, AuthMethod::Bearer("k".to_string()))
        .send_raw(&endpoint, &json!({}))
        .await
        .err()
        .expect("429 must fail");

    match err {
        CommonRequestError::Api {
            status,
            message,
            body,
        } => {
            assert_eq!(status, 429);
            assert_eq!(message, "slow down");
            assert_eq!(&body[..], br#"{"error":{"message":"slow down"}}"#);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_sse_body_decodes_end_to_end() {
    let server = MockServer::start().await;
    let sse = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"one \"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"two\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse),
        )
        .mount(&server)
        .await;

    let endpoint = Endpoint::new("chat/completions", HttpMethod::Post);
    let body = builder(&server, AuthMethod::Bearer("k".to_string()))
        .send_raw(&endpoint, &json!({"stream": true}))
        .await
        .unwrap();

    let deltas: Vec<String> = decode_deltas(body, Arc::new(OpenAiFrames))
        .map(|d| d.unwrap())
        .collect()
        .await;

    assert_eq!(deltas, vec!["one ", "two"]);
}
