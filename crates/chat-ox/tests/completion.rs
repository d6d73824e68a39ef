mod common;

use std::time::Duration;

use chat_ox::{CompletionError, Context, Message, Options, Provider};
use common::{Reply, ScriptedCaller, sse, text_body};

fn provider(caller: &ScriptedCaller) -> Provider {
    Provider::new(caller.clone())
}

#[tokio::test]
async fn test_complete_extracts_message_content() {
    let caller = ScriptedCaller::new([Reply::Body(text_body("Paris."))]);

    let answer = provider(&caller)
        .complete(&Context::new(), &[Message::user("capital of France?")], &Options::default())
        .await
        .unwrap();

    assert_eq!(answer, "Paris.");
    assert!(!caller.requests()[0].stream);
}

#[tokio::test]
async fn test_complete_returns_unparseable_body_verbatim() {
    let caller = ScriptedCaller::new([Reply::Chunks(vec!["not ".into(), "json".into()])]);

    let answer = provider(&caller)
        .complete(&Context::new(), &[Message::user("hi")], &Options::default())
        .await
        .unwrap();

    assert_eq!(answer, "not json");
}

#[tokio::test]
async fn test_system_prompt_prepended_exactly_once() {
    let caller = ScriptedCaller::new([
        Reply::Body(text_body("a")),
        Reply::Body(text_body("b")),
    ]);
    let options = Options::builder().system_prompt("Be terse.").build();
    let provider = provider(&caller);

    let plain = vec![Message::user("hi")];
    provider.complete(&Context::new(), &plain, &options).await.unwrap();
    let with_system = vec![Message::system("Original."), Message::user("hi")];
    provider.complete(&Context::new(), &with_system, &options).await.unwrap();

    let requests = caller.requests();
    assert_eq!(
        requests[0].messages,
        vec![Message::system("Be terse."), Message::user("hi")]
    );
    assert_eq!(requests[1].messages, with_system);
    assert_eq!(plain.len(), 1);
}

#[tokio::test]
async fn test_complete_stream_calls_back_per_delta() {
    let caller = ScriptedCaller::new([Reply::Chunks(sse(&["Hel", "lo", "!"]))]);
    let mut seen = Vec::new();

    provider(&caller)
        .complete_stream(&Context::new(), &[Message::user("hi")], &Options::default(), |delta| {
            seen.push(delta.to_string());
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(seen, vec!["Hel", "lo", "!"]);
    assert!(caller.requests()[0].stream);
}

#[tokio::test]
async fn test_complete_stream_without_sentinel_succeeds() {
    let mut lines = sse(&["a", "b"]);
    lines.pop();
    let caller = ScriptedCaller::new([Reply::Chunks(lines)]);
    let mut seen = String::new();

    provider(&caller)
        .complete_stream(&Context::new(), &[Message::user("hi")], &Options::default(), |delta| {
            seen.push_str(delta);
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(seen, "ab");
}

#[tokio::test]
async fn test_stream_unsupported_fails_before_calling() {
    let caller = ScriptedCaller::new([Reply::Body(text_body("unused"))]).without_streaming();

    let err = provider(&caller)
        .complete_stream(&Context::new(), &[Message::user("hi")], &Options::default(), |_| Ok(()))
        .await
        .unwrap_err();

    assert!(matches!(err, CompletionError::StreamUnsupported { .. }));
    assert_eq!(err.to_string(), "streaming not supported by this provider (scripted)");
    assert_eq!(caller.request_count(), 0);
}

#[tokio::test]
async fn test_callback_abort_stops_stream() {
    let caller = ScriptedCaller::new([Reply::Chunks(sse(&["one", "two", "three"]))]);
    let mut seen = 0;

    let err = provider(&caller)
        .complete_stream(&Context::new(), &[Message::user("hi")], &Options::default(), |_| {
            seen += 1;
            if seen == 2 {
                Err(CompletionError::aborted("consumer gone"))
            } else {
                Ok(())
            }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CompletionError::Aborted(_)));
    assert_eq!(seen, 2);
}

#[tokio::test]
async fn test_mid_stream_failure_is_decode_error() {
    let mut lines = sse(&["kept"]);
    lines.pop();
    let caller = ScriptedCaller::new([Reply::ChunksThenFail(lines)]);
    let mut seen = Vec::new();

    let err = provider(&caller)
        .complete_stream(&Context::new(), &[Message::user("hi")], &Options::default(), |delta| {
            seen.push(delta.to_string());
            Ok(())
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CompletionError::Decode { .. }));
    assert_eq!(seen, vec!["kept"]);
}

#[tokio::test]
async fn test_transport_error_carries_status_and_body() {
    let caller = ScriptedCaller::new([Reply::Status(401, "invalid api key".into())]);

    let err = provider(&caller)
        .complete(&Context::new(), &[Message::user("hi")], &Options::default())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    match err {
        CompletionError::Transport(chat_ox::CommonRequestError::Api { body, .. }) => {
            assert_eq!(&body[..], b"invalid api key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_complete_turn_falls_back_to_raw_body() {
    let caller = ScriptedCaller::new([Reply::Body("plain words".into())]);

    let turn = provider(&caller)
        .complete_turn(&Context::new(), &[Message::user("hi")], &Options::default())
        .await
        .unwrap();

    assert_eq!(turn.content, "plain words");
    assert!(turn.tool_calls.is_empty());
}

#[tokio::test]
async fn test_cancelled_context_abandons_call() {
    let caller = ScriptedCaller::new([Reply::Hang]);
    let ctx = Context::new();
    let cancel = ctx.clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    });
    let err = provider(&caller)
        .complete(&ctx, &[Message::user("hi")], &Options::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CompletionError::Cancelled));
    assert_eq!(caller.dropped(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_ends_hanging_stream() {
    let mut lines = sse(&["partial"]);
    lines.pop();
    let caller = ScriptedCaller::new([Reply::ChunksThenHang(lines)]);
    let ctx = Context::new().with_timeout(Duration::from_secs(30));
    let mut seen = Vec::new();

    let err = provider(&caller)
        .complete_stream(&ctx, &[Message::user("hi")], &Options::default(), |delta| {
            seen.push(delta.to_string());
            Ok(())
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CompletionError::DeadlineExceeded));
    assert_eq!(seen, vec!["partial"]);
}
