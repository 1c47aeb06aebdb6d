use futures::StreamExt;
use serde_json::json;
use studio_core::{
    ChatContext, ChatInput, GeminiClient, GenerationConfig, LlmClient, Part, StreamEvent,
    StudioError,
};
use wiremock::{
    matchers::{body_partial_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const STREAM_PATH: &str = "/models/gemini-2.5-flash:streamGenerateContent";

fn chunk(text: &str) -> String {
    let payload = json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    });
    format!("data: {payload}\r\n\r\n")
}

fn context() -> ChatContext {
    ChatContext::new(
        "gemini-2.5-flash",
        Some("Be brief".into()),
        GenerationConfig::default(),
    )
}

async fn collect(rx: futures::channel::mpsc::UnboundedReceiver<StreamEvent>) -> Vec<StreamEvent> {
    rx.collect().await
}

#[tokio::test]
async fn test_streams_text_fragments() {
    let server = MockServer::start().await;
    let body = format!("{}{}", chunk("Hi"), chunk(" there"));
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .and(query_param("alt", "sse"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = GeminiClient::new("test-key").with_base_url(server.uri());
    let rx = client
        .chat_stream(&context(), &ChatInput::Text("Hello".into()))
        .await
        .unwrap();

    assert_eq!(
        collect(rx).await,
        vec![
            StreamEvent::TextDelta("Hi".into()),
            StreamEvent::TextDelta(" there".into()),
            StreamEvent::Done,
        ]
    );
}

#[tokio::test]
async fn test_request_carries_parameters_and_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .and(body_partial_json(json!({
            "systemInstruction": { "parts": [{ "text": "Be brief" }] },
            "generationConfig": { "topK": 64, "maxOutputTokens": 8192 },
            "contents": [{
                "role": "user",
                "parts": [
                    { "inlineData": { "mimeType": "image/png", "data": "AAAA" } },
                    { "text": "What is this?" }
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(chunk("A cat"), "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new("test-key").with_base_url(format!("{}/", server.uri()));
    let input = ChatInput::Parts(vec![
        Part::inline("image/png", "AAAA"),
        Part::text("What is this?"),
    ]);
    let events = collect(client.chat_stream(&context(), &input).await.unwrap()).await;
    assert_eq!(events[0], StreamEvent::TextDelta("A cat".into()));
}

#[tokio::test]
async fn test_http_error_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid" }
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new("bad-key").with_base_url(server.uri());
    let err = client
        .chat_stream(&context(), &ChatInput::Text("Hello".into()))
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert!(matches!(err, StudioError::Transport(ref m) if m.contains("API key not valid")));
}

#[tokio::test]
async fn test_error_chunk_mid_stream_ends_with_error() {
    let server = MockServer::start().await;
    let body = format!(
        "{}data: {}\n\n{}",
        chunk("partial"),
        json!({ "error": { "message": "quota exceeded" } }),
        chunk("never seen")
    );
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = GeminiClient::new("test-key").with_base_url(server.uri());
    let events = collect(
        client
            .chat_stream(&context(), &ChatInput::Text("Hello".into()))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(
        events,
        vec![
            StreamEvent::TextDelta("partial".into()),
            StreamEvent::Error("quota exceeded".into()),
        ]
    );
}

#[tokio::test]
async fn test_final_line_without_newline_is_not_lost() {
    let server = MockServer::start().await;
    let body = chunk("tail");
    let body = body.trim_end().to_string();
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = GeminiClient::new("test-key").with_base_url(server.uri());
    let events = collect(
        client
            .chat_stream(&context(), &ChatInput::Text("Hello".into()))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(
        events,
        vec![StreamEvent::TextDelta("tail".into()), StreamEvent::Done]
    );
}

/// Serve `pieces` as separate chunks of a chunked SSE response, flushed one
/// at a time so the client sees them as distinct reads.
async fn serve_chunked(pieces: Vec<Vec<u8>>) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let length = text[..head_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if request.len() >= head_end + 4 + length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }

        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\n\r\n",
            )
            .await
            .unwrap();
        for piece in pieces {
            socket
                .write_all(format!("{:x}\r\n", piece.len()).as_bytes())
                .await
                .unwrap();
            socket.write_all(&piece).await.unwrap();
            socket.write_all(b"\r\n").await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
        socket.write_all(b"0\r\n\r\n").await.unwrap();
        socket.flush().await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_character_split_across_chunks_is_decoded_whole() {
    let body = chunk("h\u{e9}llo").into_bytes();
    let split = body.iter().position(|b| *b == 0xC3).unwrap() + 1;
    let base = serve_chunked(vec![body[..split].to_vec(), body[split..].to_vec()]).await;

    let client = GeminiClient::new("test-key").with_base_url(base);
    let events = collect(
        client
            .chat_stream(&context(), &ChatInput::Text("Hello".into()))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(
        events,
        vec![StreamEvent::TextDelta("h\u{e9}llo".into()), StreamEvent::Done]
    );
}

#[tokio::test]
async fn test_unreachable_server_is_transport_failure() {
    let client = GeminiClient::new("test-key").with_base_url("http://127.0.0.1:1");
    let err = client
        .chat_stream(&context(), &ChatInput::Text("Hello".into()))
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert!(matches!(err, StudioError::Transport(_)));
}
