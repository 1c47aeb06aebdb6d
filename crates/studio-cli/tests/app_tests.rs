use futures::channel::mpsc::{unbounded, UnboundedReceiver};
use std::sync::{Arc, Mutex};
use studio_cli::{apply_command, handle_command, send_message, Flow};
use studio_core::{ChatContext, ChatInput, LlmClient, Settings, Studio, StudioError, StreamEvent};

/// Mock LLM that returns pre-programmed stream event sequences.
struct MockLlm {
    responses: Mutex<Vec<Vec<StreamEvent>>>,
}

impl MockLlm {
    fn new(mut responses: Vec<Vec<StreamEvent>>) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlm {
    async fn chat_stream(
        &self,
        _context: &ChatContext,
        _input: &ChatInput,
    ) -> Result<UnboundedReceiver<StreamEvent>, StudioError> {
        let events = self
            .responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| vec![StreamEvent::Done]);
        let (tx, rx) = unbounded();
        for event in events {
            tx.unbounded_send(event).unwrap();
        }
        Ok(rx)
    }
}

fn studio(responses: Vec<Vec<StreamEvent>>) -> Studio {
    Studio::new(Arc::new(MockLlm::new(responses)), &Settings::default())
}

async fn run(studio: &mut Studio, line: &str) -> (Flow, String) {
    let mut out = Vec::new();
    let flow = apply_command(studio, handle_command(line), &mut out)
        .await
        .unwrap();
    (flow, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_streamed_reply_is_printed_once() {
    let mut studio = studio(vec![vec![
        StreamEvent::TextDelta("Hello".into()),
        StreamEvent::TextDelta(", world".into()),
        StreamEvent::Done,
    ]]);

    let mut out = Vec::new();
    send_message(&mut studio, "Hi", &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Hello, world\n");
}

#[tokio::test]
async fn test_failed_reply_prints_error_text() {
    let mut studio = studio(vec![vec![
        StreamEvent::TextDelta("Hel".into()),
        StreamEvent::Error("overloaded".into()),
    ]]);

    let mut out = Vec::new();
    send_message(&mut studio, "Hi", &mut out).await.unwrap();
    let printed = String::from_utf8(out).unwrap();
    assert!(printed.starts_with("Hel\nError: "));
    assert!(printed.contains("overloaded"));
}

#[tokio::test]
async fn test_empty_message_is_reported() {
    let mut studio = studio(vec![]);
    let mut out = Vec::new();
    send_message(&mut studio, "  ", &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Nothing to send.\n");
}

#[tokio::test]
async fn test_quit_stops_the_loop() {
    let mut studio = studio(vec![]);
    let (flow, _) = run(&mut studio, "/quit").await;
    assert_eq!(flow, Flow::Quit);
}

#[tokio::test]
async fn test_settings_are_clamped() {
    let mut studio = studio(vec![]);

    let (_, out) = run(&mut studio, "/temp 5").await;
    assert_eq!(out, "Temperature: 2\n");
    run(&mut studio, "/topk 0").await;
    run(&mut studio, "/maxtokens 20").await;

    let config = studio.workspace().config;
    assert_eq!(config.temperature, 2.0);
    assert_eq!(config.top_k, 1);
    assert_eq!(config.max_output_tokens, 100);
    assert_eq!(studio.session().config(), Some(config));
}

#[tokio::test]
async fn test_new_list_select_by_prefix() {
    let mut studio = studio(vec![]);
    let first = studio.library().current_id().unwrap().to_string();
    run(&mut studio, "/rename First").await;

    let (_, out) = run(&mut studio, "/new").await;
    assert!(out.starts_with("Started new prompt"));

    let (_, listing) = run(&mut studio, "/list").await;
    assert_eq!(listing.lines().count(), 2);
    assert!(listing.contains("First"));

    let (_, out) = run(&mut studio, &format!("/select {}", &first[..8])).await;
    assert!(out.contains("Opened \"First\""));
    assert_eq!(studio.library().current_id(), Some(first.as_str()));
}

#[tokio::test]
async fn test_delete_unknown_prompt() {
    let mut studio = studio(vec![]);
    let (_, out) = run(&mut studio, "/delete nope").await;
    assert_eq!(out, "No prompt matches nope\n");
    assert_eq!(studio.library().len(), 1);
}

#[tokio::test]
async fn test_attach_and_detach() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("todo.md");
    std::fs::write(&file, "- buy milk").unwrap();

    let mut studio = studio(vec![]);
    let (_, out) = run(&mut studio, &format!("/attach {}", file.display())).await;
    assert!(out.starts_with("Attached todo.md as Text"));

    let id = studio.workspace().pending.iter().next().unwrap().id.clone();
    let (_, out) = run(&mut studio, &format!("/detach {id}")).await;
    assert!(out.starts_with("Removed"));
    assert!(studio.workspace().pending.is_empty());

    let (_, out) = run(&mut studio, "/attach /definitely/not/here.txt").await;
    assert_eq!(out, "Could not read /definitely/not/here.txt\n");
}

#[tokio::test]
async fn test_code_prints_export() {
    let mut studio = studio(vec![vec![StreamEvent::TextDelta("Sure".into()), StreamEvent::Done]]);
    send_message(&mut studio, "Write a haiku", &mut Vec::<u8>::new())
        .await
        .unwrap();

    let (_, out) = run(&mut studio, "/code python").await;
    assert!(out.contains("from google import genai"));
    assert!(out.contains("Write a haiku"));
    assert!(out.contains("Sure"));
}
