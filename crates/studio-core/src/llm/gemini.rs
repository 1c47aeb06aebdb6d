use crate::constants::endpoints;
use crate::error::StudioError;
use crate::llm::traits::*;
use futures::channel::mpsc;
use serde_json::Value;

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: endpoints::GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        )
    }

    fn part_to_json(part: &Part) -> Value {
        match part {
            Part::Text(text) => serde_json::json!({ "text": text }),
            Part::InlineData(inline) => serde_json::json!({
                "inlineData": {
                    "mimeType": inline.mime_type,
                    "data": inline.data,
                }
            }),
        }
    }

    pub(crate) fn build_request_body(context: &ChatContext, input: &ChatInput) -> Value {
        let contents: Vec<Value> = context
            .contents_for(input)
            .iter()
            .map(|c| {
                serde_json::json!({
                    "role": c.role.as_str(),
                    "parts": c.parts.iter().map(Self::part_to_json).collect::<Vec<_>>(),
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "temperature": context.config.temperature,
                "topP": context.config.top_p,
                "topK": context.config.top_k,
                "maxOutputTokens": context.config.max_output_tokens,
            },
        });

        if let Some(ref instruction) = context.system_instruction {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": instruction }]
            });
        }

        body
    }
}

/// Parse the JSON payload of one SSE `data:` line.
///
/// Returns the text carried by the first candidate (possibly empty), or the
/// provider's error message.
pub fn parse_sse_payload(data: &str) -> Result<String, String> {
    let value: Value = serde_json::from_str(data)
        .map_err(|e| format!("Failed to parse Gemini stream chunk: {e}"))?;

    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown Gemini API error");
        return Err(message.to_string());
    }

    let text = value
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default();

    Ok(text)
}

/// Raw response bytes not yet split into lines. A line is decoded only once
/// its newline has arrived, so a character split across network chunks is
/// never decoded in halves.
#[derive(Default)]
struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    fn next_line(&mut self) -> Option<String> {
        let end = self.bytes.iter().position(|b| *b == b'\n')?;
        let line: Vec<u8> = self.bytes.drain(..=end).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Whatever trailed the last newline.
    fn into_rest(self) -> Option<String> {
        (!self.bytes.is_empty()).then(|| String::from_utf8_lossy(&self.bytes).into_owned())
    }
}

/// Handle one complete SSE line. Returns false once the stream should stop.
fn dispatch_line(line: &str, tx: &mpsc::UnboundedSender<StreamEvent>) -> bool {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return true;
    };
    let data = data.trim();
    if data.is_empty() {
        return true;
    }
    if data == "[DONE]" {
        let _ = tx.unbounded_send(StreamEvent::Done);
        return false;
    }

    match parse_sse_payload(data) {
        Ok(text) => {
            if !text.is_empty() {
                let _ = tx.unbounded_send(StreamEvent::TextDelta(text));
            }
            true
        }
        Err(message) => {
            let _ = tx.unbounded_send(StreamEvent::Error(message));
            false
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    async fn chat_stream(
        &self,
        context: &ChatContext,
        input: &ChatInput,
    ) -> Result<mpsc::UnboundedReceiver<StreamEvent>, StudioError> {
        let url = self.stream_url(&context.model);
        let request_body = Self::build_request_body(context, input);

        tracing::debug!(model = %context.model, "Starting Gemini stream");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| StudioError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let detail = parse_sse_payload(&text).err().unwrap_or(text);
            return Err(StudioError::Transport(format!(
                "Gemini API error ({}): {}",
                status, detail
            )));
        }

        let (tx, rx) = mpsc::unbounded();

        let mut stream = response.bytes_stream();
        tokio::spawn(async move {
            use futures::StreamExt;
            let mut buffer = LineBuffer::default();

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.unbounded_send(StreamEvent::Error(e.to_string()));
                        return;
                    }
                };

                buffer.push(&chunk);

                while let Some(line) = buffer.next_line() {
                    if !dispatch_line(&line, &tx) {
                        return;
                    }
                }
            }

            if let Some(rest) = buffer.into_rest() {
                if !dispatch_line(&rest, &tx) {
                    return;
                }
            }
            let _ = tx.unbounded_send(StreamEvent::Done);
        });

        Ok(rx)
    }
}
