//! Rendering the current conversation as a runnable code sample.

use crate::constants::{defaults, endpoints};
use crate::conversation::Message;
use crate::library::Workspace;
use crate::llm::GenerationConfig;
use std::fmt::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetLanguage {
    JavaScript,
    Python,
    Curl,
}

impl TargetLanguage {
    pub const ALL: [TargetLanguage; 3] = [Self::JavaScript, Self::Python, Self::Curl];

    pub fn name(&self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Curl => "curl",
        }
    }
}

impl FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "js" | "javascript" | "node" => Ok(Self::JavaScript),
            "py" | "python" => Ok(Self::Python),
            "curl" | "sh" | "shell" => Ok(Self::Curl),
            other => Err(format!("unsupported target language: {other}")),
        }
    }
}

/// Everything the projector needs, detached from the live workspace.
#[derive(Debug, Clone)]
pub struct ConversationSnapshot {
    pub model_id: String,
    pub system_instruction: String,
    pub config: GenerationConfig,
    pub messages: Vec<Message>,
}

impl From<&Workspace> for ConversationSnapshot {
    fn from(ws: &Workspace) -> Self {
        Self {
            model_id: ws.model_id.clone(),
            system_instruction: ws.system_instruction.clone(),
            config: ws.config,
            messages: ws.messages.to_vec(),
        }
    }
}

impl ConversationSnapshot {
    /// Messages worth exporting: a stalled placeholder has neither text nor
    /// attachments and is dropped.
    fn exportable(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| !m.is_blank())
    }
}

/// Render `snapshot` as sample code for `target`. Unknown targets get a short
/// explanation instead of code.
pub fn project(snapshot: &ConversationSnapshot, target: &str) -> String {
    match target.parse::<TargetLanguage>() {
        Ok(lang) => project_to(snapshot, lang),
        Err(_) => format!(
            "Code generation for \"{}\" is not supported. Available targets: {}.",
            target,
            TargetLanguage::ALL
                .iter()
                .map(|l| l.name())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

pub fn project_to(snapshot: &ConversationSnapshot, lang: TargetLanguage) -> String {
    match lang {
        TargetLanguage::JavaScript => javascript(snapshot),
        TargetLanguage::Python => python(snapshot),
        TargetLanguage::Curl => curl(snapshot),
    }
}

/// A JSON string literal, which is also a valid JS and Python literal.
fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// Attachment names end up inside line comments; keep them on one line.
fn one_line(s: &str) -> String {
    s.chars().map(|c| if c.is_control() { ' ' } else { c }).collect()
}

fn javascript(snapshot: &ConversationSnapshot) -> String {
    let c = &snapshot.config;
    let mut history = String::new();
    for m in snapshot.exportable() {
        let _ = writeln!(history, "      {{");
        let _ = writeln!(history, "        role: \"{}\",", m.role.as_str());
        let _ = writeln!(history, "        parts: [");
        for a in &m.attachments {
            let _ = writeln!(
                history,
                "          // attachment omitted: {} ({})",
                one_line(&a.name),
                one_line(&a.mime_type)
            );
        }
        let _ = writeln!(history, "          {{ text: {} }},", quote(&m.text));
        let _ = writeln!(history, "        ],");
        let _ = writeln!(history, "      }},");
    }

    format!(
        r#"const {{ GoogleGenAI }} = require("@google/genai");

const ai = new GoogleGenAI({{ apiKey: process.env.{key_env} }});

async function run() {{
  const chat = ai.chats.create({{
    model: {model},
    config: {{
      systemInstruction: {system},
      temperature: {temperature},
      topP: {top_p},
      topK: {top_k},
      maxOutputTokens: {max_tokens},
    }},
    history: [
{history}    ],
  }});

  const stream = await chat.sendMessageStream({{ message: {next} }});
  for await (const chunk of stream) {{
    process.stdout.write(chunk.text ?? "");
  }}
}}

run();
"#,
        key_env = endpoints::GEMINI_API_KEY_ENV,
        model = quote(&snapshot.model_id),
        system = quote(&snapshot.system_instruction),
        temperature = c.temperature,
        top_p = c.top_p,
        top_k = c.top_k,
        max_tokens = c.max_output_tokens,
        history = history,
        next = quote(defaults::NEXT_MESSAGE_PLACEHOLDER),
    )
}

fn python(snapshot: &ConversationSnapshot) -> String {
    let c = &snapshot.config;
    let mut history = String::new();
    for m in snapshot.exportable() {
        let _ = writeln!(history, "        types.Content(");
        let _ = writeln!(history, "            role=\"{}\",", m.role.as_str());
        let _ = writeln!(history, "            parts=[");
        for a in &m.attachments {
            let _ = writeln!(
                history,
                "                # attachment omitted: {} ({})",
                one_line(&a.name),
                one_line(&a.mime_type)
            );
        }
        let _ = writeln!(
            history,
            "                types.Part.from_text(text={}),",
            quote(&m.text)
        );
        let _ = writeln!(history, "            ],");
        let _ = writeln!(history, "        ),");
    }

    format!(
        r#"import os

from google import genai
from google.genai import types

client = genai.Client(api_key=os.environ["{key_env}"])

chat = client.chats.create(
    model={model},
    config=types.GenerateContentConfig(
        system_instruction={system},
        temperature={temperature},
        top_p={top_p},
        top_k={top_k},
        max_output_tokens={max_tokens},
    ),
    history=[
{history}    ],
)

for chunk in chat.send_message_stream({next}):
    print(chunk.text or "", end="")
print()
"#,
        key_env = endpoints::GEMINI_API_KEY_ENV,
        model = quote(&snapshot.model_id),
        system = quote(&snapshot.system_instruction),
        temperature = c.temperature,
        top_p = c.top_p,
        top_k = c.top_k,
        max_tokens = c.max_output_tokens,
        history = history,
        next = quote(defaults::NEXT_MESSAGE_PLACEHOLDER),
    )
}

fn curl(snapshot: &ConversationSnapshot) -> String {
    let c = &snapshot.config;
    let mut contents: Vec<serde_json::Value> = snapshot
        .exportable()
        .map(|m| {
            let mut parts: Vec<serde_json::Value> = m
                .attachments
                .iter()
                .map(|a| {
                    serde_json::json!({
                        "inlineData": { "mimeType": a.mime_type, "data": "<BASE64_DATA>" }
                    })
                })
                .collect();
            parts.push(serde_json::json!({ "text": m.text }));
            serde_json::json!({ "role": m.role.as_str(), "parts": parts })
        })
        .collect();
    contents.push(serde_json::json!({
        "role": "user",
        "parts": [{ "text": defaults::NEXT_MESSAGE_PLACEHOLDER }]
    }));

    let body = serde_json::json!({
        "systemInstruction": { "parts": [{ "text": snapshot.system_instruction }] },
        "generationConfig": {
            "temperature": c.temperature,
            "topP": c.top_p,
            "topK": c.top_k,
            "maxOutputTokens": c.max_output_tokens,
        },
        "contents": contents,
    });
    let body = serde_json::to_string_pretty(&body).unwrap_or_default();

    format!(
        r#"#!/bin/sh
curl "{base}/models/{model}:streamGenerateContent?alt=sse" \
  -H "x-goog-api-key: ${key_env}" \
  -H "Content-Type: application/json" \
  -X POST \
  -d @- <<'EOF'
{body}
EOF
"#,
        base = endpoints::GEMINI_BASE_URL,
        model = snapshot.model_id,
        key_env = endpoints::GEMINI_API_KEY_ENV,
        body = body,
    )
}
