use crate::attachment::Attachment;
use crate::error::{Result, StudioError};
use crate::conversation::{Message, Role};
use crate::llm::{ChatContext, ChatInput, Content, GenerationConfig, LlmClient, Part, StreamEvent};
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Request parts for one turn: attachments first, typed text last.
pub fn message_parts(text: &str, attachments: &[Attachment]) -> Vec<Part> {
    let mut parts: Vec<Part> = attachments
        .iter()
        .map(|att| {
            if att.is_inline() {
                Part::inline(att.mime_type.clone(), att.base64_payload())
            } else {
                Part::text(format!("[User uploaded file: {}]\n{}", att.name, att.data))
            }
        })
        .collect();

    if !text.trim().is_empty() {
        parts.push(Part::text(text));
    }
    parts
}

pub fn build_input(text: &str, attachments: &[Attachment]) -> Result<ChatInput> {
    let parts = message_parts(text, attachments);
    if parts.is_empty() {
        return Err(StudioError::EmptyMessage);
    }
    Ok(ChatInput::from_parts(parts))
}

/// Provider-side turns equivalent to a finished message log.
///
/// Only completed exchanges count: a user message followed by a model reply
/// that neither failed nor is still streaming, the same turns a live session
/// records.
pub fn history_from_messages(messages: &[Message]) -> Vec<Content> {
    let mut history = Vec::new();
    let mut iter = messages.iter().peekable();
    while let Some(user) = iter.next() {
        if user.role != Role::User {
            continue;
        }
        let Some(reply) = iter.next_if(|m| m.role == Role::Model) else {
            continue;
        };
        if reply.error || reply.is_streaming {
            continue;
        }
        history.push(Content {
            role: Role::User,
            parts: message_parts(&user.text, &user.attachments),
        });
        history.push(Content {
            role: Role::Model,
            parts: vec![Part::text(reply.text.clone())],
        });
    }
    history
}

struct ContextSlot {
    /// Bumped on every `initialize`, so a reply that arrives after a
    /// reconfiguration is not written into the new context.
    generation: u64,
    context: Option<ChatContext>,
}

/// Clears the in-flight flag when a send finishes, however it finishes.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| StudioError::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Holds the active model, system instruction and generation parameters and
/// streams turns through an injected [`LlmClient`].
pub struct ChatSession {
    client: Arc<dyn LlmClient>,
    slot: Mutex<ContextSlot>,
    in_flight: AtomicBool,
}

impl ChatSession {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            slot: Mutex::new(ContextSlot {
                generation: 0,
                context: None,
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    fn slot(&self) -> MutexGuard<'_, ContextSlot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// (Re)create the provider-side context. Prior turns are forgotten.
    pub fn initialize(
        &self,
        model: impl Into<String>,
        system_instruction: Option<String>,
        config: GenerationConfig,
    ) {
        self.initialize_with_history(model, system_instruction, config, Vec::new());
    }

    /// Like [`initialize`](Self::initialize), but the new context starts out
    /// knowing `history`.
    pub fn initialize_with_history(
        &self,
        model: impl Into<String>,
        system_instruction: Option<String>,
        config: GenerationConfig,
        history: Vec<Content>,
    ) {
        let context = ChatContext::new(model, system_instruction, config).with_history(history);
        tracing::info!(
            model = %context.model,
            history = context.history().len(),
            temperature = context.config.temperature,
            top_p = context.config.top_p,
            top_k = context.config.top_k,
            max_output_tokens = context.config.max_output_tokens,
            "Initializing chat session"
        );
        let mut slot = self.slot();
        slot.generation += 1;
        slot.context = Some(context);
    }

    pub fn is_initialized(&self) -> bool {
        self.slot().context.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn model(&self) -> Option<String> {
        self.slot().context.as_ref().map(|c| c.model.clone())
    }

    pub fn system_instruction(&self) -> Option<String> {
        self.slot()
            .context
            .as_ref()
            .and_then(|c| c.system_instruction.clone())
    }

    pub fn config(&self) -> Option<GenerationConfig> {
        self.slot().context.as_ref().map(|c| c.config)
    }

    /// Turns remembered by the provider-side context (two per exchange).
    pub fn history_len(&self) -> usize {
        self.slot()
            .context
            .as_ref()
            .map(|c| c.history().len())
            .unwrap_or(0)
    }

    /// Send one turn and stream the reply.
    ///
    /// `on_progress` receives the cumulative text after every fragment, so
    /// each call replaces whatever was displayed before. Returns the final
    /// text. Only one send may be outstanding; a second concurrent call fails
    /// with [`StudioError::Busy`].
    pub async fn send_stream<F>(
        &self,
        text: &str,
        attachments: &[Attachment],
        mut on_progress: F,
    ) -> Result<String>
    where
        F: FnMut(&str),
    {
        let (generation, context) = {
            let slot = self.slot();
            let context = slot.context.clone().ok_or(StudioError::NotInitialized)?;
            (slot.generation, context)
        };
        let _in_flight = InFlight::acquire(&self.in_flight)?;
        let input = build_input(text, attachments)?;

        tracing::debug!(
            model = %context.model,
            attachments = attachments.len(),
            "Sending message"
        );

        let mut rx = self.client.chat_stream(&context, &input).await?;
        let mut full_text = String::new();

        while let Some(event) = rx.next().await {
            match event {
                StreamEvent::TextDelta(fragment) => {
                    if fragment.is_empty() {
                        continue;
                    }
                    full_text.push_str(&fragment);
                    on_progress(&full_text);
                }
                StreamEvent::Done => break,
                StreamEvent::Error(e) => {
                    tracing::warn!("Stream failed after {} bytes: {}", full_text.len(), e);
                    return Err(StudioError::Transport(e));
                }
            }
        }

        let mut slot = self.slot();
        if slot.generation == generation {
            if let Some(ctx) = slot.context.as_mut() {
                ctx.record_turn(&input, full_text.clone());
            }
        } else {
            tracing::debug!("Session re-initialized during send; reply not kept in context");
        }

        tracing::debug!("Stream complete: {} bytes", full_text.len());
        Ok(full_text)
    }
}
