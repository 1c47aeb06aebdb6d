use anyhow::Result;
use std::io::Write;
use studio_core::constants::models;
use studio_core::{Studio, StudioError};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{handle_command, CommandResult};

/// Whether the REPL keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

// ── Sending ─────────────────────────────────────────────────────────────

/// Send one message and echo the reply to `out` as it streams in.
pub async fn send_message<W: Write>(studio: &mut Studio, text: &str, out: &mut W) -> Result<()> {
    let mut printed = 0;
    let result = studio
        .send(text, |full| {
            // progress is cumulative; print only what is new
            if let Some(new) = full.get(printed..) {
                let _ = write!(out, "{new}");
                let _ = out.flush();
            }
            printed = full.len();
        })
        .await;

    let id = match result {
        Ok(id) => id,
        Err(StudioError::EmptyMessage) => {
            writeln!(out, "Nothing to send.")?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match studio.workspace().messages.get(&id) {
        Some(reply) if reply.error => writeln!(out, "\n{}", reply.text)?,
        _ => writeln!(out)?,
    }
    Ok(())
}

// ── Command dispatch ────────────────────────────────────────────────────

/// Find a saved prompt by exact id or unique id prefix.
fn resolve_prompt_id(studio: &Studio, needle: &str) -> Option<String> {
    let ids = studio.library().prompts().iter().map(|p| p.id.as_str());
    resolve(ids, needle)
}

fn resolve_attachment_id(studio: &Studio, needle: &str) -> Option<String> {
    let ids = studio.workspace().pending.iter().map(|a| a.id.as_str());
    resolve(ids, needle)
}

fn resolve<'a>(ids: impl Iterator<Item = &'a str>, needle: &str) -> Option<String> {
    let matches: Vec<&str> = ids.filter(|id| id.starts_with(needle)).collect();
    if let Some(exact) = matches.iter().find(|id| **id == needle) {
        return Some(exact.to_string());
    }
    match matches.as_slice() {
        [only] => Some(only.to_string()),
        _ => None,
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn format_millis(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_default()
}

fn list_prompts<W: Write>(studio: &Studio, out: &mut W) -> Result<()> {
    let current = studio.library().current_id();
    for prompt in studio.library().prompts() {
        let marker = if Some(prompt.id.as_str()) == current { "*" } else { " " };
        writeln!(
            out,
            "{marker} {}  {:<32} {:>3} msgs  {}",
            short_id(&prompt.id),
            prompt.name,
            prompt.messages.len(),
            format_millis(prompt.updated_at)
        )?;
    }
    Ok(())
}

fn show_config<W: Write>(studio: &Studio, out: &mut W) -> Result<()> {
    let ws = studio.workspace();
    let c = &ws.config;
    writeln!(out, "Prompt:            {}", ws.prompt_name)?;
    writeln!(out, "Model:             {}", ws.model_id)?;
    writeln!(out, "System:            {}", ws.system_instruction)?;
    writeln!(out, "Temperature:       {}", c.temperature)?;
    writeln!(out, "Top-p:             {}", c.top_p)?;
    writeln!(out, "Top-k:             {}", c.top_k)?;
    writeln!(out, "Max output tokens: {}", c.max_output_tokens)?;
    writeln!(out, "Sync:              {:?}", studio.sync_policy())?;
    writeln!(out, "Messages:          {}", ws.messages.len())?;
    for att in ws.pending.iter() {
        writeln!(out, "Pending:           {} {} ({})", short_id(&att.id), att.name, att.mime_type)?;
    }
    Ok(())
}

/// Apply a parsed slash command to the studio, reporting to `out`.
pub async fn apply_command<W: Write>(
    studio: &mut Studio,
    command: CommandResult,
    out: &mut W,
) -> Result<Flow> {
    match command {
        CommandResult::Quit => return Ok(Flow::Quit),
        CommandResult::NotACommand => {}
        CommandResult::Message(msg) => writeln!(out, "{msg}")?,

        CommandResult::NewChat => {
            let id = studio.new_chat();
            writeln!(out, "Started new prompt {}", short_id(&id))?;
        }
        CommandResult::ListPrompts => list_prompts(studio, out)?,
        CommandResult::Select(needle) => match resolve_prompt_id(studio, &needle) {
            Some(id) if studio.select(&id) => {
                let ws = studio.workspace();
                writeln!(out, "Opened \"{}\" ({} messages)", ws.prompt_name, ws.messages.len())?;
            }
            _ => writeln!(out, "No prompt matches {needle}")?,
        },
        CommandResult::Delete(needle) => match resolve_prompt_id(studio, &needle) {
            Some(id) if studio.delete(&id) => writeln!(out, "Deleted {}", short_id(&id))?,
            _ => writeln!(out, "No prompt matches {needle}")?,
        },
        CommandResult::Save => match studio.save()? {
            Some(prompt) => writeln!(out, "Saved \"{}\"", prompt.name)?,
            None => writeln!(out, "Nothing to save.")?,
        },
        CommandResult::Rename(name) => {
            if studio.rename(&name)? {
                writeln!(out, "Renamed to \"{name}\"")?;
            }
        }

        CommandResult::ShowModel => writeln!(out, "Model: {}", studio.workspace().model_id)?,
        CommandResult::SetModel(model) => {
            if !models::AVAILABLE.iter().any(|(id, _, _)| *id == model) {
                tracing::warn!("Model {} is not in the known list", model);
            }
            studio.set_model(model.clone());
            writeln!(out, "Model set to {model}")?;
        }
        CommandResult::ListModels => {
            let current = &studio.workspace().model_id;
            for (id, name, description) in models::AVAILABLE {
                let marker = if *id == current.as_str() { "*" } else { " " };
                writeln!(out, "{marker} {id:<24} {name} - {description}")?;
            }
        }
        CommandResult::SetSystem(text) => {
            studio.set_system_instruction(text);
            writeln!(out, "System instruction updated.")?;
        }
        CommandResult::SetTemperature(v) => {
            let mut config = studio.workspace().config;
            config.temperature = v;
            studio.set_config(config.clamped());
            writeln!(out, "Temperature: {}", studio.workspace().config.temperature)?;
        }
        CommandResult::SetTopP(v) => {
            let mut config = studio.workspace().config;
            config.top_p = v;
            studio.set_config(config.clamped());
            writeln!(out, "Top-p: {}", studio.workspace().config.top_p)?;
        }
        CommandResult::SetTopK(v) => {
            let mut config = studio.workspace().config;
            config.top_k = v;
            studio.set_config(config.clamped());
            writeln!(out, "Top-k: {}", studio.workspace().config.top_k)?;
        }
        CommandResult::SetMaxTokens(v) => {
            let mut config = studio.workspace().config;
            config.max_output_tokens = v;
            studio.set_config(config.clamped());
            writeln!(out, "Max output tokens: {}", studio.workspace().config.max_output_tokens)?;
        }
        CommandResult::ShowConfig => show_config(studio, out)?,

        CommandResult::Attach(path) => {
            if studio.attach_paths(&[path.as_str()]).await == 0 {
                writeln!(out, "Could not read {path}")?;
            } else if let Some(att) = studio.workspace().pending.iter().last() {
                writeln!(
                    out,
                    "Attached {} as {:?} ({}), id {}",
                    att.name,
                    att.kind,
                    att.mime_type,
                    short_id(&att.id)
                )?;
            }
        }
        CommandResult::Detach(needle) => match resolve_attachment_id(studio, &needle) {
            Some(id) if studio.remove_attachment(&id) => writeln!(out, "Removed {}", short_id(&id))?,
            _ => writeln!(out, "No pending attachment matches {needle}")?,
        },

        CommandResult::Code(lang) => writeln!(out, "{}", studio.export(&lang))?,
    }
    Ok(Flow::Continue)
}

// ── Entry points ────────────────────────────────────────────────────────

pub async fn run_single_prompt(mut studio: Studio, prompt: &str, export: Option<&str>) -> Result<()> {
    let mut stdout = std::io::stdout();
    send_message(&mut studio, prompt, &mut stdout).await?;
    if let Some(lang) = export {
        writeln!(stdout, "\n{}", studio.export(lang))?;
    }
    Ok(())
}

pub async fn run_repl(mut studio: Studio) -> Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(
        stdout,
        "Studio - {} ({}). Type /help for commands.",
        studio.workspace().prompt_name,
        studio.workspace().model_id
    )?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match handle_command(line) {
            CommandResult::NotACommand => {
                if let Err(e) = send_message(&mut studio, line, &mut stdout).await {
                    eprintln!("Error: {e}");
                }
            }
            command => match apply_command(&mut studio, command, &mut stdout).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => eprintln!("Error: {e}"),
            },
        }
    }
    Ok(())
}
