/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the application.
    Quit,
    /// Not a command - treat as a chat message.
    NotACommand,
    /// Start a fresh conversation.
    NewChat,
    /// List saved prompts.
    ListPrompts,
    /// Switch to a saved prompt by id (or unique id prefix).
    Select(String),
    /// Delete a saved prompt by id (or unique id prefix).
    Delete(String),
    /// Save the workspace into the current prompt.
    Save,
    /// Rename the current prompt.
    Rename(String),
    /// Show the active model.
    ShowModel,
    /// Change the model.
    SetModel(String),
    /// List the models on offer.
    ListModels,
    /// Replace the system instruction.
    SetSystem(String),
    SetTemperature(f64),
    SetTopP(f64),
    SetTopK(u32),
    SetMaxTokens(u32),
    /// Queue a file for the next message.
    Attach(String),
    /// Drop a queued attachment by id (or unique id prefix).
    Detach(String),
    /// Print the conversation as code in the given language.
    Code(String),
    /// Show the current run settings.
    ShowConfig,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,

        // Library commands
        "/new" => CommandResult::NewChat,
        "/list" | "/ls" => CommandResult::ListPrompts,
        "/select" | "/open" => with_arg(arg, "Usage: /select <prompt-id>", CommandResult::Select),
        "/delete" | "/rm" => with_arg(arg, "Usage: /delete <prompt-id>", CommandResult::Delete),
        "/save" => CommandResult::Save,
        "/rename" => with_arg(arg, "Usage: /rename <new name>", CommandResult::Rename),

        // Run settings
        "/model" => {
            if arg.is_empty() {
                CommandResult::ShowModel
            } else {
                CommandResult::SetModel(arg.to_string())
            }
        }
        "/models" => CommandResult::ListModels,
        "/system" => with_arg(arg, "Usage: /system <instruction>", CommandResult::SetSystem),
        "/temp" | "/temperature" => match arg.parse::<f64>() {
            Ok(v) if v.is_finite() => CommandResult::SetTemperature(v),
            _ => CommandResult::Message("Usage: /temp <0.0-2.0>".into()),
        },
        "/topp" => match arg.parse::<f64>() {
            Ok(v) if v.is_finite() => CommandResult::SetTopP(v),
            _ => CommandResult::Message("Usage: /topp <0.0-1.0>".into()),
        },
        "/topk" => match arg.parse::<u32>() {
            Ok(v) => CommandResult::SetTopK(v),
            Err(_) => CommandResult::Message("Usage: /topk <1-100>".into()),
        },
        "/maxtokens" => match arg.parse::<u32>() {
            Ok(v) => CommandResult::SetMaxTokens(v),
            Err(_) => CommandResult::Message("Usage: /maxtokens <100-8192>".into()),
        },
        "/config" | "/status" => CommandResult::ShowConfig,

        // Attachments
        "/attach" => with_arg(arg, "Usage: /attach <path>", CommandResult::Attach),
        "/detach" => with_arg(arg, "Usage: /detach <attachment-id>", CommandResult::Detach),

        // Export
        "/code" => {
            let lang = if arg.is_empty() { "javascript" } else { arg };
            CommandResult::Code(lang.to_string())
        }

        "/version" => CommandResult::Message(format!("Studio CLI v{}", env!("CARGO_PKG_VERSION"))),

        // Unknown command
        _ => {
            if input.starts_with('/') {
                CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands."))
            } else {
                CommandResult::NotACommand
            }
        }
    }
}

fn with_arg(arg: &str, usage: &str, build: fn(String) -> CommandResult) -> CommandResult {
    if arg.is_empty() {
        CommandResult::Message(usage.into())
    } else {
        build(arg.to_string())
    }
}

fn show_help() -> CommandResult {
    let help_text = "\
Studio CLI Commands

  PROMPTS
    /new                      Start a fresh conversation
    /list, /ls                List saved prompts
    /select <id>              Open a saved prompt
    /delete <id>              Delete a saved prompt
    /save                     Save the current conversation
    /rename <name>            Rename the current prompt

  RUN SETTINGS
    /model [id]               Show or change the model
    /models                   List available models
    /system <text>            Set the system instruction
    /temp <f>                 Temperature (0-2)
    /topp <f>                 Top-p (0-1)
    /topk <n>                 Top-k (1-100)
    /maxtokens <n>            Max output tokens (100-8192)
    /config, /status          Show the current settings

  ATTACHMENTS
    /attach <path>            Attach a file to the next message
    /detach <id>              Remove a pending attachment

  EXPORT
    /code [js|python|curl]    Print the conversation as code

  OTHER
    /help, /h                 Show this help message
    /version                  Show version information
    /exit, /quit, /q          Quit

Anything that does not start with / is sent to the model.";

    CommandResult::Message(help_text.into())
}
