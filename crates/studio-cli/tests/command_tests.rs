use studio_cli::commands::{handle_command, CommandResult};

// ========================================================================
// Command Parsing Tests (commands.rs)
// ========================================================================

// --- BASIC SLASH COMMANDS ---

#[test]
fn test_help_command() {
    let result = handle_command("/help");
    if let CommandResult::Message(msg) = result {
        assert!(msg.contains("Studio CLI Commands"));
        assert!(msg.contains("/attach"));
        assert!(msg.contains("/code"));
    } else {
        panic!("expected help text");
    }
}

#[test]
fn test_quit_aliases() {
    for cmd in ["/quit", "/exit", "/q"] {
        assert_eq!(handle_command(cmd), CommandResult::Quit);
    }
}

#[test]
fn test_plain_text_is_not_a_command() {
    assert_eq!(handle_command("hello there"), CommandResult::NotACommand);
}

#[test]
fn test_unknown_command() {
    let result = handle_command("/frobnicate");
    assert!(matches!(result, CommandResult::Message(ref m) if m.contains("Unknown command")));
}

#[test]
fn test_version_command() {
    let result = handle_command("/version");
    assert!(matches!(result, CommandResult::Message(ref m) if m.starts_with("Studio CLI v")));
}

// --- LIBRARY COMMANDS ---

#[test]
fn test_library_commands() {
    assert_eq!(handle_command("/new"), CommandResult::NewChat);
    assert_eq!(handle_command("/list"), CommandResult::ListPrompts);
    assert_eq!(handle_command("/save"), CommandResult::Save);
    assert_eq!(handle_command("/select abc123"), CommandResult::Select("abc123".into()));
    assert_eq!(handle_command("/delete abc123"), CommandResult::Delete("abc123".into()));
}

#[test]
fn test_rename_keeps_spaces() {
    assert_eq!(
        handle_command("/rename  Trip to Lisbon "),
        CommandResult::Rename("Trip to Lisbon".into())
    );
}

#[test]
fn test_commands_without_required_argument_show_usage() {
    for cmd in ["/select", "/delete", "/rename", "/system", "/attach", "/detach"] {
        let result = handle_command(cmd);
        assert!(
            matches!(result, CommandResult::Message(ref m) if m.starts_with("Usage:")),
            "{cmd} should print usage"
        );
    }
}

// --- RUN SETTINGS ---

#[test]
fn test_model_with_and_without_argument() {
    assert_eq!(handle_command("/model"), CommandResult::ShowModel);
    assert_eq!(
        handle_command("/model gemini-3-pro-preview"),
        CommandResult::SetModel("gemini-3-pro-preview".into())
    );
    assert_eq!(handle_command("/models"), CommandResult::ListModels);
}

#[test]
fn test_numeric_settings_parse() {
    assert_eq!(handle_command("/temp 0.4"), CommandResult::SetTemperature(0.4));
    assert_eq!(handle_command("/topp 0.8"), CommandResult::SetTopP(0.8));
    assert_eq!(handle_command("/topk 32"), CommandResult::SetTopK(32));
    assert_eq!(handle_command("/maxtokens 1024"), CommandResult::SetMaxTokens(1024));
}

#[test]
fn test_numeric_settings_reject_garbage() {
    for cmd in ["/temp warm", "/temp NaN", "/topp", "/topk -3", "/maxtokens lots"] {
        assert!(
            matches!(handle_command(cmd), CommandResult::Message(_)),
            "{cmd} should be rejected"
        );
    }
}

#[test]
fn test_system_instruction_takes_rest_of_line() {
    assert_eq!(
        handle_command("/system You are a pirate. Answer briefly."),
        CommandResult::SetSystem("You are a pirate. Answer briefly.".into())
    );
}

// --- EXPORT ---

#[test]
fn test_code_defaults_to_javascript() {
    assert_eq!(handle_command("/code"), CommandResult::Code("javascript".into()));
    assert_eq!(handle_command("/code python"), CommandResult::Code("python".into()));
}
