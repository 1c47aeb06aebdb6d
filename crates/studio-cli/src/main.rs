use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use studio_core::library::JsonPromptStore;
use studio_core::{Settings, Studio};

mod app;
mod commands;

#[derive(Parser)]
#[command(name = "studio")]
#[command(about = "Studio - streaming multimodal chat for the Gemini API")]
#[command(version)]
struct Cli {
    /// Send a single message and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Attach a file to the first message (repeatable)
    #[arg(short, long)]
    attach: Vec<PathBuf>,

    /// Gemini model to use
    #[arg(short, long)]
    model: Option<String>,

    /// System instruction for the conversation
    #[arg(short, long)]
    system: Option<String>,

    /// After a one-shot prompt, print the conversation as code (js, python, curl)
    #[arg(long)]
    export: Option<String>,

    /// Keep the prompt library in memory instead of on disk
    #[arg(long)]
    no_save: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load();
    if let Some(ref model) = cli.model {
        settings.gemini.model = model.clone();
    }
    if let Some(ref system) = cli.system {
        settings.system_instruction = system.clone();
    }

    let client = settings.build_client()?;
    let mut studio = if cli.no_save {
        Studio::new(client, &settings)
    } else {
        let store = match settings.library.dir {
            Some(ref dir) => JsonPromptStore::with_dir(dir)?,
            None => JsonPromptStore::new()?,
        };
        Studio::with_store(client, &settings, Box::new(store))?
    };

    // a restored prompt carries its own parameters; explicit flags win
    if let Some(model) = cli.model {
        studio.set_model(model);
    }
    if let Some(system) = cli.system {
        studio.set_system_instruction(system);
    }

    if !cli.attach.is_empty() {
        let added = studio.attach_paths(&cli.attach).await;
        if added < cli.attach.len() {
            eprintln!("Attached {added} of {} files", cli.attach.len());
        }
    }

    if let Some(prompt) = cli.prompt {
        app::run_single_prompt(studio, &prompt, cli.export.as_deref()).await?;
    } else {
        app::run_repl(studio).await?;
    }

    Ok(())
}
