use anyhow::Result;
use clap::{Parser, Subcommand};
use discharge_client::api::{backend_for, QueryClient};
use discharge_client::attachment::SelectedFile;
use discharge_client::controller::ChatController;
use discharge_client::form::SimplifyForm;
use discharge_client::models::{ClientMode, Config, Message, Role};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "discharge-client")]
#[command(about = "Understand hospital discharge notes in plain language")]
struct CliArgs {
    /// Backend base URL. Overrides DISCHARGE_API_URL.
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Chat about a discharge summary, optionally with an attached document.
    Chat {
        /// `query` sends files with each message; `upload` extracts them once.
        #[arg(long, value_parser = parse_mode_arg)]
        mode: Option<ClientMode>,

        /// Image or PDF to attach before the first message.
        #[arg(long, value_name = "FILE")]
        attach: Option<PathBuf>,
    },
    /// Turn discharge notes into a structured summary. Use `-` for stdin.
    Simplify {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

fn parse_mode_arg(input: &str) -> std::result::Result<ClientMode, String> {
    input
        .parse::<ClientMode>()
        .map_err(|e| e.to_string())
}

fn print_message(message: &Message) {
    let speaker = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
        Role::System => "system",
    };
    let marker = if message.is_error { " (error)" } else { "" };
    println!("{}{}> {}", speaker, marker, message.content);
}

/// Print transcript entries appended since `printed`; returns the new count.
fn print_new(chat: &ChatController, printed: usize) -> usize {
    let messages = chat.messages();
    for message in messages.iter().skip(printed) {
        print_message(message);
    }
    messages.len()
}

async fn attach_file(chat: &ChatController, path: &str) {
    let result = match SelectedFile::from_path(path.as_ref()).await {
        Ok(file) => chat.select_file(file).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => {
            if let Some(attachment) = chat.attachment() {
                println!("attached {} ({})", attachment.name, attachment.kind);
            }
        }
        Err(e) => println!("! {}", e),
    }
}

async fn run_chat(config: Config, attach_path: Option<PathBuf>) -> Result<()> {
    info!("Connecting to {} in {} mode", config.api_url, config.mode);
    let chat = ChatController::new(backend_for(config.mode, &config.api_url));

    let mut printed = print_new(&chat, 0);
    if let Some(path) = attach_path {
        attach_file(&chat, &path.to_string_lossy()).await;
        printed = print_new(&chat, printed);
    }
    println!("Commands: /attach <file>, /detach, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end();
        match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) => break,
            ("/detach", _) => {
                chat.remove_attachment();
                println!("attachment removed");
            }
            ("/attach", path) if !path.trim().is_empty() => attach_file(&chat, path.trim()).await,
            ("/attach", _) => println!("! usage: /attach <file>"),
            _ => {
                if let Err(e) = chat.send_message(line).await {
                    println!("! {}", e);
                }
            }
        }
        printed = print_new(&chat, printed);
    }

    Ok(())
}

async fn run_simplify(config: Config, input: PathBuf) -> Result<()> {
    let notes = if input.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(&input).await?
    };

    let client = QueryClient::new(&config.api_url);
    let mut form = SimplifyForm::new();
    form.set_notes(notes);

    if !form.submit(&client).await {
        anyhow::bail!("No discharge notes to simplify");
    }

    match form.view() {
        Some(view) => {
            print!("{}", view);
            Ok(())
        }
        None => anyhow::bail!(form
            .error()
            .unwrap_or("Failed to simplify discharge notes")
            .to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "discharge_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(url) = args.api_url {
        config.api_url = discharge_client::models::normalize_base_url(&url);
    }

    let outcome = match args.command {
        Command::Chat { mode, attach } => {
            if let Some(mode) = mode {
                config.mode = mode;
            }
            run_chat(config, attach).await
        }
        Command::Simplify { input } => run_simplify(config, input).await,
    };

    if let Err(e) = outcome {
        error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}
