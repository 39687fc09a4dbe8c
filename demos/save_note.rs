//! Ask the model to save a note and print what happens.
//!
//! Usage:
//!   ANTHROPIC_API_KEY=sk-... cargo run --example save_note
//!   ANTHROPIC_API_KEY=sk-... cargo run --example save_note -- --abort-on-invalid "Save a note ..."

use clap::Parser;
use note_agent::{
    save_note_registry, AnthropicProvider, Conversation, ConversationConfig, ConversationEvent,
    ValidationFailurePolicy,
};

const DEFAULT_PROMPT: &str = "Can you save a private note with the following details? \
Note: Remember to buy milk on the way home. \
Author: John Doe (johndoe@gmail.com). Priority: 4.";

#[derive(Parser)]
#[command(name = "save_note", about = "Validate and run a save_note tool call")]
struct Cli {
    /// Message sent to the model
    #[arg(default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// Model to use
    #[arg(long, default_value = "claude-sonnet-4-20250514")]
    model: String,

    /// Max output tokens per call
    #[arg(long, default_value_t = 1024)]
    max_tokens: u32,

    /// System prompt
    #[arg(long, short = 's')]
    system: Option<String>,

    /// Stop instead of reporting invalid tool input back to the model
    #[arg(long)]
    abort_on_invalid: bool,

    /// API base URL
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut provider = match AnthropicProvider::from_env() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(ref url) = cli.base_url {
        provider = provider.with_base_url(url);
    }

    let tools = save_note_registry();
    let config = ConversationConfig {
        model: cli.model.clone(),
        max_tokens: cli.max_tokens,
        system: cli.system.clone(),
        validation_failure: if cli.abort_on_invalid {
            ValidationFailurePolicy::Abort
        } else {
            ValidationFailurePolicy::ReportToModel
        },
    };
    let conversation = Conversation::new(&provider, &tools, config);

    eprintln!("\x1b[1;36myou>\x1b[0m {}", cli.prompt);

    let (tx, mut rx) = tokio::sync::mpsc::channel::<ConversationEvent>(64);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ConversationEvent::Text { content } => {
                    eprint!("\x1b[1;32mmodel>\x1b[0m ");
                    println!("{content}");
                }
                ConversationEvent::ToolCall { name, input } => {
                    eprintln!("\x1b[33m  [tool: {name}]\x1b[0m {input}");
                }
                ConversationEvent::ToolResult {
                    name,
                    output,
                    is_error,
                } => {
                    let tag = if is_error { "error" } else { "result" };
                    eprintln!("\x1b[33m  [{tag}: {name}]\x1b[0m {output}");
                }
                ConversationEvent::ModelCall { .. } | ConversationEvent::Finished { .. } => {}
            }
        }
    });

    let outcome = conversation.send_streaming(&cli.prompt, tx).await;
    printer.await.ok();

    match outcome {
        Ok(result) => {
            eprintln!(
                "\x1b[2m  [{} calls, {}in / {}out tokens]\x1b[0m",
                result.model_calls, result.usage.input_tokens, result.usage.output_tokens
            );
        }
        Err(e) => {
            eprintln!("\x1b[1;31merror:\x1b[0m {e}");
            std::process::exit(1);
        }
    }
}
