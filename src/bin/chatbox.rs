//! Interactive chat application for conversing with Gemini.
//!
//! Every prompt is sent on its own, without the earlier turns, and the answer
//! is revealed word by word.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings; the key comes from GEMINI_API_KEY
//! chatbox
//!
//! # Specify a model
//! chatbox --model gemini-2.5-pro
//!
//! # Disable colors (useful for piping output)
//! chatbox --no-color
//!
//! # Log requests to stderr
//! CHATBOX_LOG=chatbox=debug chatbox
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/new` - Start a new chat, keeping the prompt history
//! - `/history` - List previous prompts
//! - `/recent <n>` - Send a previous prompt again
//! - `/status` - Show the current turn
//! - `/quit` - Exit the application
//!
//! Ctrl+C while an answer is revealed shows the rest at once; while waiting
//! for the model it abandons the turn.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;

use chatbox::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatEvent, ChatSession, PlainTextRenderer, Renderer,
    SubmitOutcome, help_text, parse_command,
};
use chatbox::{Gemini, GeminiModelClient};

const GREETING: &str = "Hello, User. How can I help you today?";

/// How often the interrupt flag is checked while waiting.
const INTERRUPT_POLL: Duration = Duration::from_millis(25);

type Session = ChatSession<GeminiModelClient>;

/// Main entry point for the chatbox application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("chatbox [OPTIONS]");
    let config = ChatConfig::from(args);
    let use_color = config.use_color;

    let filter =
        EnvFilter::try_from_env("CHATBOX_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let client = Gemini::with_options(None, config.base_url.clone())?;
    let model = config.model.clone();
    let (session, mut events) =
        ChatSession::with_events(GeminiModelClient::new(client, model.clone()), config);
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;

    // Flag for interrupt handling during a turn
    let interrupted = Arc::new(AtomicBool::new(false));

    // Set up Ctrl+C handler
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!("Gemini Chat (model: {model})");
    println!("Type /help for commands, /quit to exit\n");
    println!("{GREETING}\n");

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::New => {
                            session.reset_turn();
                            renderer.print_info("New chat started.");
                            println!("{GREETING}\n");
                        }
                        ChatCommand::History => {
                            print_history(&session);
                        }
                        ChatCommand::Recent(index) => match session.history().get(index - 1) {
                            Some(prompt) => {
                                renderer.print_info(&format!("You: {prompt}"));
                                session.set_input(prompt.as_str());
                                run_turn(&session, &mut events, &mut renderer, &interrupted)
                                    .await;
                            }
                            None => renderer.print_error(&format!("No history entry {index}")),
                        },
                        ChatCommand::Status => {
                            print_status(&session);
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular message - send to API
                session.set_input(line);
                run_turn(&session, &mut events, &mut renderer, &interrupted).await;
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

/// Submits the input line and renders the turn until its reveal finishes.
async fn run_turn(
    session: &Session,
    events: &mut UnboundedReceiver<ChatEvent>,
    renderer: &mut PlainTextRenderer,
    interrupted: &AtomicBool,
) {
    // Anything left over belongs to an earlier turn.
    while events.try_recv().is_ok() {}
    interrupted.store(false, Ordering::Relaxed);

    renderer.print_loading();
    let mut submit = session.spawn_submit_input();
    let mut ticker = tokio::time::interval(INTERRUPT_POLL);
    let outcome = loop {
        tokio::select! {
            joined = &mut submit => break joined,
            _ = ticker.tick() => {
                if interrupted.swap(false, Ordering::Relaxed) {
                    session.abandon(&submit);
                    renderer.print_interrupted();
                    return;
                }
            }
        }
    };

    let turn = match outcome {
        Ok(SubmitOutcome::Completed(turn)) => turn,
        Ok(SubmitOutcome::Failed(_)) => {
            renderer.start_response();
            renderer.print_markup(&session.result_data());
            renderer.finish_response();
            return;
        }
        Ok(SubmitOutcome::Busy) => {
            renderer.print_error("still waiting for the previous answer");
            return;
        }
        Ok(SubmitOutcome::Ignored) | Ok(SubmitOutcome::Discarded(_)) => {
            println!();
            return;
        }
        Err(err) => {
            renderer.print_error(&format!("turn task failed: {err}"));
            return;
        }
    };

    renderer.start_response();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ChatEvent::Appended { turn: t, piece }) if t == turn => {
                    renderer.print_markup(&piece);
                }
                Some(ChatEvent::RevealFinished { turn: t }) if t == turn => break,
                Some(_) => {}
                None => break,
            },
            _ = ticker.tick() => {
                if interrupted.swap(false, Ordering::Relaxed) && !session.skip_reveal() {
                    break;
                }
            }
        }
    }
    renderer.finish_response();
}

fn print_history(session: &Session) {
    let history = session.history();
    if history.is_empty() {
        println!("    (no prompts yet)");
        return;
    }
    println!("    Recent prompts:");
    for (index, prompt) in history.iter().enumerate() {
        println!("      {:>3}. {}", index + 1, preview(prompt));
    }
}

fn print_status(session: &Session) {
    let snapshot = session.snapshot();
    let turn = session.turn();
    println!("    Turn {}: {:?}", turn.id, turn.status);
    println!("      Prompt: {}", describe(&snapshot.recent_prompt));
    println!("      Showing result: {}", snapshot.show_result);
    println!("      Loading: {}", snapshot.loading);
    println!("      Revealing: {}", session.is_revealing());
    println!("      Prompts in history: {}", snapshot.prev_prompts.len());
}

fn describe(text: &str) -> &str {
    if text.is_empty() { "(none)" } else { text }
}

/// Truncates long prompts for list display.
fn preview(prompt: &str) -> String {
    const MAX_CHARS: usize = 60;
    let line = prompt.lines().next().unwrap_or_default();
    if line.chars().count() > MAX_CHARS || line.len() < prompt.len() {
        let truncated: String = line.chars().take(MAX_CHARS).collect();
        format!("{truncated}...")
    } else {
        line.to_string()
    }
}
