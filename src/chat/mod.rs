//! Chat application module for single-turn conversations with Gemini.
//!
//! This module provides the conversation state behind the chatbox REPL. It
//! supports:
//!
//! - One prompt/response turn at a time, with a history of prompts
//! - Word-by-word reveal of the rendered answer
//! - ANSI-styled output for bold runs
//! - Slash commands for session control
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Conversation state and model interaction
//! - [`commands`]: Slash command parsing
//! - [`render`]: Terminal output of revealed markup

mod commands;
mod config;
mod render;
mod session;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use render::{MarkupPrinter, PlainTextRenderer, Renderer};
pub use session::{
    ChatEvent, ChatSession, ChatSnapshot, LOCAL_ERROR_MESSAGE, SubmitOutcome, Turn, TurnId,
    TurnStatus,
};
