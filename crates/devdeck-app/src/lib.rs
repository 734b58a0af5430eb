//! devdeck-app - Application state and orchestration for devdeck
//!
//! This crate implements the TEA (The Elm Architecture) pattern: a pure
//! `handler::update` reconciler over [`AppState`], background actions that
//! report back with exactly one [`Message`] each, the stale-while-revalidate
//! [`cache`], the generic settings [`editor`], configuration loading and the
//! [`Engine`] that ties them to a message channel.

pub mod actions;
pub mod cache;
pub mod config;
pub mod editor;
pub mod engine;
pub mod handler;
pub mod input_key;
pub mod message;
pub mod panel;
pub mod process;
pub mod state;

// Re-export primary types
pub use engine::Engine;
pub use handler::{update, UpdateAction, UpdateResult};
pub use input_key::InputKey;
pub use message::Message;
pub use panel::{PanelState, PanelView};
pub use state::{AppPhase, AppState, UiMode};
