//! Configuration file parsing for devdeck
//!
//! Supports `<config_dir>/devdeck/config.toml` with `[cache]`, `[rpc]`,
//! `[devices]` and `[behavior]` sections.

pub mod settings;
pub mod types;

pub use settings::{default_config_dir, init_config_dir, load_settings};
pub use types::*;
