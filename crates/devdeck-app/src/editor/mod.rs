//! Generic settings editor
//!
//! One state machine ([`EditorState`]) serves every protocol; protocols only
//! supply a [`SettingsForm`].

pub mod form;
pub mod protocols;
pub mod state;

pub use form::{validate_fields, FieldKind, FieldSpec, SettingsForm};
pub use protocols::form_for;
pub use state::{EditorId, EditorOutcome, EditorPhase, EditorState};
