//! Abstract input key event, independent of terminal library.
//!
//! A frontend converts its terminal events into [`InputKey`] at the
//! boundary, so the engine never depends on a terminal crate.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKey {
    /// Regular character key (a-z, 0-9, symbols, space)
    Char(char),
    /// Character with Ctrl modifier (Ctrl+c, Ctrl+s, ...)
    CharCtrl(char),

    Up,
    Down,
    Left,
    Right,

    Enter,
    Esc,
    Tab,
    /// Shift+Tab
    BackTab,
    Backspace,
}

