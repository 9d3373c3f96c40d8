// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Console palette: clap help styles and result painting.

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use std::io::IsTerminal;

pub mod codes {
    /// Help section headers: steel blue
    pub const HEADER: u8 = 74;
    /// Flags and literals in help: light grey
    pub const LITERAL: u8 = 250;
    /// Prompt and placeholders: medium grey
    pub const PROMPT: u8 = 245;
    /// Terminating failures: soft red
    pub const ERROR: u8 = 167;
    /// Error records, stops and cancellations: amber
    pub const WARN: u8 = 179;
}

const RESET: &str = "\x1b[0m";

/// Colour decision from the environment, falling back to `is_tty`.
///
/// `NO_COLOR=1` beats `COLOR=1`.
fn decide(is_tty: bool) -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    std::env::var("COLOR").is_ok_and(|v| v == "1") || is_tty
}

/// Colour for stdout (results, prompt, help).
pub fn should_colorize() -> bool {
    decide(std::io::stdout().is_terminal())
}

/// Colour for stderr (error records, failures).
pub fn should_colorize_stderr() -> bool {
    decide(std::io::stderr().is_terminal())
}

fn fg(code: u8) -> Style {
    Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(code))))
}

pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    Styles::styled()
        .header(fg(codes::HEADER))
        .usage(fg(codes::HEADER))
        .literal(fg(codes::LITERAL))
        .placeholder(fg(codes::PROMPT))
}

pub fn paint(code: u8, text: &str, enabled: bool) -> String {
    match enabled {
        true => format!("\x1b[38;5;{code}m{text}{RESET}"),
        false => text.to_string(),
    }
}

pub fn error(text: &str, enabled: bool) -> String {
    paint(codes::ERROR, text, enabled)
}

pub fn warn(text: &str, enabled: bool) -> String {
    paint(codes::WARN, text, enabled)
}

pub fn prompt(text: &str, enabled: bool) -> String {
    paint(codes::PROMPT, text, enabled)
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
