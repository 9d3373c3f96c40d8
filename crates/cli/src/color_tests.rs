// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn with_env<T>(no_color: Option<&str>, color: Option<&str>, f: impl FnOnce() -> T) -> T {
    for (key, value) in [("NO_COLOR", no_color), ("COLOR", color)] {
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }
    let out = f();
    std::env::remove_var("NO_COLOR");
    std::env::remove_var("COLOR");
    out
}

#[yare::parameterized(
    tty_default       = { None,      None,      true,  true },
    pipe_default      = { None,      None,      false, false },
    forced_on_pipe    = { None,      Some("1"), false, true },
    no_color_on_tty   = { Some("1"), None,      true,  false },
    no_color_beats_on = { Some("1"), Some("1"), true,  false },
    other_values      = { Some("0"), Some("0"), false, false },
)]
#[serial]
fn colour_decision(no_color: Option<&str>, color: Option<&str>, tty: bool, expected: bool) {
    assert_eq!(with_env(no_color, color, || decide(tty)), expected);
}

#[test]
#[serial]
fn forced_colour_styles_help() {
    let styled = with_env(None, Some("1"), styles);
    assert_ne!(format!("{:?}", styled), format!("{:?}", Styles::plain()));
}

#[yare::parameterized(
    plain   = { false, "boom" },
    colored = { true,  "\x1b[38;5;167mboom\x1b[0m" },
)]
fn error_paint(enabled: bool, expected: &str) {
    assert_eq!(error("boom", enabled), expected);
}

#[test]
fn warn_and_prompt_use_their_codes() {
    assert!(warn("stopped", true).starts_with("\x1b[38;5;179m"));
    assert!(prompt("porch> ", true).starts_with("\x1b[38;5;245m"));
    assert_eq!(prompt("porch> ", false), "porch> ");
}
