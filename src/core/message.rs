// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Structured diagnostic and log messages.
//!
//! A message is a stable code plus ordered substitution parameters. The
//! built-in template catalog provides the default English rendering via
//! `Display`; hosts that localize render from the code and parameters
//! themselves, or consume the JSON projection.

use std::fmt;

use serde_json::{json, Value};

pub const DIAG_PARSE_BAD_ARG: &str = "rfp001";
pub const DIAG_PARSE_ARG_COUNT: &str = "rfp002";
pub const DIAG_PARSE_UNRECOGNIZED_LINE: &str = "rfp003";
pub const DIAG_RUN_NIL_CALLED: &str = "rfr001";
pub const DIAG_RUN_LABEL_MISSING: &str = "rfr002";
pub const DIAG_RUN_WRITE_TARGET: &str = "rfr003";
pub const DIAG_RUN_VALUE_UNREADABLE: &str = "rfr004";
pub const DIAG_RUN_ERROR_ON_LINE: &str = "rfr005";
pub const DIAG_LOG_CONSOLE: &str = "rfl001";

/// Instruction indices are cited as two uppercase hex digits, matching the
/// rows of the program listing.
pub fn index_display(index: u32) -> String {
    format!("{index:02X}")
}

/// One substitution parameter of a [`Message`].
#[derive(Clone, Debug, PartialEq)]
pub enum MessageParam {
    Number(f64),
    Text(String),
    Nested(Box<Message>),
}

impl fmt::Display for MessageParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
            Self::Nested(message) => message.fmt(f),
        }
    }
}

/// A diagnostic or log message: a stable code plus ordered parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    code: &'static str,
    params: Vec<MessageParam>,
}

impl Message {
    fn new(code: &'static str, params: Vec<MessageParam>) -> Self {
        Self { code, params }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn params(&self) -> &[MessageParam] {
        &self.params
    }

    pub(crate) fn bad_arg(token: &str) -> Self {
        Self::new(
            DIAG_PARSE_BAD_ARG,
            vec![MessageParam::Text(token.to_string())],
        )
    }

    pub(crate) fn arg_count(index: u32, op: &str, expected: usize, given: usize) -> Self {
        Self::new(
            DIAG_PARSE_ARG_COUNT,
            vec![
                MessageParam::Text(index_display(index)),
                MessageParam::Text(op.to_string()),
                MessageParam::Number(expected as f64),
                MessageParam::Number(given as f64),
            ],
        )
    }

    pub(crate) fn unrecognized_line(token: &str) -> Self {
        Self::new(
            DIAG_PARSE_UNRECOGNIZED_LINE,
            vec![MessageParam::Text(token.to_string())],
        )
    }

    pub(crate) fn nil_called() -> Self {
        Self::new(DIAG_RUN_NIL_CALLED, Vec::new())
    }

    pub(crate) fn label_missing(index: u32) -> Self {
        Self::new(
            DIAG_RUN_LABEL_MISSING,
            vec![MessageParam::Text(index_display(index))],
        )
    }

    pub(crate) fn write_target(op: &str, operand: String) -> Self {
        Self::new(
            DIAG_RUN_WRITE_TARGET,
            vec![MessageParam::Text(op.to_string()), MessageParam::Text(operand)],
        )
    }

    pub(crate) fn value_unreadable(operand: String) -> Self {
        Self::new(DIAG_RUN_VALUE_UNREADABLE, vec![MessageParam::Text(operand)])
    }

    pub(crate) fn on_line(index: u32, inner: Message) -> Self {
        Self::new(
            DIAG_RUN_ERROR_ON_LINE,
            vec![
                MessageParam::Text(index_display(index)),
                MessageParam::Nested(Box::new(inner)),
            ],
        )
    }

    pub(crate) fn console(params: Vec<MessageParam>) -> Self {
        Self::new(DIAG_LOG_CONSOLE, params)
    }

    /// JSON projection for machine consumers: `{"code": ..., "params": [...]}`.
    pub fn to_value(&self) -> Value {
        json!({
            "code": self.code,
            "params": self.params.iter().map(param_value).collect::<Vec<_>>(),
        })
    }
}

fn param_value(param: &MessageParam) -> Value {
    match param {
        MessageParam::Number(value) => json!(value),
        MessageParam::Text(text) => json!(text),
        MessageParam::Nested(message) => message.to_value(),
    }
}

fn template_for(code: &str) -> &'static str {
    match code {
        DIAG_PARSE_BAD_ARG => "could not parse argument {0}",
        DIAG_PARSE_ARG_COUNT => "line {0}: {1} expects at least {2} tokens, got {3}",
        DIAG_PARSE_UNRECOGNIZED_LINE => "unrecognized line starting with {0}",
        DIAG_RUN_NIL_CALLED => "internal placeholder operation invoked",
        DIAG_RUN_LABEL_MISSING => "line {0}: jump label does not exist",
        DIAG_RUN_WRITE_TARGET => "{0} requires a register, port, or channel destination; got {1}",
        DIAG_RUN_VALUE_UNREADABLE => "could not retrieve a value from {0}",
        DIAG_RUN_ERROR_ON_LINE => "error on line {0}: {1}",
        DIAG_LOG_CONSOLE => "{*}",
        _ => "{*}",
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = template_for(self.code);
        while let Some(start) = rest.find('{') {
            f.write_str(&rest[..start])?;
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                return f.write_str(&rest[start..]);
            };
            let placeholder = &after[..end];
            if placeholder == "*" {
                for (position, param) in self.params.iter().enumerate() {
                    if position != 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{param}")?;
                }
            } else if let Ok(slot) = placeholder.parse::<usize>() {
                if let Some(param) = self.params.get(slot) {
                    write!(f, "{param}")?;
                }
            }
            rest = &after[end + 1..];
        }
        f.write_str(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_positional_parameters() {
        let message = Message::arg_count(3, "set", 3, 2);
        assert_eq!(message.code(), DIAG_PARSE_ARG_COUNT);
        assert_eq!(message.to_string(), "line 03: set expects at least 3 tokens, got 2");
    }

    #[test]
    fn renders_nested_messages() {
        let message = Message::on_line(16, Message::write_target("add", "5".to_string()));
        assert_eq!(
            message.to_string(),
            "error on line 10: add requires a register, port, or channel destination; got 5"
        );
    }

    #[test]
    fn console_messages_join_all_parameters() {
        let message = Message::console(vec![
            MessageParam::Text("count".to_string()),
            MessageParam::Number(4.0),
        ]);
        assert_eq!(message.to_string(), "count 4");
    }

    #[test]
    fn json_projection_keeps_code_and_parameters() {
        let message = Message::label_missing(2);
        let value = message.to_value();
        assert_eq!(value["code"], DIAG_RUN_LABEL_MISSING);
        assert_eq!(value["params"][0], "02");
    }

    #[test]
    fn index_display_is_two_digit_uppercase_hex() {
        assert_eq!(index_display(0), "00");
        assert_eq!(index_display(10), "0A");
        assert_eq!(index_display(255), "FF");
    }
}
