// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Single-pass source compilation: one trimmed line in, at most one
//! instruction out.
//!
//! The pass is fail-fast: the first fault stops compilation of the whole
//! source. Aliases resolve left-to-right with no forward references; the
//! label table is complete once the pass finishes, which is what lets
//! jumps defer target lookup to execution time.

use std::collections::HashMap;
use std::f64::consts;

use crate::core::line::Line;
use crate::core::message::Message;
use crate::core::opcode::Opcode;
use crate::core::operand::{resolve_operand, Operand};

pub(crate) const ALIAS_DIRECTIVE: &str = "alias";
const COMMENT_MARKER: char = '#';

/// Everything one compilation pass produces.
#[derive(Debug, Default)]
pub(crate) struct ParseOutput {
    pub lines: Vec<Line>,
    pub aliases: HashMap<String, Operand>,
    pub labels: HashMap<String, usize>,
    pub fault: Option<Message>,
}

pub(crate) fn builtin_aliases() -> HashMap<String, Operand> {
    HashMap::from([
        ("true".to_string(), Operand::Number(1.0)),
        ("false".to_string(), Operand::Number(0.0)),
        ("pi".to_string(), Operand::Number(consts::PI)),
        ("e".to_string(), Operand::Number(consts::E)),
    ])
}

pub(crate) fn parse_source(source: &str) -> ParseOutput {
    let mut out = ParseOutput {
        aliases: builtin_aliases(),
        ..ParseOutput::default()
    };
    let mut index: u32 = 0;
    for raw in source.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }
        let parsed = parse_line(line, index, &mut out);
        if out.fault.is_some() {
            break;
        }
        if let Some(parsed) = parsed {
            if let Line::Label { name, .. } = &parsed {
                out.labels.insert(name.clone(), index as usize);
            }
            out.lines.push(parsed);
            index += 1;
        }
    }
    out
}

/// Parses one trimmed, non-empty, non-comment line. Alias directives and
/// faulted lines produce no instruction and consume no instruction index.
fn parse_line(line: &str, index: u32, out: &mut ParseOutput) -> Option<Line> {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    if let Some(cut) = tokens.iter().position(|token| token.starts_with(COMMENT_MARKER)) {
        tokens.truncate(cut);
    }
    let first = tokens[0];

    if first == ALIAS_DIRECTIVE {
        if tokens.len() != 3 {
            out.fault = Some(Message::arg_count(index, ALIAS_DIRECTIVE, 3, tokens.len()));
            return None;
        }
        match resolve_operand(tokens[2], &out.aliases) {
            Some(value) => {
                out.aliases.insert(tokens[1].to_string(), value);
            }
            None => out.fault = Some(Message::bad_arg(tokens[2])),
        }
        return None;
    }

    let Some(op) = Opcode::lookup_writable(first) else {
        if tokens.len() == 1 && first.len() > 1 && first.find(':') == Some(first.len() - 1) {
            return Some(Line::label(&first[..first.len() - 1], index));
        }
        out.fault = Some(Message::unrecognized_line(first));
        return None;
    };

    if tokens.len() < op.min_args() {
        out.fault = Some(Message::arg_count(index, op.mnemonic(), op.min_args(), tokens.len()));
        return None;
    }

    match op {
        Opcode::Prt => {
            // Verbatim payload from the raw line: no comment stripping and
            // no alias substitution.
            let payload = line
                .split_once(char::is_whitespace)
                .map(|(_, rest)| rest)
                .unwrap_or_default();
            Some(Line::Normal {
                op,
                args: vec![Operand::Op(op), Operand::Text(payload.to_string())],
                index,
            })
        }
        Opcode::Jmp => Some(Line::jump(tokens[1], index)),
        _ => {
            let mut args = Vec::with_capacity(tokens.len());
            args.push(Operand::Op(op));
            for token in &tokens[1..] {
                match resolve_operand(token, &out.aliases) {
                    Some(arg) => args.push(arg),
                    None => {
                        out.fault = Some(Message::bad_arg(token));
                        return None;
                    }
                }
            }
            Some(Line::Normal { op, args, index })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::{
        DIAG_PARSE_ARG_COUNT, DIAG_PARSE_BAD_ARG, DIAG_PARSE_UNRECOGNIZED_LINE,
    };
    use crate::core::operand::Register;

    #[test]
    fn skips_blank_and_comment_lines_without_consuming_indices() {
        let out = parse_source("\n# header\n   \nset r0 1\n  # trailing\nset r1 2\n");
        assert!(out.fault.is_none());
        assert_eq!(out.lines.len(), 2);
        assert_eq!(out.lines[0].index(), 0);
        assert_eq!(out.lines[1].index(), 1);
    }

    #[test]
    fn strips_trailing_comments_token_wise() {
        let out = parse_source("set r0 5 # store the limit");
        assert!(out.fault.is_none());
        assert_eq!(out.lines.len(), 1);
        assert_eq!(out.lines[0].to_string(), "00| set r0 5");
    }

    #[test]
    fn alias_definitions_resolve_immediately_and_produce_no_instruction() {
        let out = parse_source("alias limit 5\nset r0 limit");
        assert!(out.fault.is_none());
        assert_eq!(out.lines.len(), 1);
        assert_eq!(out.aliases.get("limit"), Some(&Operand::Number(5.0)));
        assert_eq!(out.lines[0].to_string(), "00| set r0 5");
    }

    #[test]
    fn aliases_may_name_registers() {
        let out = parse_source("alias sink r1\nset sink 4");
        assert!(out.fault.is_none());
        assert_eq!(
            out.aliases.get("sink"),
            Some(&Operand::Register(Register::new(1).expect("r1 exists")))
        );
    }

    #[test]
    fn aliases_have_no_forward_references() {
        let out = parse_source("set r0 limit\nalias limit 5");
        let fault = out.fault.expect("forward alias use should fault");
        assert_eq!(fault.code(), DIAG_PARSE_BAD_ARG);
        assert!(out.lines.is_empty());
    }

    #[test]
    fn alias_directive_requires_three_tokens() {
        let out = parse_source("alias limit");
        let fault = out.fault.expect("short alias should fault");
        assert_eq!(fault.code(), DIAG_PARSE_ARG_COUNT);
    }

    #[test]
    fn builtin_aliases_are_seeded() {
        let out = parse_source("set r0 true\nset r1 pi");
        assert!(out.fault.is_none());
        assert_eq!(out.lines[0].to_string(), "00| set r0 1");
    }

    #[test]
    fn labels_register_their_instruction_index() {
        let out = parse_source("set r0 1\ntop:\nadd r0 r0 1\njmp top");
        assert!(out.fault.is_none());
        assert_eq!(out.labels.get("top"), Some(&1));
        assert_eq!(out.lines[1], Line::label("top", 1));
    }

    #[test]
    fn label_requires_single_token_with_trailing_colon() {
        for source in ["top: set r0 1", "a:b:", ":", "top :"] {
            let out = parse_source(source);
            let fault = out.fault.expect("malformed label should fault");
            assert_eq!(fault.code(), DIAG_PARSE_UNRECOGNIZED_LINE, "source {source:?}");
        }
    }

    #[test]
    fn argument_count_fault_reports_expected_and_given() {
        let out = parse_source("set r0");
        let fault = out.fault.expect("missing operand should fault");
        assert_eq!(fault.code(), DIAG_PARSE_ARG_COUNT);
        assert_eq!(fault.to_string(), "line 00: set expects at least 3 tokens, got 2");
        assert!(out.lines.is_empty());
    }

    #[test]
    fn first_fault_aborts_the_rest_of_the_source() {
        let out = parse_source("set r0 1\nset r1 bogus\nset r2 2");
        assert!(out.fault.is_some());
        assert_eq!(out.lines.len(), 1);
    }

    #[test]
    fn prt_captures_the_raw_remainder_of_the_line() {
        let out = parse_source("prt ready # not a comment");
        assert!(out.fault.is_none());
        assert_eq!(
            out.lines[0],
            Line::Normal {
                op: Opcode::Prt,
                args: vec![
                    Operand::Op(Opcode::Prt),
                    Operand::Text("ready # not a comment".to_string()),
                ],
                index: 0,
            }
        );
    }

    #[test]
    fn jump_targets_stay_unresolved_at_parse_time() {
        let out = parse_source("jmp nowhere");
        assert!(out.fault.is_none());
        assert_eq!(out.lines[0], Line::jump("nowhere", 0));
    }

    #[test]
    fn internal_operations_cannot_be_written() {
        for source in ["nil", "label top"] {
            let out = parse_source(source);
            let fault = out.fault.expect("internal op in source should fault");
            assert_eq!(fault.code(), DIAG_PARSE_UNRECOGNIZED_LINE);
        }
    }
}
