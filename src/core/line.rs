// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Compiled instruction records.
//!
//! A label marker never dispatches at runtime; a jump holds its target
//! label unresolved until execution, so forward references work once the
//! parse pass has filled the label table.

use std::fmt;

use crate::core::message::index_display;
use crate::core::opcode::Opcode;
use crate::core::operand::Operand;
use crate::core::program::ExecContext;

/// Violation of the manual-construction consistency guards. Not reachable
/// through the parser; the persistence codec surfaces these on corrupt
/// documents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineError {
    OperationMismatch { expected: Opcode },
    MissingOperands { op: Opcode, expected: usize, given: usize },
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperationMismatch { expected } => write!(
                f,
                "operand 0 must be the line's own operation ({})",
                expected.mnemonic()
            ),
            Self::MissingOperands { op, expected, given } => write!(
                f,
                "{} requires {} operands, got {}",
                op.mnemonic(),
                expected,
                given
            ),
        }
    }
}

impl std::error::Error for LineError {}

/// One compiled instruction, tagged by variant.
#[derive(Clone, Debug, PartialEq)]
pub enum Line {
    Normal {
        op: Opcode,
        args: Vec<Operand>,
        index: u32,
    },
    Label {
        name: String,
        index: u32,
    },
    Jump {
        target: String,
        index: u32,
    },
}

impl Line {
    /// Guarded constructor for normal instructions: operand 0 must equal
    /// `op` and the operand list must meet the operation's arity.
    pub fn normal(op: Opcode, args: Vec<Operand>, index: u32) -> Result<Self, LineError> {
        if args.first() != Some(&Operand::Op(op)) {
            return Err(LineError::OperationMismatch { expected: op });
        }
        if args.len() < op.min_args() {
            return Err(LineError::MissingOperands {
                op,
                expected: op.min_args(),
                given: args.len(),
            });
        }
        Ok(Self::Normal { op, args, index })
    }

    pub fn label(name: impl Into<String>, index: u32) -> Self {
        Self::Label {
            name: name.into(),
            index,
        }
    }

    pub fn jump(target: impl Into<String>, index: u32) -> Self {
        Self::Jump {
            target: target.into(),
            index,
        }
    }

    pub fn index(&self) -> u32 {
        match self {
            Self::Normal { index, .. } | Self::Label { index, .. } | Self::Jump { index, .. } => {
                *index
            }
        }
    }

    pub(crate) fn execute(&self, ctx: &mut ExecContext<'_>) {
        match self {
            Self::Label { .. } => {}
            Self::Jump { target, index } => ctx.jump_to_label(target, *index),
            Self::Normal { op, args, index } => op.execute(args, *index, ctx),
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal { args, index, .. } => {
                write!(f, "{}|", index_display(*index))?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
            Self::Label { name, index } => write!(f, "{}| {}:", index_display(*index), name),
            Self::Jump { target, index } => write!(f, "{}| jmp {}", index_display(*index), target),
        }
    }
}
