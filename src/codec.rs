// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Definition persistence: Program <-> nested JSON document.
//!
//! This is a *definition* codec, not a snapshot codec: name, labels,
//! aliases, and the instruction sequence round-trip; registers, program
//! counter, fault, and log state never do. A decoded program is always
//! Ready, whatever state the source program was in when encoded.

use std::collections::HashMap;
use std::fmt;

use serde_json::{json, Map, Value};

use crate::core::line::{Line, LineError};
use crate::core::opcode::Opcode;
use crate::core::operand::{DevicePort, NetworkChannel, Operand, Register};
use crate::core::program::Program;

const LINE_NORMAL: u64 = 0;
const LINE_LABEL: u64 = 1;
const LINE_JUMP: u64 = 2;

const VALUE_OP: u64 = 0;
const VALUE_PORT: u64 = 1;
const VALUE_CHANNEL: u64 = 2;
const VALUE_NUMBER: u64 = 3;
const VALUE_TEXT: u64 = 4;
const VALUE_REGISTER: u64 = 5;

/// Errors raised while decoding a definition document.
#[derive(Clone, Debug, PartialEq)]
pub enum CodecError {
    Json(String),
    MissingField(&'static str),
    ExpectedObject(&'static str),
    ExpectedArray(&'static str),
    ExpectedString(&'static str),
    ExpectedNumber(&'static str),
    UnknownLineType(u64),
    UnknownValueType(u64),
    UnknownOpcode(String),
    OperationMismatch { expected: &'static str, found: String },
    BadReference { kind: &'static str, name: String },
    Line(LineError),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(message) => write!(f, "invalid definition document: {message}"),
            Self::MissingField(field) => write!(f, "missing field {field:?}"),
            Self::ExpectedObject(field) => write!(f, "field {field:?} must be an object"),
            Self::ExpectedArray(field) => write!(f, "field {field:?} must be an array"),
            Self::ExpectedString(field) => write!(f, "field {field:?} must be a string"),
            Self::ExpectedNumber(field) => write!(f, "field {field:?} must be a number"),
            Self::UnknownLineType(kind) => write!(f, "unknown line type {kind}"),
            Self::UnknownValueType(kind) => write!(f, "unknown operand value type {kind}"),
            Self::UnknownOpcode(name) => write!(f, "unknown operation {name:?}"),
            Self::OperationMismatch { expected, found } => {
                write!(f, "line type requires operation {expected:?}, found {found:?}")
            }
            Self::BadReference { kind, name } => write!(f, "invalid {kind} name {name:?}"),
            Self::Line(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<LineError> for CodecError {
    fn from(value: LineError) -> Self {
        Self::Line(value)
    }
}

/// Encodes a program's definition as a nested JSON document.
pub fn encode_program(program: &Program) -> Value {
    json!({
        "name": program.name(),
        "labels": labels_value(program.labels()),
        "aliases": aliases_value(program.aliases()),
        "lines": program.lines().iter().map(line_value).collect::<Vec<_>>(),
    })
}

pub fn encode_program_string(program: &Program) -> String {
    encode_program(program).to_string()
}

/// Decodes a definition document back into a Ready program.
pub fn decode_program(document: &Value) -> Result<Program, CodecError> {
    let name = str_field(document, "name")?.to_string();
    let labels = decode_labels(field(document, "labels")?)?;
    let aliases = decode_aliases(field(document, "aliases")?)?;
    let lines = field(document, "lines")?
        .as_array()
        .ok_or(CodecError::ExpectedArray("lines"))?
        .iter()
        .map(decode_line)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Program::from_definition(name, lines, aliases, labels))
}

pub fn decode_program_str(text: &str) -> Result<Program, CodecError> {
    let document: Value =
        serde_json::from_str(text).map_err(|err| CodecError::Json(err.to_string()))?;
    decode_program(&document)
}

fn labels_value(labels: &HashMap<String, usize>) -> Value {
    let mut map = Map::new();
    for (name, &index) in labels {
        map.insert(name.clone(), json!(index));
    }
    Value::Object(map)
}

fn aliases_value(aliases: &HashMap<String, Operand>) -> Value {
    let mut map = Map::new();
    for (name, operand) in aliases {
        map.insert(name.clone(), operand_value(operand));
    }
    Value::Object(map)
}

fn operand_value(operand: &Operand) -> Value {
    match operand {
        Operand::Op(op) => json!({ "type": VALUE_OP, "value": op.mnemonic() }),
        Operand::Port(port) => json!({ "type": VALUE_PORT, "value": port.to_string() }),
        Operand::Channel(channel) => json!({ "type": VALUE_CHANNEL, "value": channel.to_string() }),
        Operand::Number(value) => json!({ "type": VALUE_NUMBER, "value": value }),
        Operand::Text(text) => json!({ "type": VALUE_TEXT, "value": text }),
        Operand::Register(register) => {
            json!({ "type": VALUE_REGISTER, "value": register.to_string() })
        }
    }
}

fn line_value(line: &Line) -> Value {
    match line {
        Line::Normal { op, args, index } => json!({
            "type": LINE_NORMAL,
            "operation": op.mnemonic(),
            "line": index,
            // Operand 0 repeats the operation; the decoder reinserts it.
            "args": args[1..].iter().map(operand_value).collect::<Vec<_>>(),
        }),
        Line::Label { name, index } => json!({
            "type": LINE_LABEL,
            "operation": Opcode::Label.mnemonic(),
            "line": index,
            "label": name,
        }),
        Line::Jump { target, index } => json!({
            "type": LINE_JUMP,
            "operation": Opcode::Jmp.mnemonic(),
            "line": index,
            "label": target,
        }),
    }
}

fn decode_labels(value: &Value) -> Result<HashMap<String, usize>, CodecError> {
    let object = value.as_object().ok_or(CodecError::ExpectedObject("labels"))?;
    let mut labels = HashMap::with_capacity(object.len());
    for (name, index) in object {
        let index = index
            .as_u64()
            .ok_or(CodecError::ExpectedNumber("labels"))?;
        labels.insert(name.clone(), index as usize);
    }
    Ok(labels)
}

fn decode_aliases(value: &Value) -> Result<HashMap<String, Operand>, CodecError> {
    let object = value
        .as_object()
        .ok_or(CodecError::ExpectedObject("aliases"))?;
    let mut aliases = HashMap::with_capacity(object.len());
    for (name, operand) in object {
        aliases.insert(name.clone(), decode_operand(operand)?);
    }
    Ok(aliases)
}

fn decode_line(value: &Value) -> Result<Line, CodecError> {
    let kind = u64_field(value, "type")?;
    let mnemonic = str_field(value, "operation")?;
    let op = Opcode::from_mnemonic(mnemonic)
        .ok_or_else(|| CodecError::UnknownOpcode(mnemonic.to_string()))?;
    let index = u64_field(value, "line")? as u32;
    match kind {
        LINE_NORMAL => {
            let encoded = field(value, "args")?
                .as_array()
                .ok_or(CodecError::ExpectedArray("args"))?;
            let mut args = Vec::with_capacity(encoded.len() + 1);
            args.push(Operand::Op(op));
            for operand in encoded {
                args.push(decode_operand(operand)?);
            }
            Ok(Line::normal(op, args, index)?)
        }
        LINE_LABEL => {
            require_operation(op, Opcode::Label, mnemonic)?;
            Ok(Line::label(str_field(value, "label")?, index))
        }
        LINE_JUMP => {
            require_operation(op, Opcode::Jmp, mnemonic)?;
            Ok(Line::jump(str_field(value, "label")?, index))
        }
        other => Err(CodecError::UnknownLineType(other)),
    }
}

fn require_operation(found: Opcode, expected: Opcode, mnemonic: &str) -> Result<(), CodecError> {
    if found == expected {
        Ok(())
    } else {
        Err(CodecError::OperationMismatch {
            expected: expected.mnemonic(),
            found: mnemonic.to_string(),
        })
    }
}

fn decode_operand(value: &Value) -> Result<Operand, CodecError> {
    let kind = u64_field(value, "type")?;
    match kind {
        VALUE_OP => {
            let name = str_field(value, "value")?;
            Opcode::from_mnemonic(name)
                .map(Operand::Op)
                .ok_or_else(|| CodecError::UnknownOpcode(name.to_string()))
        }
        VALUE_PORT => {
            let name = str_field(value, "value")?;
            DevicePort::from_name(name)
                .map(Operand::Port)
                .ok_or_else(|| CodecError::BadReference {
                    kind: "device port",
                    name: name.to_string(),
                })
        }
        VALUE_CHANNEL => {
            let name = str_field(value, "value")?;
            NetworkChannel::from_name(name)
                .map(Operand::Channel)
                .ok_or_else(|| CodecError::BadReference {
                    kind: "network channel",
                    name: name.to_string(),
                })
        }
        VALUE_NUMBER => field(value, "value")?
            .as_f64()
            .map(Operand::Number)
            .ok_or(CodecError::ExpectedNumber("value")),
        VALUE_TEXT => Ok(Operand::Text(str_field(value, "value")?.to_string())),
        VALUE_REGISTER => {
            let name = str_field(value, "value")?;
            Register::from_name(name)
                .map(Operand::Register)
                .ok_or_else(|| CodecError::BadReference {
                    kind: "register",
                    name: name.to_string(),
                })
        }
        other => Err(CodecError::UnknownValueType(other)),
    }
}

fn field<'a>(value: &'a Value, name: &'static str) -> Result<&'a Value, CodecError> {
    value.get(name).ok_or(CodecError::MissingField(name))
}

fn str_field<'a>(value: &'a Value, name: &'static str) -> Result<&'a str, CodecError> {
    field(value, name)?
        .as_str()
        .ok_or(CodecError::ExpectedString(name))
}

fn u64_field(value: &Value, name: &'static str) -> Result<u64, CodecError> {
    field(value, name)?
        .as_u64()
        .ok_or(CodecError::ExpectedNumber(name))
}
