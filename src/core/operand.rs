// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Operand resolution: registers, external references, literals, aliases.
//!
//! Resolution is prefix-committed: a token starting with `r`, `d`, or `c`
//! must name a valid register, device port, or network channel; it never
//! falls back to the literal or alias paths.

use std::collections::HashMap;
use std::fmt;

use crate::core::opcode::Opcode;

pub const REGISTER_COUNT: usize = 16;
pub const DEVICE_PORT_COUNT: usize = 64;
pub const NETWORK_CHANNEL_COUNT: usize = 8;

fn name_hex_value(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some(c as u8 - b'0'),
        'A'..='F' => Some(c as u8 - b'A' + 10),
        _ => None,
    }
}

/// One of the 16 numeric register slots (`r0`..`r9`, `rA`..`rF`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Register(u8);

impl Register {
    pub fn new(index: u8) -> Option<Self> {
        (usize::from(index) < REGISTER_COUNT).then_some(Self(index))
    }

    /// Exact-name lookup; the hex digit is uppercase, as in the listing.
    pub fn from_name(name: &str) -> Option<Self> {
        let rest = name.strip_prefix('r')?;
        let mut chars = rest.chars();
        let digit = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        name_hex_value(digit).map(Self)
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{:X}", self.0)
    }
}

/// A device port reference (`d00`..`d3F`). Read and write effects are
/// reserved for host extension; this core reads 0 and faults on write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DevicePort(u8);

impl DevicePort {
    pub fn from_name(name: &str) -> Option<Self> {
        let rest = name.strip_prefix('d')?;
        let mut chars = rest.chars();
        let hi = name_hex_value(chars.next()?)?;
        let lo = name_hex_value(chars.next()?)?;
        if chars.next().is_some() {
            return None;
        }
        let index = hi * 16 + lo;
        (usize::from(index) < DEVICE_PORT_COUNT).then_some(Self(index))
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for DevicePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{:02X}", self.0)
    }
}

/// A network channel reference (`c0`..`c7`). Same stub semantics as
/// [`DevicePort`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkChannel(u8);

impl NetworkChannel {
    pub fn from_name(name: &str) -> Option<Self> {
        let rest = name.strip_prefix('c')?;
        let mut chars = rest.chars();
        let digit = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        match digit {
            '0'..='7' => Some(Self(digit as u8 - b'0')),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for NetworkChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// A parse-time resolved instruction argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// The instruction's own operation, stored redundantly as operand 0.
    Op(Opcode),
    Register(Register),
    Port(DevicePort),
    Channel(NetworkChannel),
    Number(f64),
    /// Raw text: a jump target or a literal-print payload.
    Text(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Op(op) => f.write_str(op.mnemonic()),
            Self::Register(register) => register.fmt(f),
            Self::Port(port) => port.fmt(f),
            Self::Channel(channel) => channel.fmt(f),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Resolves one source token against the alias table. `None` is a parse
/// fault at the caller.
pub(crate) fn resolve_operand(token: &str, aliases: &HashMap<String, Operand>) -> Option<Operand> {
    if token.starts_with('r') {
        return Register::from_name(token).map(Operand::Register);
    }
    if token.starts_with('d') {
        return DevicePort::from_name(token).map(Operand::Port);
    }
    if token.starts_with('c') {
        return NetworkChannel::from_name(token).map(Operand::Channel);
    }
    if let Some(value) = parse_number(token) {
        return Some(Operand::Number(value));
    }
    aliases.get(token).cloned()
}

/// Parses the numeric-literal grammar: unsigned decimal with optional
/// fraction and power-of-ten exponent, or `0x` hex with optional fraction
/// and power-of-two exponent (`p` + decimal digits).
pub(crate) fn parse_number(token: &str) -> Option<f64> {
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return parse_hex_float(hex);
    }
    parse_decimal(token)
}

fn parse_decimal(token: &str) -> Option<f64> {
    let bytes = token.as_bytes();
    let mut pos = eat_digits(bytes, 0)?;
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos = eat_digits(bytes, pos + 1)?;
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        pos = eat_digits(bytes, pos + 1)?;
    }
    if pos != bytes.len() {
        return None;
    }
    token.parse().ok()
}

fn eat_digits(bytes: &[u8], start: usize) -> Option<usize> {
    let mut pos = start;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    (pos > start).then_some(pos)
}

fn parse_hex_float(text: &str) -> Option<f64> {
    let (mantissa, exponent) = match text.split_once(['p', 'P']) {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (text, None),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (mantissa, None),
    };
    if int_part.is_empty() {
        return None;
    }
    let mut value = 0.0f64;
    for c in int_part.chars() {
        value = value * 16.0 + f64::from(c.to_digit(16)?);
    }
    if let Some(frac) = frac_part {
        if frac.is_empty() {
            return None;
        }
        let mut scale = 1.0 / 16.0;
        for c in frac.chars() {
            value += f64::from(c.to_digit(16)?) * scale;
            scale /= 16.0;
        }
    }
    if let Some(exponent) = exponent {
        if exponent.is_empty() || !exponent.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let power: i32 = exponent.parse().ok()?;
        value *= 2.0f64.powi(power);
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn no_aliases() -> HashMap<String, Operand> {
        HashMap::new()
    }

    #[test]
    fn register_names_are_exact_uppercase_hex() {
        assert_eq!(Register::from_name("r0"), Register::new(0));
        assert_eq!(Register::from_name("r9"), Register::new(9));
        assert_eq!(Register::from_name("rA"), Register::new(10));
        assert_eq!(Register::from_name("rF"), Register::new(15));
        assert_eq!(Register::from_name("ra"), None);
        assert_eq!(Register::from_name("rG"), None);
        assert_eq!(Register::from_name("r10"), None);
        assert_eq!(Register::from_name("r"), None);
    }

    #[test]
    fn device_port_names_span_two_hex_digits() {
        assert_eq!(DevicePort::from_name("d00").map(DevicePort::index), Some(0));
        assert_eq!(DevicePort::from_name("d3F").map(DevicePort::index), Some(63));
        assert_eq!(DevicePort::from_name("d40"), None);
        assert_eq!(DevicePort::from_name("d0"), None);
        assert_eq!(DevicePort::from_name("d0a"), None);
        assert_eq!(DevicePort::from_name("d123"), None);
    }

    #[test]
    fn network_channel_names_are_single_octal_digit() {
        assert_eq!(NetworkChannel::from_name("c0").map(NetworkChannel::index), Some(0));
        assert_eq!(NetworkChannel::from_name("c7").map(NetworkChannel::index), Some(7));
        assert_eq!(NetworkChannel::from_name("c8"), None);
        assert_eq!(NetworkChannel::from_name("c01"), None);
    }

    #[test]
    fn display_round_trips_reference_names() {
        for name in ["r0", "rC", "d07", "d2B", "c5"] {
            let operand = resolve_operand(name, &no_aliases()).expect("reference should resolve");
            assert_eq!(operand.to_string(), name);
        }
    }

    #[test]
    fn parses_decimal_literals() {
        assert_eq!(parse_number("5"), Some(5.0));
        assert_eq!(parse_number("3.75"), Some(3.75));
        assert_eq!(parse_number("2e3"), Some(2000.0));
        assert_eq!(parse_number("1.5E2"), Some(150.0));
    }

    #[test]
    fn parses_hex_float_literals() {
        assert_eq!(parse_number("0x10"), Some(16.0));
        assert_eq!(parse_number("0X1a"), Some(26.0));
        assert_eq!(parse_number("0x1A.8"), Some(26.5));
        assert_eq!(parse_number("0x1p4"), Some(16.0));
        assert_eq!(parse_number("0x1.8P1"), Some(3.0));
    }

    #[test]
    fn rejects_malformed_literals() {
        for token in ["-5", "+5", ".5", "5.", "1e", "1e-3", "0x", "0x.8", "0x1p", "0x1pA", "5x"] {
            assert_eq!(parse_number(token), None, "token {token:?} should not parse");
        }
    }

    #[test]
    fn resolves_aliases_after_literals() {
        let mut aliases = no_aliases();
        aliases.insert("limit".to_string(), Operand::Number(8.0));
        assert_eq!(
            resolve_operand("limit", &aliases),
            Some(Operand::Number(8.0))
        );
        assert_eq!(resolve_operand("missing", &aliases), None);
    }

    #[test]
    fn reference_prefixes_do_not_fall_back_to_aliases() {
        let mut aliases = no_aliases();
        aliases.insert("rate".to_string(), Operand::Number(1.0));
        aliases.insert("dest".to_string(), Operand::Number(2.0));
        aliases.insert("count".to_string(), Operand::Number(3.0));
        assert_eq!(resolve_operand("rate", &aliases), None);
        assert_eq!(resolve_operand("dest", &aliases), None);
        assert_eq!(resolve_operand("count", &aliases), None);
    }

    proptest! {
        #[test]
        fn decimal_integer_literals_round_trip(value in any::<u32>()) {
            let text = value.to_string();
            prop_assert_eq!(parse_number(&text), Some(f64::from(value)));
        }

        #[test]
        fn hex_integer_literals_round_trip(value in any::<u32>()) {
            let text = format!("0x{value:X}");
            prop_assert_eq!(parse_number(&text), Some(f64::from(value)));
        }

        #[test]
        fn hex_exponents_scale_by_powers_of_two(mantissa in 1u32..0x1000, power in 0u32..20) {
            let text = format!("0x{mantissa:X}p{power}");
            let expected = f64::from(mantissa) * 2.0f64.powi(power as i32);
            prop_assert_eq!(parse_number(&text), Some(expected));
        }
    }
}
