//! Netlist parser.
//!
//! One component per record:
//!
//! ```text
//! Name Type Value N1 N2          // two-terminal
//! Name VCCS Value N1 N2 CN1 CN2  // controlled source
//! ```
//!
//! Records with fewer than three fields are skipped.

use indexmap::IndexMap;
use svm_core::units::parse_value;
use svm_core::{Circuit, Component, ComponentKind};

use crate::error::{Error, Result};
use crate::lexer::{Lexer, SpannedToken, Token};

/// Fields before the node list.
const HEADER_FIELDS: usize = 3;

/// Parse a netlist into a circuit.
pub fn parse(input: &str) -> Result<Circuit> {
    let tokens = Lexer::new(input).tokenize();
    Parser::new(&tokens).parse_all()
}

/// Parse a netlist and set its designation.
pub fn parse_named(input: &str, title: impl Into<String>) -> Result<Circuit> {
    let mut circuit = parse(input)?;
    circuit.set_title(title);
    Ok(circuit)
}

/// Recognize a component type keyword, case-insensitively.
///
/// Besides the short letters, long forms such as `Inductor`, `Capacitor` or
/// `CurrentSource` are accepted.
pub fn component_kind(keyword: &str) -> Option<ComponentKind> {
    let t = keyword.to_ascii_lowercase();
    if t.starts_with('r') {
        Some(ComponentKind::Resistor)
    } else if t.starts_with('l') || t.contains("ind") {
        Some(ComponentKind::Inductor)
    } else if t.starts_with('c') && !t.contains("cur") {
        Some(ComponentKind::Capacitor)
    } else if t == "vccs" || t == "g" {
        Some(ComponentKind::Vccs)
    } else if t.starts_with('v') {
        Some(ComponentKind::VoltageSource)
    } else if t.starts_with('i') || t.starts_with('j') || t.contains("curr") {
        Some(ComponentKind::CurrentSource)
    } else {
        None
    }
}

/// Parse an initial-condition list such as `"1=5.0 2=0"`.
///
/// Pairs are separated by whitespace or commas; values accept SI suffixes.
pub fn parse_initial_conditions(input: &str) -> Result<IndexMap<u32, f64>> {
    let mut voltages = IndexMap::new();
    for pair in input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
    {
        let invalid = || Error::InvalidInitialCondition(pair.to_string());
        let (node, volts) = pair.split_once('=').ok_or_else(invalid)?;
        let node: u32 = node.trim().parse().map_err(|_| invalid())?;
        let volts = parse_value(volts).filter(|v| v.is_finite()).ok_or_else(invalid)?;
        voltages.insert(node, volts);
    }
    Ok(voltages)
}

struct Parser<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
    circuit: Circuit,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [SpannedToken]) -> Self {
        Self {
            tokens,
            pos: 0,
            circuit: Circuit::new(),
        }
    }

    fn parse_all(mut self) -> Result<Circuit> {
        while !self.is_at_end() {
            let line = self.current_line();
            let fields = self.take_record();
            if fields.len() < HEADER_FIELDS {
                log::debug!("line {line}: skipping short record {fields:?}");
                continue;
            }
            let component = parse_component(&fields, line)?;
            self.circuit.add(component);
        }
        log::info!("parsed {} components", self.circuit.len());
        Ok(self.circuit)
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    fn current_line(&self) -> usize {
        self.tokens.get(self.pos).map_or(0, |t| t.line)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    /// Collect fields up to and including the next end of record.
    fn take_record(&mut self) -> Vec<&'a str> {
        let tokens = self.tokens;
        let mut fields = Vec::new();
        while let Some(t) = tokens.get(self.pos) {
            match &t.token {
                Token::Field(f) => {
                    fields.push(f.as_str());
                    self.advance();
                }
                Token::Eol => {
                    self.advance();
                    break;
                }
                Token::Eof => break,
            }
        }
        fields
    }
}

fn parse_component(fields: &[&str], line: usize) -> Result<Component> {
    let name = fields[0];
    let kind = component_kind(fields[1]).ok_or_else(|| Error::UnknownComponentType {
        line,
        kind: fields[1].to_string(),
    })?;
    let value = expect_value(fields[2], line)?;

    let expected = if kind == ComponentKind::Vccs { 7 } else { 5 };
    if fields.len() < expected {
        return Err(Error::MissingField {
            line,
            component: name.to_string(),
            expected,
            found: fields.len(),
        });
    }

    let n1 = expect_node(fields[3], line)?;
    let n2 = expect_node(fields[4], line)?;

    if kind == ComponentKind::Vccs {
        let c1 = expect_node(fields[5], line)?;
        let c2 = expect_node(fields[6], line)?;
        Ok(Component::vccs(name, n1, n2, c1, c2, value))
    } else {
        Ok(Component::new(name, kind, value, n1, n2))
    }
}

fn expect_value(text: &str, line: usize) -> Result<f64> {
    parse_value(text)
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::InvalidValue {
            line,
            text: text.to_string(),
        })
}

fn expect_node(text: &str, line: usize) -> Result<u32> {
    text.parse().map_err(|_| Error::ParseError {
        line,
        message: format!("invalid node `{text}`, expected a non-negative integer"),
    })
}
