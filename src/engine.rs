//! The statement loop: tokens in, network out.
//!
//! The loop hands the remaining input to the statement productions, feeds
//! every recognized entry to the [`NetworkBuilder`], and recovers from
//! anything else by discarding input up to the next statement boundary (the
//! next line) with one located diagnostic per discard. Parsing is fully
//! synchronous and single-threaded; independent parses share no state.

use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use encoding::all::ISO_8859_1;
use encoding::{DecoderTrap, Encoding};

use crate::builder::{NetworkBuilder, ReferenceMode};
use crate::dbc::{parser, Entry};
use crate::diag::{Diagnostic, DiagnosticSink, Location};
use crate::network::Network;

/// Knobs for one parse call.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub references: ReferenceMode,
    /// Checked between statements; setting the flag makes the parse return
    /// [`ParseInterrupted`] instead of running a large input to completion.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// The parse was cancelled through [`ParseOptions::cancel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseInterrupted {
    pub location: Location,
}

impl std::fmt::Display for ParseInterrupted {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "parse interrupted at {}", self.location)
    }
}

impl std::error::Error for ParseInterrupted {}

/// Network plus everything reported along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub network: Network,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parses DBC text with default options, collecting diagnostics.
pub fn parse_dbc(text: &str) -> ParseOutput {
    let mut diagnostics = Vec::new();
    // Without a cancel flag the loop cannot be interrupted.
    let network = parse_dbc_with(text, &ParseOptions::default(), &mut diagnostics)
        .unwrap_or_else(|_interrupted| Network::default());
    ParseOutput {
        network,
        diagnostics,
    }
}

/// Parses DBC text, reporting every recovered problem to `sink`.
pub fn parse_dbc_with(
    text: &str,
    options: &ParseOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<Network, ParseInterrupted> {
    // Every production expects a terminated final line.
    let owned;
    let mut input: &str = if text.is_empty() || text.ends_with('\n') {
        text
    } else {
        owned = format!("{}\n", text);
        &owned
    };

    let mut builder = NetworkBuilder::new(options.references);
    let mut line = 1usize;
    let mut column = 1usize;

    loop {
        input = skip_blank(input, &mut line, &mut column);
        if input.is_empty() {
            break;
        }
        if let Some(flag) = &options.cancel {
            if flag.load(Ordering::Relaxed) {
                return Err(ParseInterrupted {
                    location: Location::new(line, column),
                });
            }
        }

        let location = Location::new(line, column);
        match parser::entry(input) {
            Ok((rest, entry)) => {
                let consumed = &input[..input.len() - rest.len()];
                advance(consumed, &mut line, &mut column);
                input = rest;
                match entry {
                    Entry::Unknown(content) => {
                        let content = content.trim();
                        if !content.is_empty() {
                            sink.report(Diagnostic::error(
                                location,
                                format!("syntax error near `{}`", snippet(content)),
                            ));
                        }
                    }
                    entry => builder.apply(entry, location, sink),
                }
            }
            // The unknown production makes this path unreachable for any
            // terminated line; keep the recovery anyway.
            Err(_) => {
                sink.report(Diagnostic::error(
                    location,
                    format!("syntax error near `{}`", snippet(input)),
                ));
                match input.find('\n') {
                    Some(position) => {
                        advance(&input[..=position], &mut line, &mut column);
                        input = &input[position + 1..];
                    }
                    None => break,
                }
            }
        }
    }

    Ok(builder.finish())
}

/// Convenience loader mirroring how DBC files exist in the wild: Latin-1
/// encoded, with undecodable bytes replaced. The core stays text-in.
pub fn from_dbc_file<P>(path: P) -> io::Result<ParseOutput>
where
    P: AsRef<Path>,
{
    from_encoded_dbc_file(path, ISO_8859_1)
}

#[doc(hidden)]
pub fn from_encoded_dbc_file<P, E>(path: P, encoding: &E) -> io::Result<ParseOutput>
where
    P: AsRef<Path>,
    E: Encoding,
{
    let data = File::open(path)
        .and_then(|mut f| {
            let mut contents: Vec<u8> = Vec::new();
            f.read_to_end(&mut contents).map(|_bytes_read| contents)
        })
        .and_then(|contents| {
            encoding
                .decode(contents.as_slice(), DecoderTrap::Replace)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
        })?;

    Ok(parse_dbc(&data))
}

fn skip_blank<'a>(input: &'a str, line: &mut usize, column: &mut usize) -> &'a str {
    let mut rest = input;
    while let Some(c) = rest.chars().next() {
        match c {
            '\n' => {
                *line += 1;
                *column = 1;
            }
            ' ' | '\t' | '\r' => *column += 1,
            _ => break,
        }
        rest = &rest[c.len_utf8()..];
    }
    rest
}

fn advance(consumed: &str, line: &mut usize, column: &mut usize) {
    for c in consumed.chars() {
        if c == '\n' {
            *line += 1;
            *column = 1;
        } else {
            *column += 1;
        }
    }
}

fn snippet(text: &str) -> &str {
    let first_line = text.lines().next().unwrap_or("");
    match first_line.char_indices().nth(60) {
        Some((index, _)) => &first_line[..index],
        None => first_line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Severity;
    use crate::network::ByteOrder;
    use crate::network::ValueType;

    #[test]
    fn end_to_end_minimal_network() {
        let output = parse_dbc(
            "VERSION \"1.0\"\n\
             BU_: ECU1 ECU2\n\
             BO_ 100 TestMsg: 8 ECU1\n \
             SG_ Sig1 : 0|8@1+ (1,0) [0|255] \"\" ECU2\n",
        );
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

        let network = &output.network;
        assert_eq!(network.version, "1.0");
        assert_eq!(network.nodes.len(), 2);
        assert!(network.node("ECU1").is_some());
        assert!(network.node("ECU2").is_some());

        let message = network.message(100).unwrap();
        assert_eq!(message.name, "TestMsg");
        assert_eq!(message.size, 8);
        assert_eq!(message.transmitter, "ECU1");

        let signal = network.signal(100, "Sig1").unwrap();
        assert_eq!(signal.start_bit, 0);
        assert_eq!(signal.bit_size, 8);
        assert_eq!(signal.byte_order, ByteOrder::LittleEndian);
        assert_eq!(signal.value_type, ValueType::Unsigned);
        assert_eq!(signal.factor, 1.0);
        assert_eq!(signal.offset, 0.0);
        assert_eq!(signal.minimum, 0.0);
        assert_eq!(signal.maximum, 255.0);
        assert_eq!(signal.unit, "");
        assert!(signal.receivers.contains("ECU2"));
        assert_eq!(signal.receivers.len(), 1);
    }

    #[test]
    fn malformed_statement_recovers_at_next_line() {
        let output = parse_dbc(
            "BO_ 100 Broken 8 ECU1\n\
             BO_ 101 Good: 8 ECU1\n",
        );
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].severity, Severity::Error);
        assert_eq!(output.diagnostics[0].location.line, 1);
        assert!(output.network.message(100).is_none());
        assert_eq!(output.network.message(101).unwrap().name, "Good");
    }

    #[test]
    fn diagnostics_carry_statement_locations() {
        let output = parse_dbc(
            "VERSION \"1.0\"\n\
             \n\
             garbage line here\n\
             BU_: ECU1\n",
        );
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].location, Location::new(3, 1));
        assert!(output.network.node("ECU1").is_some());
    }

    #[test]
    fn overflowing_literal_discards_only_its_statement() {
        // 4294967296 does not fit the u32 frame id; the statement is
        // reported and skipped, the next one still lands.
        let output = parse_dbc(
            "BO_ 4294967296 TooBig: 8 ECU1\n\
             BO_ 200 Fits: 8 ECU1\n",
        );
        assert_eq!(output.diagnostics.len(), 1);
        assert!(output.network.message(200).is_some());
        assert_eq!(output.network.messages.len(), 1);
    }

    #[test]
    fn input_without_trailing_newline() {
        let output = parse_dbc("VERSION \"1.0\"");
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.network.version, "1.0");
    }

    #[test]
    fn crlf_line_endings() {
        let output = parse_dbc("VERSION \"1.0\"\r\nBU_: ECU1\r\n");
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        assert_eq!(output.network.version, "1.0");
        assert!(output.network.node("ECU1").is_some());
    }

    #[test]
    fn cancellation_between_statements() {
        let flag = Arc::new(AtomicBool::new(true));
        let options = ParseOptions {
            cancel: Some(flag),
            ..Default::default()
        };
        let mut diagnostics = Vec::new();
        let result = parse_dbc_with("VERSION \"1.0\"\n", &options, &mut diagnostics);
        assert!(result.is_err());
    }

    #[test]
    fn new_symbols_block_is_consumed_as_one_statement() {
        let output = parse_dbc(
            "NS_ :\n\
             \tNS_DESC_\n\
             \tCM_\n\
             \n\
             BS_:\n\
             BU_: ECU1\n",
        );
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        assert_eq!(
            output.network.new_symbols,
            vec!["NS_DESC_".to_string(), "CM_".to_string()]
        );
    }

    #[test]
    fn bit_timing_values_are_applied() {
        let output = parse_dbc("BS_: 250000 : 1,2\n");
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.network.bit_timing.baudrate, 250000);
        assert_eq!(output.network.bit_timing.btr1, 1);
        assert_eq!(output.network.bit_timing.btr2, 2);
    }
}
