//! A CAN database (DBC) network model and parser, written in Rust.
//!
//! The parser takes already-materialized DBC text, recognizes one statement
//! at a time, and folds each into a [`Network`]: nodes, messages with their
//! signals and signal groups, value tables, environment variables, signal
//! types and the attribute system. Problems are reported through a
//! [`DiagnosticSink`] and recovered at the next statement boundary, so one
//! bad line costs one diagnostic, not the parse.
//!
//! ```rust
//! use candb::parse_dbc;
//!
//! let output = parse_dbc(
//!     "VERSION \"1.0\"\n\
//!      BU_: ECU1 ECU2\n\
//!      BO_ 100 TestMsg: 8 ECU1\n \
//!      SG_ Sig1 : 0|8@1+ (1,0) [0|255] \"\" ECU2\n",
//! );
//! assert!(output.diagnostics.is_empty());
//! assert_eq!(output.network.message(100).unwrap().name, "TestMsg");
//! ```

#![recursion_limit = "256"]

#[macro_use]
extern crate enum_primitive;
#[macro_use]
extern crate nom;

#[cfg(test)]
#[macro_use]
extern crate lazy_static;

pub mod builder;
pub mod dbc;
pub mod decode;
pub mod diag;
pub mod engine;
pub mod network;

pub use crate::builder::{NetworkBuilder, ReferenceMode};
pub use crate::dbc::{Entry, EntryType, ParseEntryError};
pub use crate::decode::ParseFrame;
pub use crate::diag::{Diagnostic, DiagnosticSink, Location, Severity};
pub use crate::engine::{
    from_dbc_file, parse_dbc, parse_dbc_with, ParseInterrupted, ParseOptions, ParseOutput,
};
pub use crate::network::{
    AccessType, Attribute, AttributeDefinition, AttributeObjectType, AttributeRelation,
    AttributeValue, AttributeValueType, BitTiming, ByteOrder, EnvironmentVariable,
    EnvironmentVariableType, ExtendedMultiplexor, ExtendedValueType, Message,
    MultiplexIndicator, Network, Node, RelationTarget, Signal, SignalGroup, SignalType,
    ValueTable, ValueType,
};
