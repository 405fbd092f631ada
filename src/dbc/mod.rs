//! DBC statement definitions.
//!
//! Every recognized statement kind has a plain-data struct here, composed
//! into the [`Entry`] enum by the productions in [`parser`]. Entries carry
//! the statement exactly as written (raw receiver lists, raw access bitmask,
//! untyped attribute values); the semantic work of folding them into a
//! [`crate::network::Network`] happens in [`crate::builder`].

use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::network::{
    AttributeObjectType, AttributeValueType, BitTiming, ByteOrder, MultiplexIndicator,
    RelationTarget, ValueType,
};

pub mod parser;

/// `VERSION "..."`
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Version(pub String);

/// `NS_ :` followed by the new-symbol lines.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewSymbols(pub Vec<String>);

/// `BU_: <node>*`
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NodeList(pub Vec<String>);

/// `VAL_TABLE_ <name> {<code> "<label>"}* ;`
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ValueTableDefinition {
    pub name: String,
    pub entries: Vec<(i64, String)>,
}

/// `BO_ <id> <name>: <size> <transmitter>`
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MessageDefinition {
    pub id: u32,
    pub name: String,
    pub size: u32,
    pub transmitter: String,
}

/// `SG_ <name> [mux] : <start>|<size>@<order><sign> (<factor>,<offset>)
/// [<min>|<max>] "<unit>" <receivers>`
///
/// Attaches to the most recent `BO_` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDefinition {
    pub name: String,
    pub multiplex: MultiplexIndicator,
    pub start_bit: u32,
    pub bit_size: u32,
    pub byte_order: ByteOrder,
    pub value_type: ValueType,
    pub factor: f64,
    pub offset: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub unit: String,
    pub receivers: Vec<String>,
}

/// `BO_TX_BU_ <id> : <node>,<node>;`
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MessageTransmitters {
    pub id: u32,
    pub transmitters: Vec<String>,
}

/// `VAL_ <id> <signal> {<code> "<label>"}* ;`
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SignalValueDescriptions {
    pub id: u32,
    pub signal: String,
    pub entries: Vec<(i64, String)>,
}

/// `VAL_ <envvar> {<code> "<label>"}* ;`
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EnvVarValueDescriptions {
    pub name: String,
    pub entries: Vec<(i64, String)>,
}

/// `EV_ <name>: <type> [<min>|<max>] "<unit>" <initial> <id>
/// DUMMY_NODE_VECTOR<access> <node>,<node>;`
///
/// `raw_type` and `raw_access` are kept as written; the handler derives the
/// final variable type and access rights from them.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentVariableDefinition {
    pub name: String,
    pub raw_type: u32,
    pub minimum: f64,
    pub maximum: f64,
    pub unit: String,
    pub initial_value: f64,
    pub id: u64,
    pub raw_access: u32,
    pub access_nodes: Vec<String>,
}

/// `ENVVAR_DATA_ <name>: <size>;`
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EnvironmentVariableData {
    pub name: String,
    pub size: u32,
}

/// `SGTYPE_ <name>: <size>@<order><sign> (<factor>,<offset>) [<min>|<max>]
/// "<unit>" <default>, <value table>;`
#[derive(Debug, Clone, PartialEq)]
pub struct SignalTypeDefinition {
    pub name: String,
    pub size: u32,
    pub byte_order: ByteOrder,
    pub value_type: ValueType,
    pub factor: f64,
    pub offset: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub unit: String,
    pub default_value: f64,
    pub value_table: String,
}

/// `SIG_GROUP_ <id> <name> <repetitions> : <signal>*;`
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SignalGroupDefinition {
    pub id: u32,
    pub name: String,
    pub repetitions: u32,
    pub signals: Vec<String>,
}

/// Object a `CM_` statement annotates.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CommentTarget {
    Network,
    Node(String),
    Message(u32),
    Signal(u32, String),
    EnvironmentVariable(String),
}

/// `CM_ [BU_|BO_|SG_|EV_ ...] "<text>";`
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Comment {
    pub target: CommentTarget,
    pub text: String,
}

/// Attribute value token as written, before re-typing against the
/// attribute's definition.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Integer(i64),
    Double(f64),
    Text(String),
}

/// `BA_DEF_ [<object>] "<name>" <value type>;` and the `BA_DEF_REL_` form.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDefinitionEntry {
    pub object_type: AttributeObjectType,
    pub name: String,
    pub value_type: AttributeValueType,
}

/// `BA_DEF_DEF_ "<name>" <value>;` and the `BA_DEF_DEF_REL_` form.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDefault {
    pub name: String,
    pub value: RawValue,
}

/// Object a `BA_` statement attaches to.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AttributeTarget {
    Network,
    Node(String),
    Message(u32),
    Signal(u32, String),
    EnvironmentVariable(String),
}

/// `BA_ "<name>" [<object>] <value>;`
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeValueEntry {
    pub name: String,
    pub target: AttributeTarget,
    pub value: RawValue,
}

/// `BA_REL_ "<name>" <relation> <value>;`
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRelationEntry {
    pub name: String,
    pub node: String,
    pub target: RelationTarget,
    pub value: RawValue,
}

/// `SIG_VALTYPE_ <id> <signal> : <type>;`
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SignalExtendedValueTypeEntry {
    pub id: u32,
    pub signal: String,
    pub raw_type: u32,
}

/// `SG_MUL_VAL_ <id> <signal> <switch> <low>-<high>{, <low>-<high>} ;`
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ExtendedMultiplexingEntry {
    pub id: u32,
    pub signal: String,
    pub switch: String,
    /// Ranges exactly as written; no reordering of low/high.
    pub ranges: Vec<(u64, u64)>,
}

/// One recognized DBC statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Version(Version),
    NewSymbols(NewSymbols),
    BitTiming(Option<BitTiming>),
    Nodes(NodeList),
    ValueTable(ValueTableDefinition),
    MessageDefinition(MessageDefinition),
    SignalDefinition(SignalDefinition),
    MessageTransmitters(MessageTransmitters),
    SignalValueDescriptions(SignalValueDescriptions),
    EnvVarValueDescriptions(EnvVarValueDescriptions),
    EnvironmentVariable(EnvironmentVariableDefinition),
    EnvironmentVariableData(EnvironmentVariableData),
    SignalType(SignalTypeDefinition),
    SignalGroup(SignalGroupDefinition),
    Comment(Comment),
    AttributeDefinition(AttributeDefinitionEntry),
    AttributeDefault(AttributeDefault),
    AttributeValue(AttributeValueEntry),
    AttributeRelationValue(AttributeRelationEntry),
    SignalExtendedValueType(SignalExtendedValueTypeEntry),
    ExtendedMultiplexing(ExtendedMultiplexingEntry),
    /// A line no production recognized, kept verbatim for diagnostics.
    Unknown(String),
}

impl Entry {
    /// Returns the opaque statement kind of this entry.
    pub fn kind(&self) -> EntryType {
        match self {
            Entry::Version(_) => EntryType::Version,
            Entry::NewSymbols(_) => EntryType::NewSymbols,
            Entry::BitTiming(_) => EntryType::BitTiming,
            Entry::Nodes(_) => EntryType::Nodes,
            Entry::ValueTable(_) => EntryType::ValueTable,
            Entry::MessageDefinition(_) => EntryType::MessageDefinition,
            Entry::SignalDefinition(_) => EntryType::SignalDefinition,
            Entry::MessageTransmitters(_) => EntryType::MessageTransmitters,
            Entry::SignalValueDescriptions(_) => EntryType::SignalValueDescriptions,
            Entry::EnvVarValueDescriptions(_) => EntryType::EnvVarValueDescriptions,
            Entry::EnvironmentVariable(_) => EntryType::EnvironmentVariable,
            Entry::EnvironmentVariableData(_) => EntryType::EnvironmentVariableData,
            Entry::SignalType(_) => EntryType::SignalType,
            Entry::SignalGroup(_) => EntryType::SignalGroup,
            Entry::Comment(_) => EntryType::Comment,
            Entry::AttributeDefinition(_) => EntryType::AttributeDefinition,
            Entry::AttributeDefault(_) => EntryType::AttributeDefault,
            Entry::AttributeValue(_) => EntryType::AttributeValue,
            Entry::AttributeRelationValue(_) => EntryType::AttributeRelationValue,
            Entry::SignalExtendedValueType(_) => EntryType::SignalExtendedValueType,
            Entry::ExtendedMultiplexing(_) => EntryType::ExtendedMultiplexing,
            Entry::Unknown(_) => EntryType::Unknown,
        }
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.kind().fmt(f)
    }
}

/// Statement kind, displayed as the statement's keyword.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EntryType {
    Version,
    NewSymbols,
    BitTiming,
    Nodes,
    ValueTable,
    MessageDefinition,
    SignalDefinition,
    MessageTransmitters,
    SignalValueDescriptions,
    EnvVarValueDescriptions,
    EnvironmentVariable,
    EnvironmentVariableData,
    SignalType,
    SignalGroup,
    Comment,
    AttributeDefinition,
    AttributeDefault,
    AttributeValue,
    AttributeRelationValue,
    SignalExtendedValueType,
    ExtendedMultiplexing,
    Unknown,
}

impl Display for EntryType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let keyword = match self {
            EntryType::Version => "VERSION",
            EntryType::NewSymbols => "NS_",
            EntryType::BitTiming => "BS_",
            EntryType::Nodes => "BU_",
            EntryType::ValueTable => "VAL_TABLE_",
            EntryType::MessageDefinition => "BO_",
            EntryType::SignalDefinition => "SG_",
            EntryType::MessageTransmitters => "BO_TX_BU_",
            EntryType::SignalValueDescriptions => "VAL_",
            EntryType::EnvVarValueDescriptions => "VAL_",
            EntryType::EnvironmentVariable => "EV_",
            EntryType::EnvironmentVariableData => "ENVVAR_DATA_",
            EntryType::SignalType => "SGTYPE_",
            EntryType::SignalGroup => "SIG_GROUP_",
            EntryType::Comment => "CM_",
            EntryType::AttributeDefinition => "BA_DEF_",
            EntryType::AttributeDefault => "BA_DEF_DEF_",
            EntryType::AttributeValue => "BA_",
            EntryType::AttributeRelationValue => "BA_REL_",
            EntryType::SignalExtendedValueType => "SIG_VALTYPE_",
            EntryType::ExtendedMultiplexing => "SG_MUL_VAL_",
            EntryType::Unknown => "unknown statement",
        };
        write!(f, "{}", keyword)
    }
}

/// Error returned on failure to parse a single DBC `Entry`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParseEntryError {
    kind: EntryErrorKind,
}

impl Display for ParseEntryError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl Error for ParseEntryError {}

#[derive(Debug, Clone, Eq, PartialEq)]
enum EntryErrorKind {
    /// Input could not be consumed as a statement at all.
    Syntax,
    /// Input formed a line, but no statement production matched it.
    Unrecognized,
}

impl Display for EntryErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            EntryErrorKind::Syntax => write!(f, "could not parse input as a DBC statement"),
            EntryErrorKind::Unrecognized => write!(f, "no statement production matched input"),
        }
    }
}

impl From<EntryErrorKind> for ParseEntryError {
    fn from(kind: EntryErrorKind) -> Self {
        ParseEntryError { kind }
    }
}

impl FromStr for Entry {
    type Err = ParseEntryError;

    /// Parses a single statement. Unlike the permissive statement loop in
    /// [`crate::engine`], an unrecognized line is an error here, not an
    /// `Entry::Unknown`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let owned;
        let input = if line.ends_with('\n') {
            line
        } else {
            owned = format!("{}\n", line);
            &owned
        };
        match parser::entry(input) {
            Ok((_rest, Entry::Unknown(_))) => Err(EntryErrorKind::Unrecognized.into()),
            Ok((_rest, entry)) => Ok(entry),
            Err(_) => Err(EntryErrorKind::Syntax.into()),
        }
    }
}
