//! The in-memory CAN network model populated by the parser.
//!
//! `Network` is the single owner of every entity described by a DBC file:
//! nodes, messages with their signals and signal groups, value tables,
//! environment variables, signal types and the attribute system. Consumers
//! treat a returned `Network` as read-only; only the statement handlers in
//! [`crate::builder`] mutate it during a parse.

use std::collections::{HashMap, HashSet};

/// Bit-numbering convention for a signal's start bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Motorola, byte-order token `0`.
    BigEndian,
    /// Intel, byte-order token `1`.
    LittleEndian,
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::LittleEndian
    }
}

/// Raw value interpretation of a signal, sign token `-` or `+`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Signed,
    Unsigned,
}

impl Default for ValueType {
    fn default() -> Self {
        ValueType::Unsigned
    }
}

enum_from_primitive! {
/// `SIG_VALTYPE_` refinement of a signal's raw value, independent of its
/// bit layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendedValueType {
    Integer = 0,
    Float = 1,
    Double = 2,
}
}

impl Default for ExtendedValueType {
    fn default() -> Self {
        ExtendedValueType::Integer
    }
}

/// Multiplexing role of a signal within its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiplexIndicator {
    /// Always present in the frame.
    None,
    /// The switch signal (`M`): its value selects the multiplexed signals.
    Switch,
    /// Present when the switch carries the given value (`m<N>`).
    Switched(u64),
}

impl Default for MultiplexIndicator {
    fn default() -> Self {
        MultiplexIndicator::None
    }
}

enum_from_primitive! {
/// Declared type of an environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentVariableType {
    Integer = 0,
    Float = 1,
    String = 2,
    Data = 3,
}
}

impl Default for EnvironmentVariableType {
    fn default() -> Self {
        EnvironmentVariableType::Integer
    }
}

enum_from_primitive! {
/// Access rights of an environment variable, low bits of the
/// `DUMMY_NODE_VECTOR` bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    Unrestricted = 0,
    Read = 1,
    Write = 2,
    ReadWrite = 3,
}
}

impl Default for AccessType {
    fn default() -> Self {
        AccessType::Unrestricted
    }
}

/// Object kind an attribute definition applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeObjectType {
    Network,
    Node,
    Message,
    Signal,
    EnvironmentVariable,
    /// `BU_EV_REL_`
    NodeEnvironmentVariableRelation,
    /// `BU_BO_REL_`
    NodeTxMessageRelation,
    /// `BU_SG_REL_`
    NodeRxSignalRelation,
}

impl Default for AttributeObjectType {
    fn default() -> Self {
        AttributeObjectType::Network
    }
}

/// Value-type descriptor of an attribute definition.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValueType {
    Int { minimum: i64, maximum: i64 },
    Hex { minimum: i64, maximum: i64 },
    Float { minimum: f64, maximum: f64 },
    String,
    /// Ordered list of labels; attribute values index into it.
    Enum(Vec<String>),
}

impl Default for AttributeValueType {
    fn default() -> Self {
        AttributeValueType::String
    }
}

/// A single typed attribute value, constructor chosen by the attribute's
/// definition.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Int(i64),
    Hex(i64),
    Float(f64),
    String(String),
    /// Enum label for signal attributes, raw index text elsewhere.
    Enum(String),
}

/// `BA_DEF_` / `BA_DEF_REL_` entry: name, applicability and value type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeDefinition {
    pub name: String,
    pub object_type: AttributeObjectType,
    pub value_type: AttributeValueType,
}

/// A concrete attribute attached to the network or one of its objects.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub object_type: AttributeObjectType,
    pub value: AttributeValue,
}

/// Relation key of a `BA_REL_` attribute: always a node, plus the related
/// object depending on the relation kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationTarget {
    EnvironmentVariable(String),
    Message(u32),
    Signal(u32, String),
}

/// An attribute attached to a node↔object relation.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRelation {
    pub attribute: Attribute,
    pub node: String,
    pub target: RelationTarget,
}

/// `BS_:` bus parameters. All zero when the statement carries no values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitTiming {
    pub baudrate: u32,
    pub btr1: u32,
    pub btr2: u32,
}

/// A participant on the bus (`BU_`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub name: String,
    pub comment: String,
    pub attribute_values: HashMap<String, Attribute>,
}

impl Node {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Node {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A named code→label mapping usable by multiple signals (`VAL_TABLE_`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueTable {
    pub name: String,
    pub value_descriptions: HashMap<i64, String>,
}

/// A bit-field within a message representing one physical quantity (`SG_`).
///
/// `minimum`/`maximum` are physical-domain bounds: the raw integer relates to
/// the physical value as `physical = raw * factor + offset`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signal {
    pub name: String,
    pub multiplex: MultiplexIndicator,
    pub start_bit: u32,
    pub bit_size: u32,
    pub byte_order: ByteOrder,
    pub value_type: ValueType,
    pub extended_value_type: ExtendedValueType,
    pub factor: f64,
    pub offset: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub unit: String,
    pub receivers: HashSet<String>,
    pub value_descriptions: HashMap<i64, String>,
    pub extended_multiplexors: HashMap<String, ExtendedMultiplexor>,
    pub comment: String,
    pub attribute_values: HashMap<String, Attribute>,
}

/// `SG_MUL_VAL_` entry: the switch signal and the inclusive value ranges
/// under which the owning signal is transmitted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtendedMultiplexor {
    pub switch_name: String,
    /// `(low, high)` pairs, inclusive, in the literal order of the source.
    pub value_ranges: HashSet<(u64, u64)>,
}

/// A group of signals within a message (`SIG_GROUP_`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignalGroup {
    pub message_id: u32,
    pub name: String,
    pub repetitions: u32,
    pub signals: HashSet<String>,
}

/// A CAN frame definition (`BO_`) and everything attached to it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Message {
    pub id: u32,
    pub name: String,
    /// Payload length in bytes.
    pub size: u32,
    /// Primary transmitter; empty when the file names no node.
    pub transmitter: String,
    /// Additional transmitters from `BO_TX_BU_`.
    pub transmitters: HashSet<String>,
    pub signals: HashMap<String, Signal>,
    pub signal_groups: HashMap<String, SignalGroup>,
    pub comment: String,
    pub attribute_values: HashMap<String, Attribute>,
}

impl Message {
    /// Placeholder for a message referenced before its `BO_` statement.
    pub(crate) fn stub(id: u32) -> Self {
        Message {
            id,
            ..Default::default()
        }
    }
}

/// A DBC-level named variable not tied to a specific message (`EV_`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnvironmentVariable {
    pub name: String,
    pub kind: EnvironmentVariableType,
    pub minimum: f64,
    pub maximum: f64,
    pub unit: String,
    pub initial_value: f64,
    pub id: u64,
    pub access_type: AccessType,
    pub access_nodes: HashSet<String>,
    pub value_descriptions: HashMap<i64, String>,
    /// Payload length, only meaningful for `Data` variables.
    pub data_size: u32,
    pub comment: String,
    pub attribute_values: HashMap<String, Attribute>,
}

/// A named, purely descriptive signal prototype (`SGTYPE_`). Not linked to
/// signals automatically.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignalType {
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
    /// Value-table name reference, left unresolved.
    pub value_table: String,
}

/// The aggregate produced by one parse: the root of the model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Network {
    pub version: String,
    pub new_symbols: Vec<String>,
    pub bit_timing: BitTiming,
    pub nodes: HashMap<String, Node>,
    pub value_tables: HashMap<String, ValueTable>,
    pub messages: HashMap<u32, Message>,
    pub environment_variables: HashMap<String, EnvironmentVariable>,
    pub signal_types: HashMap<String, SignalType>,
    pub attribute_definitions: HashMap<String, AttributeDefinition>,
    pub attribute_defaults: HashMap<String, Attribute>,
    pub attribute_values: HashMap<String, Attribute>,
    pub attribute_relation_values: HashMap<String, AttributeRelation>,
    pub comment: String,
}

impl Network {
    /// Returns a message definition by frame id, if it exists.
    pub fn message(&self, id: u32) -> Option<&Message> {
        self.messages.get(&id)
    }

    /// Returns a signal within a message, if both exist.
    pub fn signal(&self, id: u32, name: &str) -> Option<&Signal> {
        self.messages.get(&id).and_then(|m| m.signals.get(name))
    }

    /// Returns a node by name, if it exists.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Returns an environment variable by name, if it exists.
    pub fn environment_variable(&self, name: &str) -> Option<&EnvironmentVariable> {
        self.environment_variables.get(name)
    }

    /// Searches every message for a signal with the given name.
    pub fn find_signal(&self, name: &str) -> Option<&Signal> {
        self.messages
            .values()
            .filter_map(|m| m.signals.get(name))
            .next()
    }
}
