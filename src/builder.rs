//! Statement handlers: folding parsed entries into a [`Network`].
//!
//! `NetworkBuilder` owns the network under construction plus the one piece of
//! cross-statement state the grammar needs — the id of the most recent `BO_`
//! statement, which `SG_` lines attach to. Each handler commits its effect
//! atomically; a handler that cannot resolve its references reports to the
//! sink and leaves the network untouched.
//!
//! Annotation statements may name entities that do not exist yet. Resolution
//! is explicit: [`ReferenceMode::Lenient`] creates a stub entity and reports
//! a warning, [`ReferenceMode::Strict`] reports an error and drops the
//! statement.

use enum_primitive::FromPrimitive;
use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;

use crate::dbc::{
    AttributeDefault, AttributeDefinitionEntry, AttributeRelationEntry, AttributeTarget,
    AttributeValueEntry, Comment, CommentTarget, Entry, EnvironmentVariableData,
    EnvironmentVariableDefinition, ExtendedMultiplexingEntry, MessageDefinition,
    MessageTransmitters, NewSymbols, NodeList, RawValue, SignalDefinition,
    SignalExtendedValueTypeEntry, SignalGroupDefinition, SignalTypeDefinition,
    SignalValueDescriptions, ValueTableDefinition, Version,
};
use crate::diag::{Diagnostic, DiagnosticSink, Location};
use crate::network::{
    AccessType, Attribute, AttributeDefinition, AttributeRelation, AttributeValue,
    AttributeValueType, EnvironmentVariable, EnvironmentVariableType, ExtendedMultiplexor,
    ExtendedValueType, Message, Network, Node, Signal, SignalGroup, SignalType, ValueTable,
};

/// How annotation statements resolve references to entities that have not
/// been defined yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceMode {
    /// Create a stub entity and report a warning.
    Lenient,
    /// Report an error and drop the statement.
    Strict,
}

impl Default for ReferenceMode {
    fn default() -> Self {
        ReferenceMode::Lenient
    }
}

/// Result of an explicit find-or-insert lookup.
enum Lookup<'a, T> {
    Found(&'a mut T),
    Created(&'a mut T),
    Missing,
}

fn map_lookup<'a, K, T, F>(
    map: &'a mut HashMap<K, T>,
    key: K,
    mode: ReferenceMode,
    stub: F,
) -> Lookup<'a, T>
where
    K: std::hash::Hash + Eq,
    F: FnOnce() -> T,
{
    match map.entry(key) {
        MapEntry::Occupied(occupied) => Lookup::Found(occupied.into_mut()),
        MapEntry::Vacant(vacant) => match mode {
            ReferenceMode::Lenient => Lookup::Created(vacant.insert(stub())),
            ReferenceMode::Strict => Lookup::Missing,
        },
    }
}

/// The no-node sentinel is not a real participant and never lands in a
/// receiver, transmitter or access-node set.
fn is_placeholder_node(name: &str) -> bool {
    name == "Vector__XXX" || name == "VECTOR_XXX"
}

/// Converts a raw attribute value token into the typed value dictated by the
/// attribute's definition. Enum indices are resolved to their label only
/// when `resolve_enum` is set (signal attributes); every other object kind
/// keeps the raw index as text.
fn typed_value(
    definition: &AttributeDefinition,
    raw: &RawValue,
    resolve_enum: bool,
) -> Result<AttributeValue, String> {
    match (&definition.value_type, raw) {
        (AttributeValueType::Int { .. }, RawValue::Integer(value)) => {
            Ok(AttributeValue::Int(*value))
        }
        (AttributeValueType::Int { .. }, RawValue::Double(value)) if value.fract() == 0.0 => {
            Ok(AttributeValue::Int(*value as i64))
        }
        (AttributeValueType::Hex { .. }, RawValue::Integer(value)) => {
            Ok(AttributeValue::Hex(*value))
        }
        (AttributeValueType::Hex { .. }, RawValue::Double(value)) if value.fract() == 0.0 => {
            Ok(AttributeValue::Hex(*value as i64))
        }
        (AttributeValueType::Float { .. }, RawValue::Integer(value)) => {
            Ok(AttributeValue::Float(*value as f64))
        }
        (AttributeValueType::Float { .. }, RawValue::Double(value)) => {
            Ok(AttributeValue::Float(*value))
        }
        (AttributeValueType::String, RawValue::Text(text)) => {
            Ok(AttributeValue::String(text.clone()))
        }
        (AttributeValueType::Enum(_), RawValue::Text(text)) => {
            Ok(AttributeValue::Enum(text.clone()))
        }
        (AttributeValueType::Enum(labels), RawValue::Integer(index)) => {
            if !resolve_enum {
                return Ok(AttributeValue::Enum(index.to_string()));
            }
            if *index < 0 || *index as usize >= labels.len() {
                return Err(format!(
                    "enum index {} out of range for attribute `{}`",
                    index, definition.name
                ));
            }
            Ok(AttributeValue::Enum(labels[*index as usize].clone()))
        }
        _ => Err(format!(
            "value does not match the declared type of attribute `{}`",
            definition.name
        )),
    }
}

/// Builds a [`Network`] from a stream of entries.
pub struct NetworkBuilder {
    network: Network,
    last_message_id: Option<u32>,
    mode: ReferenceMode,
}

impl NetworkBuilder {
    pub fn new(mode: ReferenceMode) -> Self {
        NetworkBuilder {
            network: Network::default(),
            last_message_id: None,
            mode,
        }
    }

    /// Consumes the builder and returns the populated network.
    pub fn finish(self) -> Network {
        self.network
    }

    /// Applies one statement. Reference failures and type mismatches go to
    /// the sink; the statement is dropped, never the parse.
    pub fn apply(&mut self, entry: Entry, location: Location, sink: &mut dyn DiagnosticSink) {
        match entry {
            Entry::Version(Version(version)) => self.network.version = version,
            Entry::NewSymbols(NewSymbols(symbols)) => self.network.new_symbols = symbols,
            Entry::BitTiming(timing) => {
                if let Some(timing) = timing {
                    self.network.bit_timing = timing;
                }
            }
            Entry::Nodes(NodeList(names)) => {
                for name in names {
                    if is_placeholder_node(&name) {
                        continue;
                    }
                    self.network
                        .nodes
                        .entry(name.clone())
                        .or_insert_with(|| Node::new(name));
                }
            }
            Entry::ValueTable(def) => {
                let ValueTableDefinition { name, entries } = def;
                let table = ValueTable {
                    name: name.clone(),
                    value_descriptions: entries.into_iter().collect(),
                };
                self.network.value_tables.insert(name, table);
            }
            Entry::MessageDefinition(def) => {
                // Last write wins: a second BO_ with the same id replaces the
                // first wholesale, signals included.
                let MessageDefinition {
                    id,
                    name,
                    size,
                    transmitter,
                } = def;
                let transmitter = if is_placeholder_node(&transmitter) {
                    String::new()
                } else {
                    transmitter
                };
                self.network.messages.insert(
                    id,
                    Message {
                        id,
                        name,
                        size,
                        transmitter,
                        ..Default::default()
                    },
                );
                self.last_message_id = Some(id);
            }
            Entry::SignalDefinition(def) => self.handle_signal_definition(def, location, sink),
            Entry::MessageTransmitters(def) => {
                let MessageTransmitters { id, transmitters } = def;
                if let Some(message) = self.message_mut(id, location, sink) {
                    message.transmitters = transmitters
                        .into_iter()
                        .filter(|t| !is_placeholder_node(t))
                        .collect();
                }
            }
            Entry::SignalValueDescriptions(def) => {
                let SignalValueDescriptions {
                    id,
                    signal,
                    entries,
                } = def;
                if let Some(signal) = self.signal_mut(id, &signal, location, sink) {
                    signal.value_descriptions = entries.into_iter().collect();
                }
            }
            Entry::EnvVarValueDescriptions(def) => {
                let entries = def.entries;
                if let Some(variable) = self.env_var_mut(&def.name, location, sink) {
                    variable.value_descriptions = entries.into_iter().collect();
                }
            }
            Entry::EnvironmentVariable(def) => {
                self.handle_environment_variable(def, location, sink)
            }
            Entry::EnvironmentVariableData(def) => {
                let EnvironmentVariableData { name, size } = def;
                if let Some(variable) = self.env_var_mut(&name, location, sink) {
                    variable.kind = EnvironmentVariableType::Data;
                    variable.data_size = size;
                }
            }
            Entry::SignalType(def) => {
                let SignalTypeDefinition {
                    name,
                    size,
                    byte_order,
                    value_type,
                    factor,
                    offset,
                    minimum,
                    maximum,
                    unit,
                    default_value,
                    value_table,
                } = def;
                self.network.signal_types.insert(
                    name.clone(),
                    SignalType {
                        name,
                        size,
                        byte_order,
                        value_type,
                        factor,
                        offset,
                        minimum,
                        maximum,
                        unit,
                        default_value,
                        value_table,
                    },
                );
            }
            Entry::SignalGroup(def) => {
                let SignalGroupDefinition {
                    id,
                    name,
                    repetitions,
                    signals,
                } = def;
                if let Some(message) = self.message_mut(id, location, sink) {
                    message.signal_groups.insert(
                        name.clone(),
                        SignalGroup {
                            message_id: id,
                            name,
                            repetitions,
                            signals: signals.into_iter().collect(),
                        },
                    );
                }
            }
            Entry::Comment(comment) => self.handle_comment(comment, location, sink),
            Entry::AttributeDefinition(def) => {
                let AttributeDefinitionEntry {
                    object_type,
                    name,
                    value_type,
                } = def;
                self.network.attribute_definitions.insert(
                    name.clone(),
                    AttributeDefinition {
                        name,
                        object_type,
                        value_type,
                    },
                );
            }
            Entry::AttributeDefault(def) => self.handle_attribute_default(def, location, sink),
            Entry::AttributeValue(def) => self.handle_attribute_value(def, location, sink),
            Entry::AttributeRelationValue(def) => {
                self.handle_attribute_relation(def, location, sink)
            }
            Entry::SignalExtendedValueType(def) => {
                self.handle_signal_extended_value_type(def, location, sink)
            }
            Entry::ExtendedMultiplexing(def) => {
                let ExtendedMultiplexingEntry {
                    id,
                    signal,
                    switch,
                    ranges,
                } = def;
                if let Some(signal) = self.signal_mut(id, &signal, location, sink) {
                    signal.extended_multiplexors.insert(
                        switch.clone(),
                        ExtendedMultiplexor {
                            switch_name: switch,
                            value_ranges: ranges.into_iter().collect(),
                        },
                    );
                }
            }
            // The statement loop reports unknown lines itself.
            Entry::Unknown(_) => {}
        }
    }

    fn handle_signal_definition(
        &mut self,
        def: SignalDefinition,
        location: Location,
        sink: &mut dyn DiagnosticSink,
    ) {
        let id = match self.last_message_id {
            Some(id) => id,
            None => {
                sink.report(Diagnostic::error(
                    location,
                    "SG_ without a preceding BO_ statement",
                ));
                return;
            }
        };
        let SignalDefinition {
            name,
            multiplex,
            start_bit,
            bit_size,
            byte_order,
            value_type,
            factor,
            offset,
            minimum,
            maximum,
            unit,
            receivers,
        } = def;
        let signal = Signal {
            name: name.clone(),
            multiplex,
            start_bit,
            bit_size,
            byte_order,
            value_type,
            factor,
            offset,
            minimum,
            maximum,
            unit,
            receivers: receivers
                .into_iter()
                .filter(|r| !is_placeholder_node(r))
                .collect(),
            ..Default::default()
        };
        if let Some(message) = self.network.messages.get_mut(&id) {
            message.signals.insert(name, signal);
        }
    }

    fn handle_environment_variable(
        &mut self,
        def: EnvironmentVariableDefinition,
        location: Location,
        sink: &mut dyn DiagnosticSink,
    ) {
        let EnvironmentVariableDefinition {
            name,
            raw_type,
            minimum,
            maximum,
            unit,
            initial_value,
            id,
            raw_access,
            access_nodes,
        } = def;

        // The top bit of the access bitmask forces the string type; this
        // overrides whatever type token was declared.
        let kind = if raw_access & 0x8000 != 0 {
            EnvironmentVariableType::String
        } else {
            match EnvironmentVariableType::from_u64(u64::from(raw_type)) {
                Some(kind) => kind,
                None => {
                    sink.report(Diagnostic::warning(
                        location,
                        format!(
                            "environment variable `{}` declares unknown type token {}",
                            name, raw_type
                        ),
                    ));
                    EnvironmentVariableType::Integer
                }
            }
        };
        let access_type = match AccessType::from_u64(u64::from(raw_access & 0x7fff)) {
            Some(access) => access,
            None => {
                sink.report(Diagnostic::warning(
                    location,
                    format!(
                        "environment variable `{}` declares unknown access value {:#x}",
                        name, raw_access
                    ),
                ));
                AccessType::Unrestricted
            }
        };

        let variable = EnvironmentVariable {
            name: name.clone(),
            kind,
            minimum,
            maximum,
            unit,
            initial_value,
            id,
            access_type,
            access_nodes: access_nodes
                .into_iter()
                .filter(|n| !is_placeholder_node(n))
                .collect(),
            ..Default::default()
        };
        self.network.environment_variables.insert(name, variable);
    }

    fn handle_comment(
        &mut self,
        comment: Comment,
        location: Location,
        sink: &mut dyn DiagnosticSink,
    ) {
        let Comment { target, text } = comment;
        match target {
            CommentTarget::Network => self.network.comment = text,
            CommentTarget::Node(node) => {
                if let Some(node) = self.node_mut(&node, location, sink) {
                    node.comment = text;
                }
            }
            CommentTarget::Message(id) => {
                if let Some(message) = self.message_mut(id, location, sink) {
                    message.comment = text;
                }
            }
            CommentTarget::Signal(id, signal) => {
                if let Some(signal) = self.signal_mut(id, &signal, location, sink) {
                    signal.comment = text;
                }
            }
            CommentTarget::EnvironmentVariable(name) => {
                if let Some(variable) = self.env_var_mut(&name, location, sink) {
                    variable.comment = text;
                }
            }
        }
    }

    fn handle_attribute_default(
        &mut self,
        def: AttributeDefault,
        location: Location,
        sink: &mut dyn DiagnosticSink,
    ) {
        let definition = match self.definition_of(&def.name, location, sink) {
            Some(definition) => definition,
            None => return,
        };
        match typed_value(&definition, &def.value, false) {
            Ok(value) => {
                self.network.attribute_defaults.insert(
                    def.name.clone(),
                    Attribute {
                        name: def.name,
                        object_type: definition.object_type,
                        value,
                    },
                );
            }
            Err(message) => sink.report(Diagnostic::error(location, message)),
        }
    }

    fn handle_attribute_value(
        &mut self,
        def: AttributeValueEntry,
        location: Location,
        sink: &mut dyn DiagnosticSink,
    ) {
        let definition = match self.definition_of(&def.name, location, sink) {
            Some(definition) => definition,
            None => return,
        };
        // Enum resolution to the label text applies to signal attributes
        // only; all other object kinds keep the raw index.
        let resolve_enum = matches!(def.target, AttributeTarget::Signal(_, _));
        let value = match typed_value(&definition, &def.value, resolve_enum) {
            Ok(value) => value,
            Err(message) => {
                sink.report(Diagnostic::error(location, message));
                return;
            }
        };
        let attribute = Attribute {
            name: def.name.clone(),
            object_type: definition.object_type,
            value,
        };
        match def.target {
            AttributeTarget::Network => {
                self.network.attribute_values.insert(def.name, attribute);
            }
            AttributeTarget::Node(node) => {
                if let Some(node) = self.node_mut(&node, location, sink) {
                    node.attribute_values.insert(def.name, attribute);
                }
            }
            AttributeTarget::Message(id) => {
                if let Some(message) = self.message_mut(id, location, sink) {
                    message.attribute_values.insert(def.name, attribute);
                }
            }
            AttributeTarget::Signal(id, signal) => {
                if let Some(signal) = self.signal_mut(id, &signal, location, sink) {
                    signal.attribute_values.insert(def.name, attribute);
                }
            }
            AttributeTarget::EnvironmentVariable(name) => {
                if let Some(variable) = self.env_var_mut(&name, location, sink) {
                    variable.attribute_values.insert(def.name, attribute);
                }
            }
        }
    }

    fn handle_attribute_relation(
        &mut self,
        def: AttributeRelationEntry,
        location: Location,
        sink: &mut dyn DiagnosticSink,
    ) {
        let definition = match self.definition_of(&def.name, location, sink) {
            Some(definition) => definition,
            None => return,
        };
        let value = match typed_value(&definition, &def.value, false) {
            Ok(value) => value,
            Err(message) => {
                sink.report(Diagnostic::error(location, message));
                return;
            }
        };
        self.network.attribute_relation_values.insert(
            def.name.clone(),
            AttributeRelation {
                attribute: Attribute {
                    name: def.name,
                    object_type: definition.object_type,
                    value,
                },
                node: def.node,
                target: def.target,
            },
        );
    }

    fn handle_signal_extended_value_type(
        &mut self,
        def: SignalExtendedValueTypeEntry,
        location: Location,
        sink: &mut dyn DiagnosticSink,
    ) {
        let SignalExtendedValueTypeEntry {
            id,
            signal,
            raw_type,
        } = def;
        let kind = match ExtendedValueType::from_u64(u64::from(raw_type)) {
            Some(kind) => kind,
            None => {
                sink.report(Diagnostic::error(
                    location,
                    format!("SIG_VALTYPE_ type token {} out of range", raw_type),
                ));
                return;
            }
        };
        if let Some(signal) = self.signal_mut(id, &signal, location, sink) {
            signal.extended_value_type = kind;
        }
    }

    /// Attribute definitions must precede the defaults and values that name
    /// them; the value cannot be typed otherwise.
    fn definition_of(
        &self,
        name: &str,
        location: Location,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<AttributeDefinition> {
        match self.network.attribute_definitions.get(name) {
            Some(definition) => Some(definition.clone()),
            None => {
                sink.report(Diagnostic::error(
                    location,
                    format!("attribute `{}` used before its definition", name),
                ));
                None
            }
        }
    }

    fn message_mut(
        &mut self,
        id: u32,
        location: Location,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<&mut Message> {
        match map_lookup(&mut self.network.messages, id, self.mode, || {
            Message::stub(id)
        }) {
            Lookup::Found(message) => Some(message),
            Lookup::Created(message) => {
                sink.report(Diagnostic::warning(
                    location,
                    format!("message {} referenced before its BO_ definition", id),
                ));
                Some(message)
            }
            Lookup::Missing => {
                sink.report(Diagnostic::error(
                    location,
                    format!("message {} is not defined", id),
                ));
                None
            }
        }
    }

    fn signal_mut(
        &mut self,
        id: u32,
        name: &str,
        location: Location,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<&mut Signal> {
        let mode = self.mode;
        let message = self.message_mut(id, location, sink)?;
        match map_lookup(&mut message.signals, name.to_string(), mode, || Signal {
            name: name.to_string(),
            ..Default::default()
        }) {
            Lookup::Found(signal) => Some(signal),
            Lookup::Created(signal) => {
                sink.report(Diagnostic::warning(
                    location,
                    format!("signal `{}` referenced before its SG_ definition", name),
                ));
                Some(signal)
            }
            Lookup::Missing => {
                sink.report(Diagnostic::error(
                    location,
                    format!("signal `{}` is not defined in message {}", name, id),
                ));
                None
            }
        }
    }

    fn node_mut(
        &mut self,
        name: &str,
        location: Location,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<&mut Node> {
        match map_lookup(&mut self.network.nodes, name.to_string(), self.mode, || {
            Node::new(name)
        }) {
            Lookup::Found(node) => Some(node),
            Lookup::Created(node) => {
                sink.report(Diagnostic::warning(
                    location,
                    format!("node `{}` referenced before its BU_ declaration", name),
                ));
                Some(node)
            }
            Lookup::Missing => {
                sink.report(Diagnostic::error(
                    location,
                    format!("node `{}` is not declared", name),
                ));
                None
            }
        }
    }

    fn env_var_mut(
        &mut self,
        name: &str,
        location: Location,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<&mut EnvironmentVariable> {
        match map_lookup(
            &mut self.network.environment_variables,
            name.to_string(),
            self.mode,
            || EnvironmentVariable {
                name: name.to_string(),
                ..Default::default()
            },
        ) {
            Lookup::Found(variable) => Some(variable),
            Lookup::Created(variable) => {
                sink.report(Diagnostic::warning(
                    location,
                    format!(
                        "environment variable `{}` referenced before its EV_ definition",
                        name
                    ),
                ));
                Some(variable)
            }
            Lookup::Missing => {
                sink.report(Diagnostic::error(
                    location,
                    format!("environment variable `{}` is not defined", name),
                ));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Severity;
    use std::str::FromStr;

    fn build(lines: &[&str], mode: ReferenceMode) -> (Network, Vec<Diagnostic>) {
        let mut builder = NetworkBuilder::new(mode);
        let mut diagnostics = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            let entry = Entry::from_str(line).expect(line);
            builder.apply(entry, Location::new(index + 1, 1), &mut diagnostics);
        }
        (builder.finish(), diagnostics)
    }

    #[test]
    fn enum_attribute_on_signal_resolves_to_label() {
        let (network, diagnostics) = build(
            &[
                "BO_ 100 TestMsg: 8 ECU1",
                " SG_ Sig1 : 0|8@1+ (1,0) [0|255] \"\" ECU2",
                "BA_DEF_ SG_ \"Speed\" ENUM \"Low\",\"Medium\",\"High\";",
                "BA_ \"Speed\" SG_ 100 Sig1 1;",
            ],
            ReferenceMode::Lenient,
        );
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let attribute = &network.signal(100, "Sig1").unwrap().attribute_values["Speed"];
        assert_eq!(attribute.value, AttributeValue::Enum("Medium".to_string()));
    }

    #[test]
    fn enum_attribute_on_message_keeps_raw_index() {
        let (network, _) = build(
            &[
                "BO_ 100 TestMsg: 8 ECU1",
                "BA_DEF_ BO_ \"SendType\" ENUM \"Cyclic\",\"Spontaneous\";",
                "BA_ \"SendType\" BO_ 100 1;",
            ],
            ReferenceMode::Lenient,
        );
        let attribute = &network.message(100).unwrap().attribute_values["SendType"];
        assert_eq!(attribute.value, AttributeValue::Enum("1".to_string()));
    }

    #[test]
    fn enum_index_out_of_range_is_an_error() {
        let (network, diagnostics) = build(
            &[
                "BO_ 100 TestMsg: 8 ECU1",
                " SG_ Sig1 : 0|8@1+ (1,0) [0|255] \"\" ECU2",
                "BA_DEF_ SG_ \"Speed\" ENUM \"Low\",\"High\";",
                "BA_ \"Speed\" SG_ 100 Sig1 7;",
            ],
            ReferenceMode::Lenient,
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert!(network
            .signal(100, "Sig1")
            .unwrap()
            .attribute_values
            .is_empty());
    }

    #[test]
    fn attribute_value_before_definition_is_an_error() {
        let (network, diagnostics) = build(
            &["BA_ \"Speed\" 1;"],
            ReferenceMode::Lenient,
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("used before its definition"));
        assert!(network.attribute_values.is_empty());
    }

    #[test]
    fn access_bitmask_top_bit_forces_string_type() {
        let (network, _) = build(
            &["EV_ EnvVar1: 0 [0|100] \"\" 50 1 DUMMY_NODE_VECTOR8003 ECU1;"],
            ReferenceMode::Lenient,
        );
        let variable = network.environment_variable("EnvVar1").unwrap();
        assert_eq!(variable.kind, EnvironmentVariableType::String);
        assert_eq!(variable.access_type, AccessType::ReadWrite);
    }

    #[test]
    fn declared_environment_variable_type_without_override() {
        let (network, _) = build(
            &["EV_ EnvVar1: 1 [0|100] \"V\" 12.5 1 DUMMY_NODE_VECTOR2 ECU1;"],
            ReferenceMode::Lenient,
        );
        let variable = network.environment_variable("EnvVar1").unwrap();
        assert_eq!(variable.kind, EnvironmentVariableType::Float);
        assert_eq!(variable.access_type, AccessType::Write);
        assert_eq!(variable.initial_value, 12.5);
    }

    #[test]
    fn environment_variable_data_refines_type() {
        let (network, _) = build(
            &[
                "EV_ EnvBlob: 0 [0|0] \"\" 0 5 DUMMY_NODE_VECTOR0 ECU1;",
                "ENVVAR_DATA_ EnvBlob: 10;",
            ],
            ReferenceMode::Lenient,
        );
        let variable = network.environment_variable("EnvBlob").unwrap();
        assert_eq!(variable.kind, EnvironmentVariableType::Data);
        assert_eq!(variable.data_size, 10);
    }

    #[test]
    fn duplicate_message_definition_overwrites() {
        let (network, diagnostics) = build(
            &[
                "BO_ 100 First: 8 ECU1",
                " SG_ Old : 0|8@1+ (1,0) [0|255] \"\" ECU2",
                "BO_ 100 Second: 4 ECU2",
            ],
            ReferenceMode::Lenient,
        );
        assert!(diagnostics.is_empty());
        let message = network.message(100).unwrap();
        assert_eq!(message.name, "Second");
        assert_eq!(message.size, 4);
        assert_eq!(message.transmitter, "ECU2");
        assert!(message.signals.is_empty());
    }

    #[test]
    fn lenient_mode_creates_referenced_entities_with_warning() {
        let (network, diagnostics) = build(
            &["VAL_ 512 Gear 0 \"N\" 1 \"D\" ;"],
            ReferenceMode::Lenient,
        );
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics
            .iter()
            .all(|d| d.severity == Severity::Warning));
        let signal = network.signal(512, "Gear").unwrap();
        assert_eq!(signal.value_descriptions[&1], "D");
    }

    #[test]
    fn strict_mode_rejects_forward_references() {
        let (network, diagnostics) = build(
            &["VAL_ 512 Gear 0 \"N\" ;"],
            ReferenceMode::Strict,
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert!(network.messages.is_empty());
    }

    #[test]
    fn signal_without_message_is_an_error() {
        let (network, diagnostics) = build(
            &[" SG_ Orphan : 0|8@1+ (1,0) [0|255] \"\" ECU2"],
            ReferenceMode::Lenient,
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("without a preceding BO_"));
        assert!(network.messages.is_empty());
    }

    #[test]
    fn placeholder_receiver_is_dropped() {
        let (network, _) = build(
            &[
                "BO_ 100 TestMsg: 8 Vector__XXX",
                " SG_ Sig1 : 0|8@1+ (1,0) [0|255] \"\" Vector__XXX",
            ],
            ReferenceMode::Lenient,
        );
        let message = network.message(100).unwrap();
        assert_eq!(message.transmitter, "");
        assert!(message.signals["Sig1"].receivers.is_empty());
    }

    #[test]
    fn relation_attribute_is_keyed_by_relation_tuple() {
        let (network, diagnostics) = build(
            &[
                "BU_: ECU1",
                "BO_ 100 TestMsg: 8 ECU1",
                " SG_ Sig1 : 0|8@1+ (1,0) [0|255] \"\" ECU1",
                "BA_DEF_REL_ BU_SG_REL_ \"GenSigTimeout\" INT 0 65535;",
                "BA_REL_ \"GenSigTimeout\" BU_SG_REL_ ECU1 100 Sig1 250;",
            ],
            ReferenceMode::Lenient,
        );
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let relation = &network.attribute_relation_values["GenSigTimeout"];
        assert_eq!(relation.node, "ECU1");
        assert_eq!(
            relation.target,
            crate::network::RelationTarget::Signal(100, "Sig1".to_string())
        );
        assert_eq!(relation.attribute.value, AttributeValue::Int(250));
    }

    #[test]
    fn extended_multiplexing_ranges_are_literal() {
        let (network, _) = build(
            &[
                "BO_ 100 TestMsg: 8 ECU1",
                " SG_ SwitchSig M : 0|4@1+ (1,0) [0|15] \"\" ECU1",
                " SG_ SubSig m5 : 4|8@1+ (1,0) [0|255] \"\" ECU1",
                "SG_MUL_VAL_ 100 SubSig SwitchSig 5-9, 9-5;",
            ],
            ReferenceMode::Lenient,
        );
        let signal = network.signal(100, "SubSig").unwrap();
        let mux = &signal.extended_multiplexors["SwitchSig"];
        assert!(mux.value_ranges.contains(&(5, 9)));
        assert!(mux.value_ranges.contains(&(9, 5)));
    }

    #[test]
    fn signal_extended_value_type_is_independent_of_layout() {
        let (network, _) = build(
            &[
                "BO_ 100 TestMsg: 8 ECU1",
                " SG_ Sig1 : 0|32@1+ (1,0) [0|0] \"\" ECU1",
                "SIG_VALTYPE_ 100 Sig1 : 1;",
            ],
            ReferenceMode::Lenient,
        );
        let signal = network.signal(100, "Sig1").unwrap();
        assert_eq!(signal.extended_value_type, ExtendedValueType::Float);
        assert_eq!(signal.bit_size, 32);
    }
}
