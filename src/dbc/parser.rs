//! Nom-based productions for DBC statements.
//!
//! The token-level parsers at the top (quoted strings, identifiers, numeric
//! literals, the `low-high` multiplexor range, the `DUMMY_NODE_VECTOR` access
//! bitmask) form the lexer of the grammar; the `named!` productions below
//! them each recognize one statement and build its [`Entry`] payload. Every
//! production consumes its own terminating line ending, so the statement
//! loop in [`crate::engine`] can resume at the next line after any failure.
//!
//! Numeric conversion goes through `map_res!`: a literal that does not fit
//! its target type fails the production instead of aborting the parse.

use super::*;
use crate::network::{AttributeObjectType, AttributeValueType, BitTiming, ByteOrder,
                     MultiplexIndicator, RelationTarget, ValueType};
use nom::{digit, double, hex_digit, line_ending, space, space0};
use std::str::FromStr;

named! {
    quoted_str<&str, String>,
    alt!(
        tag!("\"\"") => { |_| String::new() } |
        map!(
            delimited!(
                tag!("\""),
                escaped_transform!(
                    none_of!("\\\""),
                    '\\',
                    alt!(
                        tag!("\\") => { |_| "\\" }
                      | tag!("\"") => { |_| "\"" }
                    )),
                tag!("\"")),
            |data| data)
    )
}

named!(c_identifier<&str, &str>,
    take_while1!(|c: char| c.is_ascii_alphanumeric() || c == '_')
);

named!(identifier<&str, String>, map!(c_identifier, String::from));

named!(unsigned_u32<&str, u32>, map_res!(digit, FromStr::from_str));

named!(unsigned_u64<&str, u64>, map_res!(digit, FromStr::from_str));

named!(integer_i64<&str, i64>,
    map_res!(
        recognize!(pair!(opt!(one_of!("+-")), digit)),
        FromStr::from_str)
);

// Number token of a `BA_` / `BA_DEF_DEF_` value: integral text stays an
// integer, anything with a fraction or exponent becomes a double.
named!(number_value<&str, RawValue>,
    map_res!(
        recognize!(tuple!(
            opt!(one_of!("+-")),
            digit,
            opt!(preceded!(char!('.'), opt!(digit))),
            opt!(tuple!(one_of!("eE"), opt!(one_of!("+-")), digit))
        )),
        |text: &str| -> Result<RawValue, std::num::ParseFloatError> {
            if text.contains('.') || text.contains('e') || text.contains('E') {
                text.parse::<f64>().map(RawValue::Double)
            } else {
                match text.parse::<i64>() {
                    Ok(value) => Ok(RawValue::Integer(value)),
                    Err(_) => text.parse::<f64>().map(RawValue::Double),
                }
            }
        })
);

named!(raw_value<&str, RawValue>, alt!(
    quoted_str => { |text| RawValue::Text(text) } |
    number_value
));

named!(byte_order_token<&str, ByteOrder>, alt!(
    char!('0') => { |_| ByteOrder::BigEndian } |
    char!('1') => { |_| ByteOrder::LittleEndian }
));

named!(sign_token<&str, ValueType>, alt!(
    char!('+') => { |_| ValueType::Unsigned } |
    char!('-') => { |_| ValueType::Signed }
));

// `M` marks the multiplexor switch, `m<N>` a signal multiplexed under
// switch value N. Absent means a plain signal.
named!(multiplex_token<&str, MultiplexIndicator>,
    map!(
        opt!(alt!(
            do_parse!(
                char!('m') >>
                value: unsigned_u64 >>
                (MultiplexIndicator::Switched(value))
            ) |
            char!('M') => { |_| MultiplexIndicator::Switch }
        )),
        |mux| mux.unwrap_or(MultiplexIndicator::None))
);

// `<low>-<high>` multiplexor value range literal. No reordering: a reversed
// literal stays reversed.
named!(multiplex_range<&str, (u64, u64)>,
    do_parse!(
        low: unsigned_u64 >>
        char!('-') >>
        high: unsigned_u64 >>
        ((low, high))
    )
);

// `DUMMY_NODE_VECTOR<hex>` access keyword of an `EV_` statement, lexed as
// its raw bitmask. The handler splits off the string-type override bit.
named!(access_token<&str, u32>,
    preceded!(
        tag!("DUMMY_NODE_VECTOR"),
        map_res!(hex_digit, |s: &str| u32::from_str_radix(s, 16)))
);

named!(list_comma<&str, char>, delimited!(space0, char!(','), space0));

named!(value_description<&str, (i64, String)>,
    do_parse!(
        space >>
        code: integer_i64 >>
        space >>
        label: quoted_str >>
        ((code, label))
    )
);

named!(value_descriptions_list<&str, Vec<(i64, String)>>, many0!(value_description));

named!(pub entry<&str, Entry>, alt!(
    version                    => { |r| Entry::Version(r) } |
    new_symbols                => { |r| Entry::NewSymbols(r) } |
    bit_timing                 => { |r| Entry::BitTiming(r) } |
    node_list                  => { |r| Entry::Nodes(r) } |
    value_table                => { |r| Entry::ValueTable(r) } |
    message_transmitters       => { |r| Entry::MessageTransmitters(r) } |
    message_definition         => { |r| Entry::MessageDefinition(r) } |
    signal_extended_value_type => { |r| Entry::SignalExtendedValueType(r) } |
    signal_group               => { |r| Entry::SignalGroup(r) } |
    extended_multiplexing      => { |r| Entry::ExtendedMultiplexing(r) } |
    signal_definition          => { |r| Entry::SignalDefinition(r) } |
    environment_variable_data  => { |r| Entry::EnvironmentVariableData(r) } |
    environment_variable       => { |r| Entry::EnvironmentVariable(r) } |
    signal_type                => { |r| Entry::SignalType(r) } |
    signal_value_descriptions  => { |r| Entry::SignalValueDescriptions(r) } |
    env_value_descriptions     => { |r| Entry::EnvVarValueDescriptions(r) } |
    node_comment               => { |r| Entry::Comment(r) } |
    message_comment            => { |r| Entry::Comment(r) } |
    signal_comment             => { |r| Entry::Comment(r) } |
    env_comment                => { |r| Entry::Comment(r) } |
    network_comment            => { |r| Entry::Comment(r) } |
    attribute_rel_default      => { |r| Entry::AttributeDefault(r) } |
    attribute_default          => { |r| Entry::AttributeDefault(r) } |
    attribute_rel_definition   => { |r| Entry::AttributeDefinition(r) } |
    attribute_definition       => { |r| Entry::AttributeDefinition(r) } |
    attribute_relation_value   => { |r| Entry::AttributeRelationValue(r) } |
    attribute_value            => { |r| Entry::AttributeValue(r) } |
    unknown                    => { |r| Entry::Unknown(r) }
));

named!(pub unknown<&str, String>,
    do_parse!(
        content: take_while!(|c: char| c != '\r' && c != '\n') >>
        line_ending >>
        (content.to_string())
    )
);

named!(pub version<&str, Version>,
    do_parse!(
        tag!("VERSION") >>
        space >>
        data: quoted_str >>
        space0 >>
        line_ending >>
        (Version(data))
    )
);

// `NS_ :` is followed by one indented symbol per line; the block ends at
// the first line that starts in column one.
named!(pub new_symbols<&str, NewSymbols>,
    do_parse!(
        tag!("NS_") >>
        space0 >>
        char!(':') >>
        space0 >>
        line_ending >>
        symbols: many0!(do_parse!(
            space >>
            symbol: identifier >>
            space0 >>
            line_ending >>
            (symbol)
        )) >>
        (NewSymbols(symbols))
    )
);

named!(pub bit_timing<&str, Option<BitTiming>>,
    do_parse!(
        tag!("BS_") >>
        space0 >>
        char!(':') >>
        space0 >>
        timing: opt!(do_parse!(
            baudrate: unsigned_u32 >>
            space0 >>
            char!(':') >>
            space0 >>
            btr1: unsigned_u32 >>
            space0 >>
            char!(',') >>
            space0 >>
            btr2: unsigned_u32 >>
            (BitTiming { baudrate, btr1, btr2 })
        )) >>
        space0 >>
        line_ending >>
        (timing)
    )
);

named!(pub node_list<&str, NodeList>,
    do_parse!(
        tag!("BU_") >>
        space0 >>
        char!(':') >>
        nodes: many0!(preceded!(space, identifier)) >>
        space0 >>
        line_ending >>
        (NodeList(nodes))
    )
);

named!(pub value_table<&str, ValueTableDefinition>,
    do_parse!(
        tag!("VAL_TABLE_") >>
        space >>
        name: identifier >>
        entries: value_descriptions_list >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (ValueTableDefinition { name, entries })
    )
);

named!(pub message_definition<&str, MessageDefinition>,
    do_parse!(
        tag!("BO_") >>
        space >>
        id: unsigned_u32 >>
        space >>
        name: identifier >>
        space0 >>
        char!(':') >>
        space0 >>
        size: unsigned_u32 >>
        space >>
        transmitter: identifier >>
        space0 >>
        line_ending >>
        (MessageDefinition { id, name, size, transmitter })
    )
);

named!(pub signal_definition<&str, SignalDefinition>,
    do_parse!(
        space0 >>
        tag!("SG_") >>
        space >>
        name: identifier >>
        space0 >>
        multiplex: multiplex_token >>
        space0 >>
        char!(':') >>
        space0 >>
        start_bit: unsigned_u32 >>
        char!('|') >>
        bit_size: unsigned_u32 >>
        char!('@') >>
        byte_order: byte_order_token >>
        value_type: sign_token >>
        space >>
        char!('(') >>
        space0 >>
        factor: double >>
        space0 >>
        char!(',') >>
        space0 >>
        offset: double >>
        space0 >>
        char!(')') >>
        space >>
        char!('[') >>
        space0 >>
        minimum: double >>
        space0 >>
        char!('|') >>
        space0 >>
        maximum: double >>
        space0 >>
        char!(']') >>
        space >>
        unit: quoted_str >>
        space >>
        receivers: separated_nonempty_list!(list_comma, identifier) >>
        space0 >>
        line_ending >>
        (SignalDefinition {
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
        })
    )
);

named!(pub message_transmitters<&str, MessageTransmitters>,
    do_parse!(
        tag!("BO_TX_BU_") >>
        space >>
        id: unsigned_u32 >>
        space0 >>
        char!(':') >>
        space0 >>
        transmitters: separated_list!(list_comma, identifier) >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (MessageTransmitters { id, transmitters })
    )
);

named!(pub signal_value_descriptions<&str, SignalValueDescriptions>,
    do_parse!(
        tag!("VAL_") >>
        space >>
        id: unsigned_u32 >>
        space >>
        signal: identifier >>
        entries: value_descriptions_list >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (SignalValueDescriptions { id, signal, entries })
    )
);

named!(pub env_value_descriptions<&str, EnvVarValueDescriptions>,
    do_parse!(
        tag!("VAL_") >>
        space >>
        name: identifier >>
        entries: value_descriptions_list >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (EnvVarValueDescriptions { name, entries })
    )
);

named!(pub environment_variable<&str, EnvironmentVariableDefinition>,
    do_parse!(
        tag!("EV_") >>
        space >>
        name: identifier >>
        space0 >>
        char!(':') >>
        space0 >>
        raw_type: unsigned_u32 >>
        space >>
        char!('[') >>
        space0 >>
        minimum: double >>
        space0 >>
        char!('|') >>
        space0 >>
        maximum: double >>
        space0 >>
        char!(']') >>
        space >>
        unit: quoted_str >>
        space >>
        initial_value: double >>
        space >>
        id: unsigned_u64 >>
        space >>
        raw_access: access_token >>
        space >>
        access_nodes: separated_nonempty_list!(list_comma, identifier) >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (EnvironmentVariableDefinition {
            name,
            raw_type,
            minimum,
            maximum,
            unit,
            initial_value,
            id,
            raw_access,
            access_nodes,
        })
    )
);

named!(pub environment_variable_data<&str, EnvironmentVariableData>,
    do_parse!(
        tag!("ENVVAR_DATA_") >>
        space >>
        name: identifier >>
        space0 >>
        char!(':') >>
        space0 >>
        size: unsigned_u32 >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (EnvironmentVariableData { name, size })
    )
);

named!(pub signal_type<&str, SignalTypeDefinition>,
    do_parse!(
        tag!("SGTYPE_") >>
        space >>
        name: identifier >>
        space0 >>
        char!(':') >>
        space0 >>
        size: unsigned_u32 >>
        char!('@') >>
        byte_order: byte_order_token >>
        value_type: sign_token >>
        space >>
        char!('(') >>
        space0 >>
        factor: double >>
        space0 >>
        char!(',') >>
        space0 >>
        offset: double >>
        space0 >>
        char!(')') >>
        space >>
        char!('[') >>
        space0 >>
        minimum: double >>
        space0 >>
        char!('|') >>
        space0 >>
        maximum: double >>
        space0 >>
        char!(']') >>
        space >>
        unit: quoted_str >>
        space >>
        default_value: double >>
        space0 >>
        char!(',') >>
        space0 >>
        value_table: identifier >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (SignalTypeDefinition {
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
        })
    )
);

named!(pub signal_group<&str, SignalGroupDefinition>,
    do_parse!(
        tag!("SIG_GROUP_") >>
        space >>
        id: unsigned_u32 >>
        space >>
        name: identifier >>
        space >>
        repetitions: unsigned_u32 >>
        space0 >>
        char!(':') >>
        signals: many0!(preceded!(space, identifier)) >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (SignalGroupDefinition { id, name, repetitions, signals })
    )
);

named!(pub network_comment<&str, Comment>,
    do_parse!(
        tag!("CM_") >>
        space >>
        text: quoted_str >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (Comment { target: CommentTarget::Network, text })
    )
);

named!(pub node_comment<&str, Comment>,
    do_parse!(
        tag!("CM_") >>
        space >>
        tag!("BU_") >>
        space >>
        node: identifier >>
        space >>
        text: quoted_str >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (Comment { target: CommentTarget::Node(node), text })
    )
);

named!(pub message_comment<&str, Comment>,
    do_parse!(
        tag!("CM_") >>
        space >>
        tag!("BO_") >>
        space >>
        id: unsigned_u32 >>
        space >>
        text: quoted_str >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (Comment { target: CommentTarget::Message(id), text })
    )
);

named!(pub signal_comment<&str, Comment>,
    do_parse!(
        tag!("CM_") >>
        space >>
        tag!("SG_") >>
        space >>
        id: unsigned_u32 >>
        space >>
        signal: identifier >>
        space >>
        text: quoted_str >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (Comment { target: CommentTarget::Signal(id, signal), text })
    )
);

named!(pub env_comment<&str, Comment>,
    do_parse!(
        tag!("CM_") >>
        space >>
        tag!("EV_") >>
        space >>
        name: identifier >>
        space >>
        text: quoted_str >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (Comment { target: CommentTarget::EnvironmentVariable(name), text })
    )
);

named!(attribute_object_token<&str, AttributeObjectType>, alt!(
    tag!("BU_") => { |_| AttributeObjectType::Node } |
    tag!("BO_") => { |_| AttributeObjectType::Message } |
    tag!("SG_") => { |_| AttributeObjectType::Signal } |
    tag!("EV_") => { |_| AttributeObjectType::EnvironmentVariable }
));

named!(attribute_relation_token<&str, AttributeObjectType>, alt!(
    tag!("BU_EV_REL_") => { |_| AttributeObjectType::NodeEnvironmentVariableRelation } |
    tag!("BU_BO_REL_") => { |_| AttributeObjectType::NodeTxMessageRelation } |
    tag!("BU_SG_REL_") => { |_| AttributeObjectType::NodeRxSignalRelation }
));

named!(attribute_value_type_token<&str, AttributeValueType>, alt!(
    do_parse!(
        tag!("INT") >>
        space >>
        minimum: integer_i64 >>
        space >>
        maximum: integer_i64 >>
        (AttributeValueType::Int { minimum, maximum })
    ) |
    do_parse!(
        tag!("HEX") >>
        space >>
        minimum: integer_i64 >>
        space >>
        maximum: integer_i64 >>
        (AttributeValueType::Hex { minimum, maximum })
    ) |
    do_parse!(
        tag!("FLOAT") >>
        space >>
        minimum: double >>
        space >>
        maximum: double >>
        (AttributeValueType::Float { minimum, maximum })
    ) |
    tag!("STRING") => { |_| AttributeValueType::String } |
    do_parse!(
        tag!("ENUM") >>
        space >>
        values: separated_list!(list_comma, quoted_str) >>
        (AttributeValueType::Enum(values))
    )
));

named!(pub attribute_definition<&str, AttributeDefinitionEntry>,
    do_parse!(
        tag!("BA_DEF_") >>
        space >>
        object_type: map!(
            opt!(terminated!(attribute_object_token, space)),
            |t| t.unwrap_or(AttributeObjectType::Network)) >>
        name: quoted_str >>
        space >>
        value_type: attribute_value_type_token >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (AttributeDefinitionEntry { object_type, name, value_type })
    )
);

named!(pub attribute_rel_definition<&str, AttributeDefinitionEntry>,
    do_parse!(
        tag!("BA_DEF_REL_") >>
        space >>
        object_type: attribute_relation_token >>
        space >>
        name: quoted_str >>
        space >>
        value_type: attribute_value_type_token >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (AttributeDefinitionEntry { object_type, name, value_type })
    )
);

named!(pub attribute_default<&str, AttributeDefault>,
    do_parse!(
        tag!("BA_DEF_DEF_") >>
        space >>
        name: quoted_str >>
        space >>
        value: raw_value >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (AttributeDefault { name, value })
    )
);

named!(pub attribute_rel_default<&str, AttributeDefault>,
    do_parse!(
        tag!("BA_DEF_DEF_REL_") >>
        space >>
        name: quoted_str >>
        space >>
        value: raw_value >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (AttributeDefault { name, value })
    )
);

named!(attribute_target_token<&str, AttributeTarget>, alt!(
    do_parse!(
        tag!("BU_") >>
        space >>
        node: identifier >>
        (AttributeTarget::Node(node))
    ) |
    do_parse!(
        tag!("BO_") >>
        space >>
        id: unsigned_u32 >>
        (AttributeTarget::Message(id))
    ) |
    do_parse!(
        tag!("SG_") >>
        space >>
        id: unsigned_u32 >>
        space >>
        signal: identifier >>
        (AttributeTarget::Signal(id, signal))
    ) |
    do_parse!(
        tag!("EV_") >>
        space >>
        name: identifier >>
        (AttributeTarget::EnvironmentVariable(name))
    )
));

named!(pub attribute_value<&str, AttributeValueEntry>,
    do_parse!(
        tag!("BA_") >>
        space >>
        name: quoted_str >>
        space >>
        target: map!(
            opt!(terminated!(attribute_target_token, space)),
            |t| t.unwrap_or(AttributeTarget::Network)) >>
        value: raw_value >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (AttributeValueEntry { name, target, value })
    )
);

named!(relation_key<&str, (String, RelationTarget)>, alt!(
    do_parse!(
        tag!("BU_EV_REL_") >>
        space >>
        node: identifier >>
        space >>
        variable: identifier >>
        ((node, RelationTarget::EnvironmentVariable(variable)))
    ) |
    do_parse!(
        tag!("BU_BO_REL_") >>
        space >>
        node: identifier >>
        space >>
        id: unsigned_u32 >>
        ((node, RelationTarget::Message(id)))
    ) |
    do_parse!(
        tag!("BU_SG_REL_") >>
        space >>
        node: identifier >>
        space >>
        id: unsigned_u32 >>
        space >>
        signal: identifier >>
        ((node, RelationTarget::Signal(id, signal)))
    )
));

named!(pub attribute_relation_value<&str, AttributeRelationEntry>,
    do_parse!(
        tag!("BA_REL_") >>
        space >>
        name: quoted_str >>
        space >>
        relation: relation_key >>
        space >>
        value: raw_value >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (AttributeRelationEntry {
            name,
            node: relation.0,
            target: relation.1,
            value,
        })
    )
);

named!(pub signal_extended_value_type<&str, SignalExtendedValueTypeEntry>,
    do_parse!(
        tag!("SIG_VALTYPE_") >>
        space >>
        id: unsigned_u32 >>
        space >>
        signal: identifier >>
        space0 >>
        opt!(char!(':')) >>
        space0 >>
        raw_type: unsigned_u32 >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (SignalExtendedValueTypeEntry { id, signal, raw_type })
    )
);

named!(pub extended_multiplexing<&str, ExtendedMultiplexingEntry>,
    do_parse!(
        tag!("SG_MUL_VAL_") >>
        space >>
        id: unsigned_u32 >>
        space >>
        signal: identifier >>
        space >>
        switch: identifier >>
        space >>
        ranges: separated_nonempty_list!(list_comma, multiplex_range) >>
        space0 >>
        char!(';') >>
        space0 >>
        line_ending >>
        (ExtendedMultiplexingEntry { id, signal, switch, ranges })
    )
);
