#[macro_use]
extern crate lazy_static;
extern crate candb;

use approx::assert_relative_eq;
use candb::{
    from_dbc_file, parse_dbc_with, AccessType, AttributeValue, ByteOrder, EnvironmentVariableType,
    ExtendedValueType, MultiplexIndicator, Network, ParseFrame, ParseOptions, ReferenceMode,
    Severity, ValueType,
};

lazy_static! {
    static ref SAMPLE: Network = {
        let output = from_dbc_file("./tests/data/sample.dbc")
            .expect("failed to read sample network");
        assert!(
            output.diagnostics.is_empty(),
            "sample network should parse cleanly: {:?}",
            output.diagnostics
        );
        output.network
    };
}

#[test]
fn version_and_symbols() {
    assert_eq!(SAMPLE.version, "1.0.0");
    assert_eq!(SAMPLE.new_symbols.first().map(String::as_str), Some("NS_DESC_"));
    assert!(SAMPLE.new_symbols.contains(&"SG_MUL_VAL_".to_string()));
    // An empty BS_ statement leaves the timing zeroed.
    assert_eq!(SAMPLE.bit_timing.baudrate, 0);
}

#[test]
fn nodes_and_comments() {
    assert_eq!(SAMPLE.nodes.len(), 3);
    assert_eq!(SAMPLE.node("ECM").unwrap().comment, "Engine control module");
    assert_eq!(SAMPLE.comment, "Powertrain network");
}

#[test]
fn value_table() {
    let table = &SAMPLE.value_tables["GearTable"];
    assert_eq!(table.value_descriptions[&0], "Neutral");
    assert_eq!(table.value_descriptions[&2], "Second");
}

#[test]
fn engine_speed_definition() {
    let message = SAMPLE.message(2364539904).unwrap();
    assert_eq!(message.name, "EEC1");
    assert_eq!(message.size, 8);
    assert_eq!(message.transmitter, "ECM");
    assert_eq!(message.comment, "Electronic Engine Controller 1");

    let signal = SAMPLE.signal(2364539904, "Engine_Speed").unwrap();
    assert_eq!(signal.start_bit, 24);
    assert_eq!(signal.bit_size, 16);
    assert_eq!(signal.byte_order, ByteOrder::LittleEndian);
    assert_eq!(signal.value_type, ValueType::Unsigned);
    assert_eq!(signal.factor, 0.125);
    assert_eq!(signal.offset, 0.0);
    assert_eq!(signal.minimum, 0.0);
    assert_eq!(signal.maximum, 8031.88);
    assert_eq!(signal.unit, "rpm");
    assert_eq!(signal.extended_value_type, ExtendedValueType::Integer);
    assert!(signal.receivers.contains("Dashboard"));
    assert!(signal.receivers.contains("TCM"));
    assert_eq!(signal.comment, "Actual engine speed.");
}

#[test]
fn engine_speed_decodes_from_payload() {
    let signal = SAMPLE.signal(2364539904, "Engine_Speed").unwrap();
    assert_eq!(SAMPLE.find_signal("Engine_Speed"), Some(signal));

    let frame: [u8; 8] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
    assert_relative_eq!(signal.parse_frame(&frame[..]).unwrap(), 2728.5);
}

#[test]
fn multiplexed_transmission_message() {
    let message = SAMPLE.message(256).unwrap();
    assert_eq!(message.signals["Mode"].multiplex, MultiplexIndicator::Switch);
    assert_eq!(
        message.signals["Gear"].multiplex,
        MultiplexIndicator::Switched(0)
    );
    assert_eq!(
        message.signals["Slip"].multiplex,
        MultiplexIndicator::Switched(1)
    );
    assert_eq!(
        message.signals["Temperature"].value_type,
        ValueType::Signed
    );
    // The no-node sentinel never survives into a receiver set.
    assert!(message.signals["Temperature"].receivers.is_empty());

    assert!(message.transmitters.contains("TCM"));
    assert!(message.transmitters.contains("ECM"));

    let group = &message.signal_groups["ShiftState"];
    assert_eq!(group.repetitions, 1);
    assert!(group.signals.contains("Mode"));
    assert!(group.signals.contains("Gear"));
}

#[test]
fn extended_multiplexing_ranges() {
    let slip = SAMPLE.signal(256, "Slip").unwrap();
    let ranges = &slip.extended_multiplexors["Mode"].value_ranges;
    assert!(ranges.contains(&(1, 1)));
    assert!(ranges.contains(&(3, 5)));
    assert_eq!(ranges.len(), 2);
}

#[test]
fn signal_value_descriptions() {
    let gear = SAMPLE.signal(256, "Gear").unwrap();
    assert_eq!(gear.value_descriptions[&0], "Neutral");
    assert_eq!(gear.value_descriptions[&2], "Second");
}

#[test]
fn environment_variables() {
    let ambient = SAMPLE.environment_variable("AmbientTemp").unwrap();
    assert_eq!(ambient.kind, EnvironmentVariableType::Integer);
    assert_eq!(ambient.access_type, AccessType::Unrestricted);
    assert_eq!(ambient.minimum, -40.0);
    assert_eq!(ambient.maximum, 215.0);
    assert_eq!(ambient.initial_value, 20.0);
    assert_eq!(ambient.comment, "Ambient air temperature");
    assert_eq!(ambient.value_descriptions[&0], "Invalid");
    assert!(ambient.access_nodes.contains("Dashboard"));

    // Top bit of the access bitmask forces the string type.
    let diag_text = SAMPLE.environment_variable("DiagText").unwrap();
    assert_eq!(diag_text.kind, EnvironmentVariableType::String);
    assert_eq!(diag_text.access_type, AccessType::ReadWrite);

    let blob = SAMPLE.environment_variable("CalibBlob").unwrap();
    assert_eq!(blob.kind, EnvironmentVariableType::Data);
    assert_eq!(blob.data_size, 16);
}

#[test]
fn signal_types_are_descriptive_only() {
    let rpm_type = &SAMPLE.signal_types["RpmType"];
    assert_eq!(rpm_type.size, 16);
    assert_eq!(rpm_type.factor, 0.125);
    assert_eq!(rpm_type.value_table, "GearTable");
}

#[test]
fn attributes() {
    assert_eq!(
        SAMPLE.attribute_values["BusType"].value,
        AttributeValue::String("CAN".to_string())
    );
    assert_eq!(
        SAMPLE.attribute_defaults["GenMsgCycleTime"].value,
        AttributeValue::Int(100)
    );
    assert_eq!(
        SAMPLE.message(256).unwrap().attribute_values["GenMsgCycleTime"].value,
        AttributeValue::Int(50)
    );

    let engine_speed = SAMPLE.signal(2364539904, "Engine_Speed").unwrap();
    assert_eq!(
        engine_speed.attribute_values["SPN"].value,
        AttributeValue::Int(190)
    );
    // Enum attributes resolve to the label on signals only.
    assert_eq!(
        engine_speed.attribute_values["SigClass"].value,
        AttributeValue::Enum("Medium".to_string())
    );
    assert_eq!(
        SAMPLE.node("ECM").unwrap().attribute_values["NodeLayer"].value,
        AttributeValue::Enum("0".to_string())
    );

    assert_eq!(
        SAMPLE.environment_variable("AmbientTemp").unwrap().attribute_values["EnvScale"].value,
        AttributeValue::Float(2.5)
    );

    let relation = &SAMPLE.attribute_relation_values["GenSigTimeoutTime"];
    assert_eq!(relation.node, "Dashboard");
    assert_eq!(relation.attribute.value, AttributeValue::Int(250));
}

#[test]
fn missing_file_is_an_io_error() {
    let result = from_dbc_file("./tests/data/sample.dbc.fail");
    assert_eq!(
        result.map(|_| ()).map_err(|e| e.kind()),
        Err(std::io::ErrorKind::NotFound)
    );
}

#[test]
fn strict_mode_reports_forward_references_as_errors() {
    let options = ParseOptions {
        references: ReferenceMode::Strict,
        ..Default::default()
    };
    let mut diagnostics = Vec::new();
    let network = parse_dbc_with(
        "VAL_ 512 Gear 0 \"N\" ;\n",
        &options,
        &mut diagnostics,
    )
    .unwrap();
    assert!(network.messages.is_empty());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);
}
