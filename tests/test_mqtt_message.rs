mod common;
use common::*;

use aurora_bridge::prelude::*;

fn inbound(topic: &str) -> mqtt::Message {
    mqtt::Message {
        topic: topic.to_string(),
        retain: false,
        payload: "".to_string(),
    }
}

#[test]
fn cmd_topics_map_to_commands() {
    common_setup();

    assert_eq!(inbound("cmd/poll").to_command().unwrap(), Command::Poll);
    assert_eq!(
        inbound("cmd/discovery").to_command().unwrap(),
        Command::Discovery
    );
}

#[test]
fn unknown_cmd_topics_are_rejected() {
    common_setup();

    assert_eq!(
        inbound("cmd/restart").to_command().unwrap_err().to_string(),
        "unhandled command topic: cmd/restart"
    );
    assert_eq!(
        inbound("status").to_command().unwrap_err().to_string(),
        "unhandled command topic: status"
    );
}

#[test]
fn result_topics_follow_the_command_name() {
    common_setup();

    assert_eq!(Command::Poll.to_result_topic(), "result/poll");
    assert_eq!(Command::Discovery.to_result_topic(), "result/discovery");
}

#[test]
fn readings_publish_under_the_device_address() {
    common_setup();

    let message = mqtt::Message::for_readings(&Factory::readings(), "solar", 2).unwrap();

    assert_eq!(message.topic, "solar/2");
    assert!(!message.retain);

    let parsed: Readings = serde_json::from_str(&message.payload).unwrap();
    assert_eq!(parsed, Factory::readings());

    let json: serde_json::Value = serde_json::from_str(&message.payload).unwrap();
    assert_eq!(json["product_number"], "-3G96-");
    assert_eq!(json["serial_number"], "123456");
    assert_eq!(json["output_power"], 1500.25);
    assert_eq!(json["daily_energy"], 12.345);
}
