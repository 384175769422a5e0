mod common;
use common::*;

use std::io::Write;
use std::time::Duration;

use aurora_bridge::prelude::*;

use tempfile::NamedTempFile;

fn config_from(yaml: &str) -> Result<Config> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{}", yaml)?;
    Config::new(file.path().to_string_lossy().to_string())
}

fn rejection(yaml: &str) -> String {
    config_from(yaml).unwrap_err().to_string()
}

#[test]
fn parses_a_full_file() -> Result<()> {
    common_setup();

    let config = config_from(
        r#"
loglevel: debug
inverter:
  host: 10.0.0.4
  port: 8000
  address: 3
  timeout: 2
  tries: 5
mqtt:
  enabled: true
  host: broker.local
  port: 11883
  username: user
  password: secret
  namespace: pv
  homeassistant:
    enabled: false
    prefix: ha
daylight:
  latitude: 46.644479
  longitude: 6.404010
  margin_minutes: 45
poller:
  interval: 10
  night_interval: 600
  backoff: 120
"#,
    )?;

    assert_eq!(config.loglevel, "debug");

    assert_eq!(config.inverter.host(), &Some("10.0.0.4".to_string()));
    assert_eq!(config.inverter.port(), 8000);
    assert_eq!(config.inverter.serial_port(), &None);
    assert_eq!(config.inverter.address(), 3);
    assert_eq!(config.inverter.timeout(), Duration::from_secs(2));
    assert_eq!(config.inverter.tries(), 5);

    assert!(config.mqtt.enabled());
    assert_eq!(config.mqtt.host(), "broker.local");
    assert_eq!(config.mqtt.port(), 11883);
    assert_eq!(config.mqtt.username(), &Some("user".to_string()));
    assert_eq!(config.mqtt.password(), &Some("secret".to_string()));
    assert_eq!(config.mqtt.namespace(), "pv");
    assert!(!config.mqtt.homeassistant().enabled());
    assert_eq!(config.mqtt.homeassistant().prefix(), "ha");

    assert_eq!(config.daylight.latitude(), 46.644479);
    assert_eq!(config.daylight.longitude(), 6.404010);
    assert_eq!(config.daylight.margin_minutes(), 45);

    assert_eq!(config.poller.interval(), 10);
    assert_eq!(config.poller.night_interval(), 600);
    assert_eq!(config.poller.backoff(), 120);

    Ok(())
}

#[test]
fn fills_in_defaults() -> Result<()> {
    common_setup();

    let config = config_from(
        r#"
inverter:
  serial_port: /dev/ttyUSB0
  address: 2
mqtt:
  enabled: false
daylight:
  latitude: 0.0
  longitude: 0.0
"#,
    )?;

    assert_eq!(config.loglevel, "info");

    assert_eq!(config.inverter.baud_rate(), 19200);
    assert_eq!(config.inverter.timeout(), Duration::from_secs(5));
    assert_eq!(config.inverter.tries(), 3);

    assert!(!config.mqtt.enabled());
    assert_eq!(config.mqtt.port(), 1883);
    assert_eq!(config.mqtt.namespace(), "solar");
    assert!(config.mqtt.homeassistant().enabled());
    assert_eq!(config.mqtt.homeassistant().prefix(), "homeassistant");

    assert_eq!(config.daylight.margin_minutes(), 30);

    assert_eq!(config.poller.interval(), 2);
    assert_eq!(config.poller.night_interval(), 300);
    assert_eq!(config.poller.backoff(), 60);

    Ok(())
}

#[test]
fn builds_a_transport_for_either_section_shape() -> Result<()> {
    common_setup();

    let tcp = config_from(
        r#"
inverter:
  host: localhost
  address: 2
mqtt:
  enabled: false
daylight:
  latitude: 0.0
  longitude: 0.0
"#,
    )?;
    assert!(tcp.inverter.transport().is_ok());

    let serial = config_from(
        r#"
inverter:
  serial_port: /dev/ttyUSB0
  address: 2
mqtt:
  enabled: false
daylight:
  latitude: 0.0
  longitude: 0.0
"#,
    )?;
    assert!(serial.inverter.transport().is_ok());

    let neither = config::Inverter {
        host: None,
        port: 8899,
        serial_port: None,
        baud_rate: 19200,
        address: 2,
        timeout: 5,
        tries: 3,
    };
    assert_eq!(
        neither.transport().err().unwrap().to_string(),
        "inverter needs exactly one of host or serial_port"
    );

    Ok(())
}

#[test]
fn rejects_invalid_sections() {
    common_setup();

    assert_eq!(
        rejection(
            r#"
inverter:
  host: localhost
  serial_port: /dev/ttyUSB0
  address: 2
mqtt:
  enabled: false
daylight:
  latitude: 0.0
  longitude: 0.0
"#
        ),
        "inverter.host and inverter.serial_port are mutually exclusive"
    );

    assert_eq!(
        rejection(
            r#"
inverter:
  address: 2
mqtt:
  enabled: false
daylight:
  latitude: 0.0
  longitude: 0.0
"#
        ),
        "one of inverter.host or inverter.serial_port is required"
    );

    assert_eq!(
        rejection(
            r#"
inverter:
  host: ""
  address: 2
mqtt:
  enabled: false
daylight:
  latitude: 0.0
  longitude: 0.0
"#
        ),
        "inverter.host cannot be empty"
    );

    assert_eq!(
        rejection(
            r#"
inverter:
  host: localhost
  address: 0
mqtt:
  enabled: false
daylight:
  latitude: 0.0
  longitude: 0.0
"#
        ),
        "inverter.address must be between 1 and 255"
    );

    assert_eq!(
        rejection(
            r#"
inverter:
  host: localhost
  address: 2
mqtt:
  enabled: true
daylight:
  latitude: 0.0
  longitude: 0.0
"#
        ),
        "mqtt.host cannot be empty"
    );

    assert_eq!(
        rejection(
            r#"
inverter:
  host: localhost
  address: 2
mqtt:
  enabled: false
daylight:
  latitude: 91.0
  longitude: 0.0
"#
        ),
        "daylight.latitude must be between -90 and 90"
    );

    assert_eq!(
        rejection(
            r#"
inverter:
  host: localhost
  address: 2
mqtt:
  enabled: false
daylight:
  latitude: 0.0
  longitude: 0.0
poller:
  interval: 0
"#
        ),
        "poller.interval must be nonzero"
    );
}

#[test]
fn reports_unreadable_files() {
    common_setup();

    let err = Config::new("/nonexistent/aurora.yaml".to_string())
        .unwrap_err()
        .to_string();
    assert!(err.starts_with("error reading /nonexistent/aurora.yaml:"));
}

#[test]
fn reports_unparsable_files() {
    common_setup();

    assert!(config_from("inverter: [not, a, mapping]").is_err());
}
