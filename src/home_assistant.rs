use crate::prelude::*;

use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct Availability {
    topic: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Device {
    identifiers: [String; 1],
    manufacturer: String,
    model: String,
    name: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Entity {
    unique_id: String,
    name: String,
    state_topic: String,
    value_template: String,
    unit_of_measurement: String,
    device_class: String,
    state_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    availability: Availability,
    device: Device,
}

struct Sensor {
    field: &'static str,
    name: &'static str,
    unit: &'static str,
    device_class: &'static str,
    state_class: &'static str,
    icon: Option<&'static str>,
}

/// Field names match the readings JSON; the value_template picks them out
/// of the combined message.
const SENSORS: [Sensor; 7] = [
    Sensor {
        field: "output_power",
        name: "Output Power",
        unit: "W",
        device_class: "power",
        state_class: "measurement",
        icon: Some("mdi:solar-power"),
    },
    Sensor {
        field: "input_voltage",
        name: "Input 1 Voltage",
        unit: "V",
        device_class: "voltage",
        state_class: "measurement",
        icon: None,
    },
    Sensor {
        field: "input1_current",
        name: "Input 1 Current",
        unit: "A",
        device_class: "current",
        state_class: "measurement",
        icon: None,
    },
    Sensor {
        field: "input2_current",
        name: "Input 2 Current",
        unit: "A",
        device_class: "current",
        state_class: "measurement",
        icon: None,
    },
    Sensor {
        field: "inverter_temperature",
        name: "Inverter Temperature",
        unit: "°C",
        device_class: "temperature",
        state_class: "measurement",
        icon: None,
    },
    Sensor {
        field: "daily_energy",
        name: "Daily Energy",
        unit: "kWh",
        device_class: "energy",
        state_class: "total_increasing",
        icon: None,
    },
    Sensor {
        field: "energy_total",
        name: "Total Energy",
        unit: "kWh",
        device_class: "energy",
        state_class: "total_increasing",
        icon: None,
    },
];

/// Builds the retained discovery configs for one inverter. Device identity
/// comes off the device itself, so this can only run after a successful
/// poll.
pub struct Config {
    mqtt: config::Mqtt,
    address: u8,
    serial: String,
    model: String,
}

impl Config {
    pub fn new(mqtt: &config::Mqtt, address: u8, serial: &str, model: &str) -> Self {
        Self {
            mqtt: mqtt.clone(),
            address,
            serial: serial.to_string(),
            model: model.to_string(),
        }
    }

    pub fn all(&self) -> Result<Vec<mqtt::Message>> {
        SENSORS.iter().map(|sensor| self.sensor(sensor)).collect()
    }

    fn sensor(&self, sensor: &Sensor) -> Result<mqtt::Message> {
        let unique_id = format!("aurora_{}_{}", self.serial, sensor.field);

        // the config topic leaf is the unique_id, not the bare field
        let topic = format!(
            "{}/sensor/{}/{}/config",
            self.mqtt.homeassistant().prefix(),
            self.serial,
            unique_id
        );

        let config = Entity {
            unique_id,
            name: sensor.name.to_string(),
            state_topic: format!("{}/{}", self.mqtt.namespace(), self.address),
            value_template: format!("{{{{ value_json.{} }}}}", sensor.field),
            unit_of_measurement: sensor.unit.to_string(),
            device_class: sensor.device_class.to_string(),
            state_class: sensor.state_class.to_string(),
            icon: sensor.icon.map(str::to_string),
            availability: self.availability(),
            device: self.device(),
        };

        Ok(mqtt::Message {
            topic,
            retain: true,
            payload: serde_json::to_string(&config)?,
        })
    }

    fn availability(&self) -> Availability {
        Availability {
            topic: format!("{}/LWT", self.mqtt.namespace()),
        }
    }

    fn device(&self) -> Device {
        Device {
            identifiers: [self.serial.clone()],
            manufacturer: "Power-One".to_string(),
            model: self.model.clone(),
            name: format!("Aurora {}", self.serial),
        }
    }
}
