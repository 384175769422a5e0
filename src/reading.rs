use serde::{Deserialize, Serialize};

/// One complete poll of the inverter, flattened into the shape the JSON
/// publisher and the Home Assistant value templates expect. Field names
/// are the wire format, renaming one breaks every subscribed dashboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Readings {
    pub product_number: String,
    pub serial_number: String,
    /// Grid-side output power, W.
    pub output_power: f32,
    /// String 1 voltage, V.
    pub input_voltage: f32,
    /// String 1 current, A.
    pub input1_current: f32,
    /// String 2 current, A.
    pub input2_current: f32,
    /// kWh since midnight.
    pub daily_energy: f64,
    pub energy_week: f64,
    pub energy_month: f64,
    pub year_energy: f64,
    /// Lifetime kWh.
    pub energy_total: f64,
    /// Heatsink temperature, °C.
    pub inverter_temperature: f32,
}
