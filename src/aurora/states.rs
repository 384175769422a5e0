//! Lookup tables for the device's status code spaces. All lookups are total
//! over the byte range; codes without a table entry come back as "N/A".
//! These descriptions feed diagnostics and error messages only, control
//! flow never depends on them beyond the is-zero/is-known branch in
//! [`crate::aurora::frame::Response::check_transmission_state`].

use crate::aurora::frame::StateType;

/// Fault description for a non-zero transmission state, or `None` when the
/// code is not in the table (the "unknown transmission state" condition).
pub fn transmission_fault(code: u8) -> Option<&'static str> {
    match code {
        51 => Some("Command is not implemented"),
        52 => Some("Variable does not exist"),
        53 => Some("Variable value is out of range"),
        54 => Some("EEprom not accessible"),
        55 => Some("Not Toggled Service Mode"),
        56 => Some("Can not send the command to internal micro"),
        57 => Some("Command not Executed"),
        58 => Some("The variable is not available, retry"),
        _ => None,
    }
}

pub fn transmission_state(code: u8) -> &'static str {
    match code {
        0 => "Everything is OK",
        _ => transmission_fault(code).unwrap_or("N/A"),
    }
}

pub fn global_state(code: u8) -> &'static str {
    match code {
        0 => "Sending Parameters",
        1 => "Wait Sun / Grid",
        2 => "Checking Grid",
        3 => "Measuring Riso",
        4 => "DcDc Start",
        5 => "Inverter Start",
        6 => "Run",
        7 => "Recovery",
        8 => "Pause",
        9 => "Ground Fault",
        10 => "OTH Fault",
        11 => "Address Setting",
        12 => "Self Test",
        13 => "Self Test Fail",
        14 => "Sensor Test + Meas.Riso",
        15 => "Leak Fault",
        16 => "Waiting for manual reset",
        17 => "Internal Error E026",
        18 => "Internal Error E027",
        19 => "Internal Error E028",
        20 => "Internal Error E029",
        21 => "Internal Error E030",
        22 => "Sending Wind Table",
        23 => "Failed Sending table",
        24 => "UTH Fault",
        25 => "Remote OFF",
        26 => "Interlock Fail",
        27 => "Executing Autotest",
        30 => "Waiting Sun",
        31 => "Temperature Fault",
        32 => "Fan Stucked",
        33 => "Int. Com. Fault",
        34 => "Slave Insertion",
        35 => "DC Switch Open",
        36 => "TRAS Switch Open",
        37 => "MASTER Exclusion",
        38 => "Auto Exclusion",
        98 => "Erasing Internal EEprom",
        99 => "Erasing External EEprom",
        100 => "Counting EEprom",
        101 => "Freeze",
        _ => "N/A",
    }
}

pub fn inverter_state(code: u8) -> &'static str {
    match code {
        0 => "Stand By",
        1 => "Checking Grid",
        2 => "Run",
        3 => "Bulk OV",
        4 => "Out OC",
        5 => "IGBT Sat",
        6 => "Bulk UV",
        7 => "Degauss Error",
        8 => "No Parameters",
        9 => "Bulk Low",
        10 => "Grid OV",
        11 => "Communication Error",
        12 => "Degaussing",
        13 => "Starting",
        14 => "Bulk Cap Fail",
        15 => "Leak Fail",
        16 => "DcDc Fail",
        17 => "Ileak Sensor Fail",
        18 => "SelfTest: relay inverter",
        19 => "SelfTest: wait for sensor test",
        20 => "SelfTest: test relay DcDc + sensor",
        21 => "SelfTest: relay inverter fail",
        22 => "SelfTest timeout fail",
        23 => "SelfTest: relay DcDc fail",
        24 => "Self Test 1",
        25 => "Waiting self test start",
        26 => "Dc Injection",
        27 => "Self Test 2",
        28 => "Self Test 3",
        29 => "Self Test 4",
        30 => "Internal Error",
        31 => "Internal Error",
        40 => "Forbidden State",
        41 => "Input UC",
        42 => "Zero Power",
        43 => "Grid Not Present",
        44 => "Waiting Start",
        45 => "MPPT",
        46 => "Grid Fail",
        47 => "Input OC",
        _ => "N/A",
    }
}

pub fn dcdc_state(code: u8) -> &'static str {
    match code {
        0 => "DcDc OFF",
        1 => "Ramp Start",
        2 => "MPPT",
        3 => "Not Used",
        4 => "Input OC",
        5 => "Input UV",
        6 => "Input OV",
        7 => "Input Low",
        8 => "No Parameters",
        9 => "Bulk OV",
        10 => "Communication Error",
        11 => "Ramp Fail",
        12 => "Internal Error",
        13 => "Input mode Error",
        14 => "Ground Fault",
        15 => "Inverter Fail",
        16 => "DcDc IGBT Sat",
        17 => "DcDc ILEAK Fail",
        18 => "DcDc Grid Fail",
        19 => "DcDc Comm. Error",
        _ => "N/A",
    }
}

pub fn alarm_state(code: u8) -> &'static str {
    match code {
        0 => "No Alarm",
        1 => "Sun Low",
        2 => "Input OC",
        3 => "Input UV",
        4 => "Input OV",
        5 => "Sun Low",
        6 => "No Parameters",
        7 => "Bulk OV",
        8 => "Comm. Error",
        9 => "Output OC",
        10 => "IGBT Sat",
        11 => "Bulk UV",
        12 => "Internal error",
        13 => "Grid Fail",
        14 => "Bulk Low",
        15 => "Ramp Fail",
        16 => "Dc / Dc Fail",
        17 => "Wrong Mode",
        18 => "Ground Fault",
        19 => "Over Temp.",
        20 => "Bulk Cap Fail",
        21 => "Inverter Fail",
        22 => "Start Timeout",
        23 => "Ground Fault",
        24 => "Degauss error",
        25 => "Ileak sens. fail",
        26 => "DcDc Fail",
        27 => "Self Test Error 1",
        28 => "Self Test Error 2",
        29 => "Self Test Error 3",
        30 => "Self Test Error 4",
        31 => "DC inj error",
        32 => "Grid OV",
        33 => "Grid UV",
        34 => "Grid OF",
        35 => "Grid UF",
        36 => "Z grid Hi",
        37 => "Internal error",
        38 => "Riso Low",
        39 => "Vref Error",
        40 => "Error Meas V",
        41 => "Error Meas F",
        42 => "Error Meas Z",
        43 => "Error Meas Ileak",
        44 => "Error Read V",
        45 => "Error Read I",
        46 => "Table fail",
        47 => "Fan Fail",
        48 => "UTH",
        49 => "Interlock fail",
        50 => "Remote Off",
        51 => "Vout Avg error",
        52 => "Battery low",
        53 => "Clk fail",
        54 => "Input UC",
        55 => "Zero Power",
        56 => "Fan Stucked",
        57 => "DC Switch Open",
        58 => "Tras Switch Open",
        59 => "AC Switch Open",
        60 => "Bulk UV",
        61 => "Autoexclusion",
        62 => "Grid df / dt",
        63 => "Den switch Open",
        64 => "Jbox fail",
        _ => "N/A",
    }
}

/// Description for the status byte selected by a state request.
pub fn state_name(which: StateType, code: u8) -> &'static str {
    match which {
        StateType::Global => global_state(code),
        StateType::Inverter => inverter_state(code),
        StateType::DcDc1 | StateType::DcDc2 => dcdc_state(code),
        StateType::Alarm => alarm_state(code),
    }
}

/// The four characters of a version response, each with its own table:
/// product model, grid standard, transformer presence, wind/PV variant.
pub fn version_parameter(position: usize, value: u8) -> &'static str {
    let c = value as char;
    match position {
        0 => match c {
            'i' => "Aurora 2 kW indoor",
            'o' => "Aurora 2 kW outdoor",
            'I' => "Aurora 3.6 kW indoor",
            'O' => "Aurora 3.0 - 3.6 kW outdoor",
            '5' => "Aurora 5.0 kW outdoor",
            '6' => "Aurora 6 kW outdoor",
            'P' => "3-phase interface (3G74)",
            'C' => "Aurora 50kW module",
            '4' => "Aurora 4.2kW new",
            '3' => "Aurora 3.6kW new",
            '2' => "Aurora 3.3kW new",
            '1' => "Aurora 3.0kW new",
            'D' => "Aurora 12.0kW",
            'X' => "Aurora 10.0kW",
            _ => "N/A",
        },
        1 => match c {
            'A' => "UL1741",
            'E' => "VDE0126",
            'S' => "DR 1663 / 2000",
            'I' => "ENEL DK 5950",
            'U' => "UK G83",
            'K' => "AS 4777",
            _ => "N/A",
        },
        2 => match c {
            'N' => "Transformerless Version",
            'T' => "Transformer Version",
            _ => "N/A",
        },
        3 => match c {
            'W' => "Wind Version",
            'N' => "PV Version",
            _ => "N/A",
        },
        _ => "N/A",
    }
}

/// Transformer presence reported by system info index 1.
pub fn transformer_type(code: u8) -> &'static str {
    match code {
        0 => "Without transformer",
        1 => "With transformer",
        _ => "N/A",
    }
}

/// Junction box fault flags, most significant bit first.
pub const JUNCTION_BOX_FLAGS: [&str; 8] = [
    "Fuse burnt",
    "Overtemperature",
    "Overvoltage",
    "Unbalanced string current",
    "Surge arrester fault",
    "Fan failure",
    "Communication error",
    "Self test failed",
];

/// Decomposes a junction box state byte into its active fault flags,
/// newline-joined, or "OK" when no bit is set.
pub fn junction_box_state(state: u8) -> String {
    let mut active = Vec::new();

    for (pos, name) in JUNCTION_BOX_FLAGS.iter().enumerate() {
        if state & (1 << (7 - pos)) != 0 {
            active.push(*name);
        }
    }

    if active.is_empty() {
        "OK".to_string()
    } else {
        active.join("\n")
    }
}
