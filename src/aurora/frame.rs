use nom_derive::{Nom, Parse};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::aurora::checksum;
use crate::aurora::error::AuroraError;
use crate::aurora::states;

/// Bytes in a request before the checksum is appended.
pub const REQUEST_PAYLOAD_LEN: usize = 8;
/// Bytes on the wire for a complete request.
pub const REQUEST_LEN: usize = 10;
/// Bytes in a complete response, checksum included.
pub const RESPONSE_LEN: usize = 8;
/// Command-specific parameter bytes in a request.
pub const PARAM_LEN: usize = 6;

#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum CommandCode {
    State = 50,
    PartNumber = 52,
    ResetAutoExclusion = 53,
    Version = 58,
    Measure = 59,
    SerialNumber = 63,
    ManufacturingDate = 65,
    FlagsAndSwitches = 67,
    CumulatedFloatEnergy = 68,
    TimeDate = 70,
    Firmware = 72,
    JoulesInLast10s = 76,
    CumulatedEnergy = 78,
    Alarms = 86,
    SystemInfo = 101,
    JunctionBoxMonitoringStatus = 103,
    JunctionBoxState = 200,
    JunctionBoxParam = 201,
}

/// Which of the five status bytes a state request (command 50) refers to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum StateType {
    Global = 1,
    Inverter = 2,
    DcDc1 = 3,
    DcDc2 = 4,
    Alarm = 5,
}

/// Accumulation window for the cumulated energy counters. The device skips
/// discriminant 2; these are the documented values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum CumulatedPeriod {
    Daily = 0,
    Weekly = 1,
    Monthly = 3,
    Yearly = 4,
    Total = 5,
    Partial = 6,
}

// Request {{{
/// An outbound command frame: unit address, command code and six parameter
/// bytes, zero-filled when the command needs fewer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Request {
    pub address: u8,
    pub command: CommandCode,
    pub params: [u8; PARAM_LEN],
}

impl Request {
    pub fn new(address: u8, command: CommandCode, params: &[u8]) -> Self {
        let mut padded = [0u8; PARAM_LEN];
        let take = params.len().min(PARAM_LEN);
        padded[..take].copy_from_slice(&params[..take]);

        Self {
            address,
            command,
            params: padded,
        }
    }

    /// The full 10-byte wire frame, checksum appended over the first 8.
    pub fn bytes(&self) -> [u8; REQUEST_LEN] {
        let mut frame = [0u8; REQUEST_LEN];
        frame[0] = self.address;
        frame[1] = self.command.into();
        frame[2..REQUEST_PAYLOAD_LEN].copy_from_slice(&self.params);

        let crc = checksum::compute(&frame[..REQUEST_PAYLOAD_LEN]);
        frame[REQUEST_PAYLOAD_LEN..].copy_from_slice(&crc);
        frame
    }
} // }}}

// Response {{{
fn data_bytes(i: &[u8]) -> nom::IResult<&[u8], [u8; 4]> {
    let (i, bytes) = nom::bytes::complete::take(4usize)(i)?;
    Ok((i, [bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// An inbound 8-byte frame. Most commands put a transmission state in byte
/// 0 and the global state in byte 1; the identity commands reuse both as
/// data, which is why `identity_bytes` exposes the leading six bytes raw.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Nom)]
#[nom(LittleEndian)]
pub struct Response {
    pub transmission_state: u8,
    pub global_state: u8,
    #[nom(Parse = "data_bytes")]
    pub data: [u8; 4],
    pub crc: u16,
}

impl Response {
    /// Parses a raw buffer into a response. Anything shorter than 8 bytes
    /// is rejected before any field is interpreted; trailing bytes beyond
    /// the frame are ignored.
    pub fn decode(raw: &[u8]) -> Result<Self, AuroraError> {
        match Response::parse(raw) {
            Ok((_rest, response)) => Ok(response),
            Err(_) => Err(AuroraError::MalformedFrame { len: raw.len() }),
        }
    }

    /// Recomputes the CRC over the six leading bytes and compares it to the
    /// received trailer.
    pub fn verify_checksum(&self) -> Result<(), AuroraError> {
        let expected = checksum::compute(&self.identity_bytes());
        if expected == self.crc.to_le_bytes() {
            Ok(())
        } else {
            Err(AuroraError::ChecksumMismatch)
        }
    }

    /// Transmission state 0 is success. A code from the known fault table
    /// maps to `Failure`; anything else is `UnknownTransmissionState`.
    pub fn check_transmission_state(&self) -> Result<(), AuroraError> {
        match self.transmission_state {
            0 => Ok(()),
            code => match states::transmission_fault(code) {
                Some(description) => Err(AuroraError::Failure { code, description }),
                None => Err(AuroraError::UnknownTransmissionState { code }),
            },
        }
    }

    /// The six data-carrying bytes, as used by the part number and serial
    /// number commands (no state semantics).
    pub fn identity_bytes(&self) -> [u8; 6] {
        [
            self.transmission_state,
            self.global_state,
            self.data[0],
            self.data[1],
            self.data[2],
            self.data[3],
        ]
    }

    /// Raw status byte for a state request: byte 1 is the global state,
    /// bytes 2..6 hold the inverter, DC-DC and alarm states.
    pub fn state_byte(&self, which: StateType) -> u8 {
        match which {
            StateType::Global => self.global_state,
            StateType::Inverter => self.data[0],
            StateType::DcDc1 => self.data[1],
            StateType::DcDc2 => self.data[2],
            StateType::Alarm => self.data[3],
        }
    }
} // }}}
