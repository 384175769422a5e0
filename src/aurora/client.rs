use std::time::{Duration, UNIX_EPOCH};

use chrono::{DateTime, Utc};

use crate::aurora::error::AuroraError;
use crate::aurora::frame::{CommandCode, CumulatedPeriod, Request, Response, StateType};
use crate::aurora::states;
use crate::aurora::transport::Transport;

/// Seconds between the Unix epoch and the device's own epoch,
/// 2000-01-01T00:00:00Z.
const DEVICE_EPOCH_UNIX: u64 = 946_684_800;

/// DSP measurement indices for [`Client::measure`]. The device knows more;
/// these are the ones with a documented meaning on every model.
pub mod measure {
    pub const GRID_VOLTAGE: u8 = 1;
    pub const GRID_CURRENT: u8 = 2;
    pub const GRID_POWER: u8 = 3;
    pub const FREQUENCY: u8 = 4;
    pub const INVERTER_TEMPERATURE: u8 = 21;
    pub const BOOSTER_TEMPERATURE: u8 = 22;
    pub const INPUT_1_VOLTAGE: u8 = 23;
    pub const INPUT_1_CURRENT: u8 = 25;
    pub const INPUT_2_VOLTAGE: u8 = 26;
    pub const INPUT_2_CURRENT: u8 = 27;
}

/// Answer to a system info request, shaped by the requested index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SysInfo {
    TransformerType(&'static str),
    ModuleCount(u8),
}

/// Protocol client bound to one unit address on one transport.
///
/// Every command follows the same shape: build the request frame, run one
/// exchange, verify the response CRC, check the transmission state (the
/// identity reads skip this, their responses carry data in the state
/// bytes), then decode the four data bytes. Transport failures propagate
/// unchanged.
pub struct Client {
    address: u8,
    transport: Box<dyn Transport>,
}

impl Client {
    pub fn new(transport: Box<dyn Transport>, address: u8) -> Self {
        Self { address, transport }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub async fn open(&mut self) -> Result<(), AuroraError> {
        self.transport.open().await
    }

    pub async fn close(&mut self) -> Result<(), AuroraError> {
        self.transport.close().await
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    // command plumbing {{{
    async fn command(
        &mut self,
        command: CommandCode,
        params: &[u8],
    ) -> Result<Response, AuroraError> {
        let request = Request::new(self.address, command, params);
        let raw = self.transport.exchange(&request.bytes()).await?;
        let response = Response::decode(&raw)?;
        response.verify_checksum()?;
        Ok(response)
    }

    async fn checked_command(
        &mut self,
        command: CommandCode,
        params: &[u8],
    ) -> Result<Response, AuroraError> {
        let response = self.command(command, params).await?;
        response.check_transmission_state()?;
        Ok(response)
    }
    // }}}

    /// Description of one of the five status bytes.
    pub async fn state(&mut self, which: StateType) -> Result<&'static str, AuroraError> {
        Ok(states::state_name(which, self.state_code(which).await?))
    }

    /// Raw code of one of the five status bytes.
    pub async fn state_code(&mut self, which: StateType) -> Result<u8, AuroraError> {
        let response = self.checked_command(CommandCode::State, &[]).await?;
        Ok(response.state_byte(which))
    }

    /// Part number, e.g. "-3G96-". No transmission-state check: the
    /// response packs the ASCII into all six leading bytes.
    pub async fn part_number(&mut self) -> Result<String, AuroraError> {
        let response = self.command(CommandCode::PartNumber, &[]).await?;
        decode_ascii(&response.identity_bytes())
    }

    /// Clears a latched auto exclusion fault.
    pub async fn reset_auto_exclusion(&mut self) -> Result<(), AuroraError> {
        self.checked_command(CommandCode::ResetAutoExclusion, &[10, 201])
            .await?;
        Ok(())
    }

    /// Hardware version: four characters, each with its own meaning
    /// (model, grid standard, transformer presence, wind/PV variant).
    pub async fn version(&mut self) -> Result<String, AuroraError> {
        let response = self.checked_command(CommandCode::Version, &[]).await?;
        let parts: Vec<&str> = response
            .data
            .iter()
            .enumerate()
            .map(|(position, &value)| states::version_parameter(position, value))
            .collect();
        Ok(parts.join(" - "))
    }

    /// One DSP measurement as an IEEE-754 float. `global` selects the
    /// plant-wide variant of the reading where the device distinguishes.
    pub async fn measure(&mut self, index: u8, global: bool) -> Result<f32, AuroraError> {
        let response = self
            .checked_command(CommandCode::Measure, &[index, global as u8])
            .await?;
        Ok(f32::from_be_bytes(response.data))
    }

    /// Serial number. Same layout as the part number, no state check.
    pub async fn serial_number(&mut self) -> Result<String, AuroraError> {
        let response = self.command(CommandCode::SerialNumber, &[]).await?;
        decode_ascii(&response.identity_bytes())
    }

    /// Manufacturing week and year, formatted "{year}-W{week}".
    pub async fn manufacturing_date(&mut self) -> Result<String, AuroraError> {
        let response = self
            .checked_command(CommandCode::ManufacturingDate, &[])
            .await?;
        let week = decode_ascii(&response.data[0..2])?;
        let year = decode_ascii(&response.data[2..4])?;
        Ok(format!("{}-W{}", year, week))
    }

    /// The four raw DC-switch / relay flag bytes.
    pub async fn flags_and_switches(&mut self) -> Result<[u8; 4], AuroraError> {
        let response = self
            .checked_command(CommandCode::FlagsAndSwitches, &[])
            .await?;
        Ok(response.data)
    }

    /// Cumulated energy in Wh as a float, over `ndays` days ending today.
    /// Only central inverters implement this; string models answer with a
    /// transmission fault.
    pub async fn cumulated_float_energy(
        &mut self,
        period: CumulatedPeriod,
        ndays: u16,
        global: bool,
    ) -> Result<f32, AuroraError> {
        let ndays = ndays.to_be_bytes();
        let params = [period.into(), ndays[0], ndays[1], global as u8, 0];
        let response = self
            .checked_command(CommandCode::CumulatedFloatEnergy, &params)
            .await?;
        Ok(f32::from_be_bytes(response.data))
    }

    /// The device clock, kept as seconds since its year-2000 epoch.
    pub async fn time_date(&mut self) -> Result<DateTime<Utc>, AuroraError> {
        let response = self.checked_command(CommandCode::TimeDate, &[]).await?;
        let seconds = u32::from_be_bytes(response.data);
        let unix = UNIX_EPOCH + Duration::from_secs(DEVICE_EPOCH_UNIX + u64::from(seconds));
        Ok(DateTime::<Utc>::from(unix))
    }

    /// Firmware release, four characters joined with dots ("C.0.1.6").
    pub async fn firmware(&mut self, mrelease: u8) -> Result<String, AuroraError> {
        let response = self
            .checked_command(CommandCode::Firmware, &[mrelease])
            .await?;
        let mut out = String::with_capacity(7);
        for (i, &b) in response.data.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push(b as char);
        }
        Ok(out)
    }

    /// Energy produced in the last 10 seconds, in joules.
    pub async fn joules_in_last_10s(&mut self) -> Result<f32, AuroraError> {
        let response = self
            .checked_command(CommandCode::JoulesInLast10s, &[])
            .await?;
        Ok(f32::from_be_bytes(response.data))
    }

    /// Cumulated energy counter for a period, in Wh.
    pub async fn cumulated_energy(
        &mut self,
        period: CumulatedPeriod,
    ) -> Result<u32, AuroraError> {
        let response = self
            .checked_command(CommandCode::CumulatedEnergy, &[period.into()])
            .await?;
        Ok(u32::from_be_bytes(response.data))
    }

    /// The four alarm registers, most recent last.
    pub async fn alarms(&mut self) -> Result<[&'static str; 4], AuroraError> {
        let response = self.checked_command(CommandCode::Alarms, &[]).await?;
        let d = response.data;
        Ok([
            states::alarm_state(d[0]),
            states::alarm_state(d[1]),
            states::alarm_state(d[2]),
            states::alarm_state(d[3]),
        ])
    }

    /// System info. Index 1 reports transformer presence, index 2 the
    /// 50 kW module count; anything else is rejected before a frame is
    /// sent, the device locks up on some undocumented indices.
    pub async fn sysinfo(&mut self, index: u8) -> Result<SysInfo, AuroraError> {
        if !matches!(index, 1 | 2) {
            return Err(AuroraError::UnsupportedIndex(index));
        }

        let response = self.checked_command(CommandCode::SystemInfo, &[index]).await?;
        Ok(match index {
            1 => SysInfo::TransformerType(states::transformer_type(response.data[0])),
            _ => SysInfo::ModuleCount(response.data[0]),
        })
    }

    /// Bitmask of junction boxes the inverter manages, or `None` when it
    /// manages none (byte 1 carries the box count for this command).
    pub async fn junction_box_monitoring_status(
        &mut self,
    ) -> Result<Option<u16>, AuroraError> {
        let response = self
            .checked_command(CommandCode::JunctionBoxMonitoringStatus, &[])
            .await?;

        if response.global_state == 0 {
            return Ok(None);
        }
        Ok(Some(u16::from_be_bytes([
            response.data[2],
            response.data[3],
        ])))
    }

    /// Active fault flags of one junction box, newline-joined, "OK" when
    /// none are set.
    pub async fn junction_box_state(&mut self, nbox: u8) -> Result<String, AuroraError> {
        Ok(states::junction_box_state(
            self.junction_box_state_code(nbox).await?,
        ))
    }

    /// Raw fault flag byte of one junction box.
    pub async fn junction_box_state_code(&mut self, nbox: u8) -> Result<u8, AuroraError> {
        let response = self
            .checked_command(CommandCode::JunctionBoxState, &[nbox])
            .await?;
        Ok(response.global_state)
    }

    /// One junction box parameter as an IEEE-754 float.
    pub async fn junction_box_param(
        &mut self,
        nbox: u8,
        param: u8,
    ) -> Result<f32, AuroraError> {
        let response = self
            .checked_command(CommandCode::JunctionBoxParam, &[nbox, param])
            .await?;
        Ok(f32::from_be_bytes(response.data))
    }
}

fn decode_ascii(bytes: &[u8]) -> Result<String, AuroraError> {
    if !bytes.iter().all(|&b| b.is_ascii() && !b.is_ascii_control()) {
        return Err(AuroraError::InvalidAscii);
    }
    Ok(bytes.iter().map(|&b| b as char).collect())
}
