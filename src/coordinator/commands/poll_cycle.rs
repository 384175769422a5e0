use crate::prelude::*;

use crate::aurora::client::measure;

pub struct PollCycle {
    channels: Channels,
    config: ConfigWrapper,
    inverter: config::Inverter,
}

impl PollCycle {
    pub fn new(channels: Channels, config: ConfigWrapper, inverter: config::Inverter) -> Self {
        Self {
            channels,
            config,
            inverter,
        }
    }

    /// One complete poll: connect, read identity, measurements and energy
    /// counters, publish, disconnect. The transport is closed on every
    /// exit path; a half-read cycle publishes nothing.
    pub async fn run(&self, client: &mut Client) -> Result<Readings> {
        debug!("starting poll cycle for address {}", client.address());

        client.open().await?;
        let result = self.read_all(client).await;
        let _ = client.close().await;
        let readings = result?;

        if self.config.mqtt().enabled() {
            let message = mqtt::Message::for_readings(
                &readings,
                self.config.mqtt().namespace(),
                self.inverter.address(),
            )?;
            if self
                .channels
                .to_mqtt
                .send(mqtt::ChannelData::Message(message))
                .is_err()
            {
                bail!("send(to_mqtt) failed - channel closed?");
            }
        }

        Ok(readings)
    }

    async fn read_all(&self, client: &mut Client) -> Result<Readings> {
        let product_number = client.part_number().await?;
        let serial_number = client.serial_number().await?;

        let output_power = client.measure(measure::GRID_POWER, false).await?;
        let input_voltage = client.measure(measure::INPUT_1_VOLTAGE, false).await?;
        let input1_current = client.measure(measure::INPUT_1_CURRENT, false).await?;
        let input2_current = client.measure(measure::INPUT_2_CURRENT, false).await?;
        let inverter_temperature = client.measure(measure::INVERTER_TEMPERATURE, false).await?;

        let daily_energy = to_kwh(client.cumulated_energy(CumulatedPeriod::Daily).await?);
        let energy_week = to_kwh(client.cumulated_energy(CumulatedPeriod::Weekly).await?);
        let energy_month = to_kwh(client.cumulated_energy(CumulatedPeriod::Monthly).await?);
        let year_energy = to_kwh(client.cumulated_energy(CumulatedPeriod::Yearly).await?);
        let energy_total = to_kwh(client.cumulated_energy(CumulatedPeriod::Total).await?);

        Ok(Readings {
            product_number,
            serial_number,
            output_power,
            input_voltage,
            input1_current,
            input2_current,
            daily_energy,
            energy_week,
            energy_month,
            year_energy,
            energy_total,
            inverter_temperature,
        })
    }
}

// counters are Wh on the wire
fn to_kwh(wh: u32) -> f64 {
    f64::from(wh) / 1000.0
}
