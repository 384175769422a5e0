use crate::prelude::*;

pub struct PublishDiscovery {
    channels: Channels,
    mqtt: config::Mqtt,
    address: u8,
    serial: String,
    model: String,
}

impl PublishDiscovery {
    pub fn new(
        channels: Channels,
        mqtt: config::Mqtt,
        address: u8,
        serial: String,
        model: String,
    ) -> Self {
        Self {
            channels,
            mqtt,
            address,
            serial,
            model,
        }
    }

    pub async fn run(&self) -> Result<()> {
        info!(
            "publishing Home Assistant discovery for {} ({})",
            self.serial, self.model
        );

        let config =
            home_assistant::Config::new(&self.mqtt, self.address, &self.serial, &self.model);

        for message in config.all()? {
            if self
                .channels
                .to_mqtt
                .send(mqtt::ChannelData::Message(message))
                .is_err()
            {
                bail!("send(to_mqtt) failed - channel closed?");
            }
        }

        Ok(())
    }
}
