use crate::prelude::*;

pub mod commands;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ChannelData {
    Shutdown,
    Poll,
    Discovery,
}

#[derive(Default)]
pub struct CycleStats {
    pub cycles_run: u64,
    pub cycles_failed: u64,
    pub readings_published: u64,
    pub mqtt_messages_sent: u64,
    pub mqtt_errors: u64,
}

impl CycleStats {
    pub fn print_summary(&self) {
        info!("Cycle Statistics:");
        info!("  Cycles run: {}", self.cycles_run);
        info!("  Cycles failed: {}", self.cycles_failed);
        info!("  Readings published: {}", self.readings_published);
        info!("  MQTT:");
        info!("    Messages sent: {}", self.mqtt_messages_sent);
        info!("    Errors: {}", self.mqtt_errors);
    }
}

#[derive(Clone)]
pub struct Coordinator {
    config: ConfigWrapper,
    channels: Channels,
    pub stats: Arc<Mutex<CycleStats>>,
}

impl Coordinator {
    pub fn new(config: ConfigWrapper, channels: Channels) -> Self {
        Self {
            config,
            channels,
            stats: Arc::new(Mutex::new(CycleStats::default())),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if self.config.mqtt().enabled() {
            futures::try_join!(self.poller(), self.mqtt_receiver())?;
        } else {
            self.poller().await?;
        }

        Ok(())
    }

    pub fn stop(&self) {
        let _ = self.channels.to_coordinator.send(ChannelData::Shutdown);

        if self.config.mqtt().enabled() {
            let _ = self.channels.from_mqtt.send(mqtt::ChannelData::Shutdown);
        }
    }

    /// Scheduled polling loop. One cycle per `interval` while the sun is
    /// up, a `night_interval` nap between daylight re-checks otherwise.
    /// Forced polls arriving over MQTT run here too, so only one cycle
    /// talks to the inverter at a time.
    async fn poller(&self) -> Result<()> {
        let mut receiver = self.channels.to_coordinator.subscribe();

        // discovery needs the serial and part numbers, which only a
        // successful cycle can provide
        let mut discovery_pending =
            self.config.mqtt().enabled() && self.config.mqtt().homeassistant().enabled();
        let mut identity: Option<(String, String)> = None;

        loop {
            let daylight = self.config.daylight();

            let delay = if daylight::is_sun_up(
                daylight.latitude(),
                daylight.longitude(),
                daylight.margin_minutes(),
                Utc::now(),
            ) {
                let (delay, _) = self
                    .attempt_cycle(&mut identity, &mut discovery_pending)
                    .await;
                delay
            } else {
                let night_interval = self.config.poller().night_interval();
                debug!("sun is down, next daylight check in {}s", night_interval);
                Duration::from_secs(night_interval)
            };

            let deadline = tokio::time::Instant::now() + delay;

            loop {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => break,
                    message = receiver.recv() => match message {
                        Ok(ChannelData::Poll) => {
                            info!("poll requested over mqtt");
                            let (_, ok) = self
                                .attempt_cycle(&mut identity, &mut discovery_pending)
                                .await;
                            self.publish_result(Command::Poll, ok);
                        }
                        Ok(ChannelData::Discovery) => {
                            let ok = match self.publish_discovery(&identity).await {
                                Ok(()) => true,
                                Err(err) => {
                                    warn!("discovery request failed: {:?}", err);
                                    false
                                }
                            };
                            self.publish_result(Command::Discovery, ok);
                        }
                        Ok(ChannelData::Shutdown) => {
                            info!("Received shutdown signal, printing final statistics:");
                            if let Ok(stats) = self.stats.lock() {
                                stats.print_summary();
                            }
                            return Ok(());
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("dropped {} queued commands", n);
                        }
                        Err(broadcast::error::RecvError::Closed) => return Ok(()),
                    },
                }
            }
        }
    }

    // Runs one cycle and decides how long to wait for the next one. The
    // bool is the cycle outcome, for MQTT command replies.
    async fn attempt_cycle(
        &self,
        identity: &mut Option<(String, String)>,
        discovery_pending: &mut bool,
    ) -> (Duration, bool) {
        let poller = self.config.poller();

        if let Ok(mut stats) = self.stats.lock() {
            stats.cycles_run += 1;
        }

        match self.run_cycle().await {
            Ok(readings) => {
                if self.config.mqtt().enabled() {
                    if let Ok(mut stats) = self.stats.lock() {
                        stats.readings_published += 1;
                    }
                }

                *identity = Some((readings.serial_number, readings.product_number));

                if *discovery_pending {
                    match self.publish_discovery(identity).await {
                        Ok(()) => *discovery_pending = false,
                        Err(err) => warn!("discovery publish failed: {:?}", err),
                    }
                }

                (Duration::from_secs(poller.interval()), true)
            }
            Err(err) => {
                if let Ok(mut stats) = self.stats.lock() {
                    stats.cycles_failed += 1;
                }

                match err.downcast_ref::<AuroraError>() {
                    Some(AuroraError::UnknownTransmissionState { code }) => {
                        warn!(
                            "inverter is up but not ready (transmission state {}), backing off {}s",
                            code,
                            poller.backoff()
                        );
                        (Duration::from_secs(poller.backoff()), false)
                    }
                    _ => {
                        error!("poll cycle failed: {:?}", err);
                        (Duration::from_secs(poller.interval()), false)
                    }
                }
            }
        }
    }

    async fn run_cycle(&self) -> Result<Readings> {
        let inverter = self.config.inverter();
        let mut client = Client::new(inverter.transport()?, inverter.address());

        commands::PollCycle::new(self.channels.clone(), self.config.clone(), inverter)
            .run(&mut client)
            .await
    }

    async fn publish_discovery(&self, identity: &Option<(String, String)>) -> Result<()> {
        if !self.config.mqtt().homeassistant().enabled() {
            bail!("home assistant discovery is disabled");
        }

        let (serial, model) = match identity {
            Some((serial, model)) => (serial.clone(), model.clone()),
            None => bail!("device identity not read yet, discovery needs one successful poll"),
        };

        commands::PublishDiscovery::new(
            self.channels.clone(),
            self.config.mqtt(),
            self.config.inverter().address(),
            serial,
            model,
        )
        .run()
        .await
    }

    fn publish_result(&self, command: Command, ok: bool) {
        if !self.config.mqtt().enabled() {
            return;
        }

        let message = mqtt::Message {
            topic: format!(
                "{}/{}",
                self.config.mqtt().namespace(),
                command.to_result_topic()
            ),
            retain: false,
            payload: if ok { "OK" } else { "FAIL" }.to_string(),
        };

        if self
            .channels
            .to_mqtt
            .send(mqtt::ChannelData::Message(message))
            .is_err()
        {
            warn!("send(to_mqtt) failed - channel closed?");
        }
    }

    async fn mqtt_receiver(&self) -> Result<()> {
        let mut receiver = self.channels.from_mqtt.subscribe();

        while let mqtt::ChannelData::Message(message) = receiver.recv().await? {
            let _ = self.process_message(message).await;
        }

        Ok(())
    }

    async fn process_message(&self, message: mqtt::Message) -> Result<()> {
        match message.to_command() {
            Ok(command) => {
                info!("parsed command {:?}", command);
                let channel_data = match command {
                    Command::Poll => ChannelData::Poll,
                    Command::Discovery => ChannelData::Discovery,
                };
                if self.channels.to_coordinator.send(channel_data).is_err() {
                    bail!("send(to_coordinator) failed - channel closed?");
                }
            }
            Err(err) => {
                warn!("{:?}", err);
            }
        }

        Ok(())
    }
}
