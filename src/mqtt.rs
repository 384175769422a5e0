use crate::prelude::*;
use crate::coordinator::CycleStats;

use rumqttc::{AsyncClient, Event, EventLoop, Incoming, LastWill, MqttOptions, Publish, QoS};
use std::sync::{Arc, Mutex};

// Message {{{
/// One outbound publish. Topics are complete, the sender publishes them
/// verbatim (discovery configs live outside our namespace).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Message {
    pub topic: String,
    pub retain: bool,
    pub payload: String,
}

impl Message {
    pub fn for_readings(readings: &Readings, namespace: &str, address: u8) -> Result<Message> {
        Ok(Message {
            topic: format!("{}/{}", namespace, address),
            retain: false,
            payload: serde_json::to_string(readings)?,
        })
    }

    /// Maps an inbound `cmd/…` topic (namespace already stripped) to a
    /// command.
    pub fn to_command(&self) -> Result<Command> {
        let parts: Vec<&str> = self.topic.split('/').collect();

        let r = match parts[..] {
            ["cmd", "poll"] => Command::Poll,
            ["cmd", "discovery"] => Command::Discovery,
            [..] => bail!("unhandled command topic: {}", self.topic),
        };

        Ok(r)
    }
} // }}}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ChannelData {
    Message(Message),
    Shutdown,
}

pub type Sender = broadcast::Sender<ChannelData>;

#[derive(Clone)]
pub struct Mqtt {
    config: ConfigWrapper,
    channels: Channels,
    stats: Arc<Mutex<CycleStats>>,
}

impl Mqtt {
    pub fn new(config: ConfigWrapper, channels: Channels, stats: Arc<Mutex<CycleStats>>) -> Self {
        Self {
            config,
            channels,
            stats,
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.mqtt().enabled() {
            info!("mqtt disabled, skipping");
            return Ok(());
        }

        info!(
            "connecting to mqtt broker at {}:{}",
            self.config.mqtt().host(),
            self.config.mqtt().port()
        );

        let (client, eventloop) = AsyncClient::new(self.options(), 10);

        futures::try_join!(
            self.setup(client.clone()),
            self.receiver(eventloop),
            self.sender(client)
        )?;

        Ok(())
    }

    fn options(&self) -> MqttOptions {
        let mqtt = self.config.mqtt();

        let mut options = MqttOptions::new("aurora-bridge", mqtt.host(), mqtt.port());

        options.set_last_will(LastWill {
            topic: self.lwt_topic(),
            message: bytes::Bytes::from("offline"),
            qos: QoS::AtLeastOnce,
            retain: true,
        });
        options.set_keep_alive(std::time::Duration::from_secs(60));
        if let (Some(u), Some(p)) = (mqtt.username(), mqtt.password()) {
            options.set_credentials(u, p);
        }

        options
    }

    pub async fn stop(&self) -> Result<()> {
        info!("Stopping MQTT client...");
        let _ = self.channels.to_mqtt.send(ChannelData::Shutdown);
        Ok(())
    }

    async fn setup(&self, client: AsyncClient) -> Result<()> {
        client
            .publish(self.lwt_topic(), QoS::AtLeastOnce, true, "online")
            .await?;

        client
            .subscribe(
                format!("{}/cmd/#", self.config.mqtt().namespace()),
                QoS::AtMostOnce,
            )
            .await?;

        Ok(())
    }

    // mqtt -> coordinator
    async fn receiver(&self, mut eventloop: EventLoop) -> Result<()> {
        let mut shutdown_rx = self.channels.to_mqtt.subscribe();

        loop {
            tokio::select! {
                event = eventloop.poll() => match event {
                    Ok(Event::Incoming(Incoming::Publish(publish))) => {
                        self.handle_message(publish)?;
                    }
                    Ok(_) => {} // keepalives etc
                    Err(e) => {
                        error!("mqtt connection lost: {}", e);
                        info!("reconnecting in 5s");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                },
                message = shutdown_rx.recv() => {
                    if let Ok(ChannelData::Shutdown) = message {
                        info!("MQTT receiver shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    fn handle_message(&self, publish: Publish) -> Result<()> {
        // strip our namespace prefix and the slash after it. slicing by
        // length still works when the namespace itself contains a /
        let relative = publish.topic[self.config.mqtt().namespace().len() + 1..].to_owned();

        let message = Message {
            topic: relative,
            retain: publish.retain,
            payload: String::from_utf8(publish.payload.to_vec())?,
        };
        debug!("RX: {:?}", message);
        if self
            .channels
            .from_mqtt
            .send(ChannelData::Message(message))
            .is_err()
        {
            bail!("send(from_mqtt) failed - channel closed?");
        }

        Ok(())
    }

    // coordinator -> mqtt
    async fn sender(&self, client: AsyncClient) -> Result<()> {
        use ChannelData::*;

        let mut receiver = self.channels.to_mqtt.subscribe();

        loop {
            match receiver.recv().await? {
                Shutdown => {
                    info!("MQTT sender received shutdown signal");
                    let _ = client.disconnect().await;
                    break;
                }
                Message(message) => self.publish(&client, message).await,
            }
        }

        info!("MQTT sender loop exiting");
        Ok(())
    }

    /// Publishes one message, retrying transient broker errors a few
    /// times before dropping it.
    async fn publish(&self, client: &AsyncClient, message: Message) {
        info!("publishing: {} = {}", message.topic, message.payload);

        let payload = message.payload.as_bytes().to_vec();

        for attempt in 1..=3 {
            let sent = client
                .publish(
                    &message.topic,
                    QoS::AtLeastOnce,
                    message.retain,
                    payload.as_slice(),
                )
                .await;

            match sent {
                Ok(_) => {
                    if let Ok(mut stats) = self.stats.lock() {
                        stats.mqtt_messages_sent += 1;
                    }
                    return;
                }
                Err(err) => {
                    if let Ok(mut stats) = self.stats.lock() {
                        stats.mqtt_errors += 1;
                    }
                    if attempt < 3 {
                        error!(
                            "publish to {} failed: {:?} - retrying in 10s (attempt {}/3)",
                            message.topic, err, attempt
                        );
                        tokio::time::sleep(std::time::Duration::from_secs(10)).await;
                    } else {
                        error!("giving up on {}: {:?}", message.topic, err);
                    }
                }
            }
        }
    }

    fn lwt_topic(&self) -> String {
        format!("{}/LWT", self.config.mqtt().namespace())
    }
}
