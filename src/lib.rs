pub mod aurora;
pub mod channels;
pub mod command;
pub mod config;
pub mod coordinator;
pub mod daylight;
pub mod home_assistant;
pub mod mqtt;
pub mod options;
pub mod prelude;
pub mod reading;

const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::prelude::*;

use crate::mqtt::Mqtt;

use std::io::Write;

pub fn init_logger(loglevel: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(loglevel))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Never)
        .init();
}

#[derive(Clone)]
pub struct Components {
    pub coordinator: Coordinator,
    pub mqtt: Mqtt,
    pub channels: Channels,
}

impl Components {
    pub async fn stop(&self) {
        info!("Stopping all components...");

        self.coordinator.stop();
        let _ = self.mqtt.stop().await;

        info!("Shutdown complete");
    }
}

pub async fn app(config: ConfigWrapper) -> Result<()> {
    info!("aurora-bridge {} starting", CARGO_PKG_VERSION);
    config.summary();

    let channels = Channels::new();

    let coordinator = Coordinator::new(config.clone(), channels.clone());
    let mqtt = Mqtt::new(config, channels.clone(), coordinator.stats.clone());

    let components = Components {
        coordinator: coordinator.clone(),
        mqtt: mqtt.clone(),
        channels,
    };
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl+c: {}", err);
        }
        components.stop().await;
    });

    futures::try_join!(coordinator.start(), mqtt.start())?;

    Ok(())
}
