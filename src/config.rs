use crate::prelude::*;

use crate::aurora::transport::{SerialTransport, TcpTransport, Transport};

use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub inverter: Inverter,
    pub mqtt: Mqtt,
    pub daylight: Daylight,

    #[serde(default = "Config::default_poller")]
    pub poller: Poller,

    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,
}

// Inverter {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Inverter {
    /// Serial-to-Ethernet bridge in front of the RS-485 line. Mutually
    /// exclusive with `serial_port`.
    pub host: Option<String>,
    #[serde(default = "Config::default_inverter_port")]
    pub port: u16,

    /// Locally attached RS-485 adapter.
    pub serial_port: Option<String>,
    #[serde(default = "Config::default_baud_rate")]
    pub baud_rate: u32,

    pub address: u8,

    #[serde(default = "Config::default_timeout")]
    pub timeout: u64,
    #[serde(default = "Config::default_tries")]
    pub tries: u32,
}

impl Inverter {
    pub fn host(&self) -> &Option<String> {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn serial_port(&self) -> &Option<String> {
        &self.serial_port
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn tries(&self) -> u32 {
        self.tries
    }

    /// Builds the transport this section describes. The line is always
    /// 8N1, the protocol knows no other framing.
    pub fn transport(&self) -> Result<Box<dyn Transport>> {
        match (&self.host, &self.serial_port) {
            (Some(host), None) => Ok(Box::new(TcpTransport::new(
                host.clone(),
                self.port(),
                self.timeout(),
            ))),
            (None, Some(path)) => Ok(Box::new(SerialTransport::new(
                path.clone(),
                self.baud_rate(),
                tokio_serial::DataBits::Eight,
                tokio_serial::StopBits::One,
                tokio_serial::Parity::None,
                self.timeout(),
                self.tries(),
            ))),
            _ => bail!("inverter needs exactly one of host or serial_port"),
        }
    }
} // }}}

// HomeAssistant {{{
#[derive(Clone, Debug, Deserialize)]
pub struct HomeAssistant {
    #[serde(default = "Config::default_enabled")]
    pub enabled: bool,

    #[serde(default = "Config::default_mqtt_homeassistant_prefix")]
    pub prefix: String,
}

impl HomeAssistant {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
} // }}}

// Mqtt {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Mqtt {
    #[serde(default = "Config::default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub host: String,
    #[serde(default = "Config::default_mqtt_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,

    #[serde(default = "Config::default_mqtt_namespace")]
    pub namespace: String,

    #[serde(default = "Config::default_mqtt_homeassistant")]
    pub homeassistant: HomeAssistant,
}

impl Mqtt {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &Option<String> {
        &self.username
    }

    pub fn password(&self) -> &Option<String> {
        &self.password
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn homeassistant(&self) -> &HomeAssistant {
        &self.homeassistant
    }
} // }}}

// Daylight {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Daylight {
    pub latitude: f64,
    pub longitude: f64,

    #[serde(default = "Config::default_daylight_margin")]
    pub margin_minutes: i64,
}

impl Daylight {
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn margin_minutes(&self) -> i64 {
        self.margin_minutes
    }
} // }}}

// Poller {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Poller {
    #[serde(default = "Config::default_poll_interval")]
    pub interval: u64,

    #[serde(default = "Config::default_night_interval")]
    pub night_interval: u64,

    #[serde(default = "Config::default_backoff")]
    pub backoff: u64,
}

impl Poller {
    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn night_interval(&self) -> u64 {
        self.night_interval
    }

    pub fn backoff(&self) -> u64 {
        self.backoff
    }
} // }}}

pub struct ConfigWrapper {
    config: Arc<Mutex<Config>>,
}

impl Clone for ConfigWrapper {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
        }
    }
}

impl ConfigWrapper {
    pub fn new(file: String) -> Result<Self> {
        let config = Config::new(file)?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
        }
    }

    pub fn inverter(&self) -> Inverter {
        self.config.lock().unwrap().inverter.clone()
    }

    pub fn mqtt(&self) -> Mqtt {
        self.config.lock().unwrap().mqtt.clone()
    }

    pub fn daylight(&self) -> Daylight {
        self.config.lock().unwrap().daylight.clone()
    }

    pub fn poller(&self) -> Poller {
        self.config.lock().unwrap().poller.clone()
    }

    pub fn loglevel(&self) -> String {
        self.config.lock().unwrap().loglevel.clone()
    }

    pub fn summary(&self) {
        self.config.lock().unwrap().summary();
    }
}

impl Config {
    pub fn new(file: String) -> Result<Self> {
        let content = std::fs::read_to_string(&file)
            .map_err(|err| anyhow!("error reading {}: {}", file, err))?;

        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Logs the loaded configuration at info. Kept out of `new` so the
    /// summary lands after the logger is up.
    pub fn summary(&self) {
        info!("Configuration:");
        match (&self.inverter.host, &self.inverter.serial_port) {
            (Some(host), _) => info!(
                "  Inverter: {}:{} (address {})",
                host, self.inverter.port, self.inverter.address
            ),
            (_, Some(path)) => info!(
                "  Inverter: {} at {} baud (address {})",
                path, self.inverter.baud_rate, self.inverter.address
            ),
            _ => {}
        }
        info!(
            "    Timeout: {}s, tries: {}",
            self.inverter.timeout, self.inverter.tries
        );

        if self.mqtt.enabled {
            info!("  MQTT: {}:{}", self.mqtt.host, self.mqtt.port);
            info!("    Namespace: {}", self.mqtt.namespace);
            info!(
                "    Home Assistant: {}",
                if self.mqtt.homeassistant.enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
        } else {
            info!("  MQTT: disabled");
        }

        info!(
            "  Daylight: {:.4}, {:.4} with {} minute margin",
            self.daylight.latitude, self.daylight.longitude, self.daylight.margin_minutes
        );
        info!(
            "  Polling: every {}s, night check every {}s, backoff {}s",
            self.poller.interval, self.poller.night_interval, self.poller.backoff
        );
        info!("  Log level: {}", self.loglevel);
    }

    fn validate(&self) -> Result<()> {
        match (&self.inverter.host, &self.inverter.serial_port) {
            (Some(_), Some(_)) => {
                bail!("inverter.host and inverter.serial_port are mutually exclusive")
            }
            (None, None) => bail!("one of inverter.host or inverter.serial_port is required"),
            (Some(host), None) => {
                if host.is_empty() {
                    bail!("inverter.host cannot be empty");
                }
                if self.inverter.port == 0 {
                    bail!("inverter.port must be between 1 and 65535");
                }
            }
            (None, Some(path)) => {
                if path.is_empty() {
                    bail!("inverter.serial_port cannot be empty");
                }
                if self.inverter.baud_rate == 0 {
                    bail!("inverter.baud_rate must be nonzero");
                }
            }
        }

        if self.inverter.address == 0 {
            bail!("inverter.address must be between 1 and 255");
        }
        if self.inverter.timeout == 0 {
            bail!("inverter.timeout must be nonzero");
        }
        if self.inverter.tries == 0 {
            bail!("inverter.tries must be nonzero");
        }

        if self.mqtt.enabled {
            if self.mqtt.host.is_empty() {
                bail!("mqtt.host cannot be empty");
            }
            if self.mqtt.port == 0 {
                bail!("mqtt.port must be between 1 and 65535");
            }
        }

        if !(-90.0..=90.0).contains(&self.daylight.latitude) {
            bail!("daylight.latitude must be between -90 and 90");
        }
        if !(-180.0..=180.0).contains(&self.daylight.longitude) {
            bail!("daylight.longitude must be between -180 and 180");
        }

        if self.poller.interval == 0 {
            bail!("poller.interval must be nonzero");
        }
        if self.poller.night_interval == 0 {
            bail!("poller.night_interval must be nonzero");
        }

        Ok(())
    }

    fn default_inverter_port() -> u16 {
        8899
    }

    fn default_baud_rate() -> u32 {
        19200
    }

    fn default_timeout() -> u64 {
        5
    }

    fn default_tries() -> u32 {
        3
    }

    fn default_mqtt_port() -> u16 {
        1883
    }

    fn default_mqtt_namespace() -> String {
        "solar".to_string()
    }

    fn default_mqtt_homeassistant() -> HomeAssistant {
        HomeAssistant {
            enabled: Self::default_enabled(),
            prefix: Self::default_mqtt_homeassistant_prefix(),
        }
    }

    fn default_mqtt_homeassistant_prefix() -> String {
        "homeassistant".to_string()
    }

    fn default_daylight_margin() -> i64 {
        30
    }

    fn default_poller() -> Poller {
        Poller {
            interval: Self::default_poll_interval(),
            night_interval: Self::default_night_interval(),
            backoff: Self::default_backoff(),
        }
    }

    fn default_poll_interval() -> u64 {
        2
    }

    fn default_night_interval() -> u64 {
        300
    }

    fn default_backoff() -> u64 {
        60
    }

    fn default_enabled() -> bool {
        true
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }
}
