#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use aurora_bridge::prelude::*;

use aurora_bridge::aurora::checksum;
use aurora_bridge::aurora::frame::Request;
use aurora_bridge::aurora::transport::Transport;

pub fn common_setup() {
    let _ = env_logger::try_init();
}

// frame builders {{{

/// The wire bytes of one request, checksum included.
pub fn request_bytes(address: u8, command: CommandCode, params: &[u8]) -> Vec<u8> {
    Request::new(address, command, params).bytes().to_vec()
}

/// A valid 8-byte response frame around the given header and data bytes.
pub fn response_frame(transmission_state: u8, global_state: u8, data: [u8; 4]) -> Vec<u8> {
    let mut frame = vec![
        transmission_state,
        global_state,
        data[0],
        data[1],
        data[2],
        data[3],
    ];
    frame.extend_from_slice(&checksum::compute(&frame));
    frame
}

/// A response carrying one big-endian float in the data bytes.
pub fn float_frame(value: f32) -> Vec<u8> {
    response_frame(0, 6, value.to_be_bytes())
}

/// A response carrying one big-endian u32 in the data bytes.
pub fn u32_frame(value: u32) -> Vec<u8> {
    response_frame(0, 6, value.to_be_bytes())
}

// }}}

// MockTransport {{{

struct MockExchange {
    expect: Option<Vec<u8>>,
    reply: Result<Vec<u8>, AuroraError>,
}

#[derive(Default)]
pub struct MockState {
    pub opens: u32,
    pub closes: u32,
    pub exchanges: u32,
}

/// Scripted transport: replays queued exchanges in order, panicking on any
/// unscripted request so a test cannot silently drift from its script.
pub struct MockTransport {
    script: VecDeque<MockExchange>,
    connected: bool,
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            connected: false,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Counters surviving the move of the transport into a client.
    pub fn state(&self) -> Arc<Mutex<MockState>> {
        self.state.clone()
    }

    /// Queue a reply that also asserts the exact request bytes sent.
    pub fn expect(&mut self, request: Vec<u8>, reply: Vec<u8>) {
        self.script.push_back(MockExchange {
            expect: Some(request),
            reply: Ok(reply),
        });
    }

    /// Queue a reply without caring what the request was.
    pub fn reply(&mut self, reply: Vec<u8>) {
        self.script.push_back(MockExchange {
            expect: None,
            reply: Ok(reply),
        });
    }

    /// Queue a transport-level failure.
    pub fn fail(&mut self, error: AuroraError) {
        self.script.push_back(MockExchange {
            expect: None,
            reply: Err(error),
        });
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&mut self) -> Result<(), AuroraError> {
        self.connected = true;
        self.state.lock().unwrap().opens += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), AuroraError> {
        self.connected = false;
        self.state.lock().unwrap().closes += 1;
        Ok(())
    }

    async fn exchange(&mut self, request: &[u8]) -> Result<Bytes, AuroraError> {
        if !self.connected {
            return Err(AuroraError::NotConnected);
        }

        self.state.lock().unwrap().exchanges += 1;

        let exchange = match self.script.pop_front() {
            Some(exchange) => exchange,
            None => panic!("unscripted exchange: {:02x?}", request),
        };

        if let Some(expect) = exchange.expect {
            assert_eq!(&expect[..], request, "request frame mismatch");
        }

        exchange.reply.map(Bytes::from)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// }}}

// Factory {{{

pub struct Factory();

impl Factory {
    pub fn example_yaml() -> String {
        r#"
inverter:
  host: localhost
  port: 8899
  address: 2
  timeout: 1
mqtt:
  host: localhost
daylight:
  latitude: 46.644479
  longitude: 6.404010
"#
        .to_string()
    }

    pub fn config() -> Config {
        serde_yaml::from_str(&Self::example_yaml()).unwrap()
    }

    pub fn config_wrapper() -> ConfigWrapper {
        ConfigWrapper::from_config(Self::config())
    }

    pub fn inverter() -> config::Inverter {
        Self::config().inverter
    }

    pub fn mqtt() -> config::Mqtt {
        Self::config().mqtt
    }

    pub fn readings() -> Readings {
        Readings {
            product_number: "-3G96-".to_string(),
            serial_number: "123456".to_string(),
            output_power: 1500.25,
            input_voltage: 389.5,
            input1_current: 3.75,
            input2_current: 0.0,
            daily_energy: 12.345,
            energy_week: 50.0,
            energy_month: 200.0,
            year_energy: 2400.0,
            energy_total: 31337.0,
            inverter_temperature: 41.25,
        }
    }
}

// }}}
