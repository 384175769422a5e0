use crate::prelude::*;

/// Broadcast channels wiring the components together. The mqtt pair
/// carries broker traffic in each direction; `to_coordinator` delivers
/// poll and discovery requests to the inverter side.
#[derive(Debug, Clone)]
pub struct Channels {
    pub from_mqtt: broadcast::Sender<crate::mqtt::ChannelData>,
    pub to_mqtt: broadcast::Sender<crate::mqtt::ChannelData>,
    pub to_coordinator: broadcast::Sender<coordinator::ChannelData>,
}

impl Default for Channels {
    fn default() -> Self {
        Self::new()
    }
}

impl Channels {
    pub fn new() -> Self {
        Self {
            from_mqtt: Self::channel(),
            to_mqtt: Self::channel(),
            to_coordinator: Self::channel(),
        }
    }

    fn channel<T: Clone>() -> broadcast::Sender<T> {
        broadcast::channel(2048).0
    }
}
