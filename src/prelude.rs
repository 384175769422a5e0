pub use anyhow::{anyhow, bail, Error, Result};
pub use log::{debug, error, info, trace, warn};
pub use tokio::sync::broadcast;

pub use crate::aurora::{
    self,
    client::{measure, Client},
    error::AuroraError,
    frame::{CommandCode, CumulatedPeriod, StateType},
};
pub use crate::channels::Channels;
pub use crate::command::Command;
pub use crate::config::{self, Config, ConfigWrapper};
pub use crate::coordinator::{self, Coordinator};
pub use crate::daylight;
pub use crate::home_assistant;
pub use crate::mqtt;
pub use crate::options::Options;
pub use crate::reading::Readings;
