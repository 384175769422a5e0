pub mod checksum;
pub mod client;
pub mod error;
pub mod frame;
pub mod states;
pub mod transport;
