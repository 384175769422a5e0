pub mod poll_cycle;
pub mod publish_discovery;

pub use poll_cycle::PollCycle;
pub use publish_discovery::PublishDiscovery;
