/// Commands accepted over `{namespace}/cmd/#`. Anything else on that
/// subtree is logged and dropped by the coordinator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    /// Run one poll cycle now, daylight or not.
    Poll,
    /// Republish the Home Assistant discovery configs.
    Discovery,
}

impl Command {
    pub fn to_result_topic(&self) -> String {
        let rest = match self {
            Command::Poll => "poll",
            Command::Discovery => "discovery",
        };

        format!("result/{}", rest)
    }
}
