use clap::Parser;

/// Aurora Bridge - an MQTT bridge for Aurora / Power-One solar inverters
#[derive(Debug, Parser)]
#[clap(author, version)]
pub struct Options {
    /// Config file to read
    #[clap(short = 'c', long = "config", default_value = "config.yaml")]
    pub config_file: String,
}

impl Options {
    pub fn new() -> Self {
        Self::parse()
    }
}
