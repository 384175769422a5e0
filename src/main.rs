use aurora_bridge::prelude::*;

#[tokio::main]
async fn main() {
    let options = Options::new();

    // logging isn't up yet, config errors go to stderr
    let config = match ConfigWrapper::new(options.config_file) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {:?}", err);
            std::process::exit(255);
        }
    };

    aurora_bridge::init_logger(&config.loglevel());

    if let Err(err) = aurora_bridge::app(config).await {
        error!("{:?}", err);
        std::process::exit(255);
    }
}
