use std::{process, sync::Arc};

use clap::Parser;
use wcloud_api::{server, Config, Pipeline, StopWords};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    let stopwords = match StopWords::load(&config.stopwords) {
        Ok(stopwords) => Arc::new(stopwords),
        Err(e) => {
            log::error!(
                "Unable to load stopwords from {}: {e}",
                config.stopwords.display()
            );
            process::exit(1);
        }
    };

    let pipeline = Pipeline::new(&config, stopwords);

    if let Err(e) = server::run(&config, pipeline) {
        log::error!("Server stopped: {e}");
        process::exit(1);
    }
}
