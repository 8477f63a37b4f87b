use std::sync::Arc;

use clap::Parser;

mod app;
mod config;
mod controllers;
mod error;
mod filters;
mod http;
mod routes;
mod upload;

#[tokio::main]
async fn main() {
    env_logger::builder().format_timestamp_micros().init();

    let opt = config::Opt::parse();

    let settings = match draftmail::Config::load(opt.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let app = match app::App::from_config(&settings) {
        Ok(a) => a,
        Err(e) => {
            log::error!("Failed to initialize: {}", e);
            std::process::exit(1);
        }
    };

    let arg = config::HttpArg {
        port: opt.port.unwrap_or(settings.port),
    };

    http::run(arg, Arc::new(app)).await;
}
