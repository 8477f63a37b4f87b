use std::sync::Arc;

use super::app::App;
use super::config;
use super::routes;

pub async fn run(arg: config::HttpArg, app: Arc<App>) {
    log::info!("Starting HTTP server at 0.0.0.0:{}...", arg.port);
    log::info!("Staging uploads in {}", app.store.root().display());

    let router = routes::router(app);

    warp::serve(router).run(([0, 0, 0, 0], arg.port)).await;
}
