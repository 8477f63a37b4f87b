use std::convert::Infallible;
use std::sync::Arc;

use super::app::App;

use warp::Filter;

/// Hands the shared services to a handler
pub fn with_app(app: Arc<App>) -> impl Filter<Extract = (Arc<App>,), Error = Infallible> + Clone {
    warp::any().map(move || app.clone())
}
