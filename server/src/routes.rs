use std::convert::Infallible;
use std::sync::Arc;

use warp::{reply::Reply, Filter, Rejection};

use super::app::App;
use super::config;
use super::controllers;
use super::error;
use super::filters;

/// Single-page form driving `/generate` and `/send`
const INDEX_HTML: &str = include_str!("../static/index.html");

/// All routes, with CORS and JSON error replies
pub fn router(app: Arc<App>) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST"])
        .allow_header("content-type");

    index()
        .or(health())
        .or(generate(app.clone()))
        .or(send(app))
        .with(cors)
        .recover(error::handle_rejection)
}

/// GET / => the browser form
pub fn index() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::html(INDEX_HTML))
}

/// GET /health
pub fn health() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("health")
        .or(warp::path!("api" / "health"))
        .unify()
        .and(warp::get())
        .and_then(controllers::health)
}

/// POST /generate with a JSON `{prompt}` body
pub fn generate(app: Arc<App>) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("generate")
        .or(warp::path!("api" / "generate-email"))
        .unify()
        .and(warp::post())
        .and(filters::with_app(app))
        .and(warp::body::content_length_limit(config::MAX_PROMPT_BODY))
        .and(warp::body::json())
        .and_then(controllers::generate)
}

/// POST /send with a multipart body: recipients, subject, body and up to
/// `max_attachments` file parts named `attachments`
pub fn send(app: Arc<App>) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let max_length = app.max_send_body();

    warp::path!("send")
        .or(warp::path!("api" / "send-email"))
        .unify()
        .and(warp::post())
        .and(filters::with_app(app))
        .and(warp::multipart::form().max_length(max_length))
        .and_then(controllers::send)
}
