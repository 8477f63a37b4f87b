use std::sync::Arc;

use draftmail::api::{self, GenerateRequest, Health, ServerResult};
use draftmail::Error;

use warp::{multipart::FormData, Rejection, Reply};

use super::app::App;
use super::error::reject;
use super::upload;

pub async fn generate(app: Arc<App>, req: GenerateRequest) -> Result<impl Reply, Rejection> {
    if req.prompt.trim().is_empty() {
        return Err(reject(Error::Validation("Prompt is required".to_string())));
    }

    log::info!("Generating email for a {} character prompt", req.prompt.len());

    let email = app.generator.generate(&req.prompt).await.map_err(reject)?;

    let resp = ServerResult {
        success: true,
        email: Some(email),
        ..Default::default()
    };

    Ok(warp::reply::json(&resp))
}

pub async fn send(app: Arc<App>, form: FormData) -> Result<impl Reply, Rejection> {
    let request = upload::read_send_form(&app.store, app.max_attachments, form)
        .await
        .map_err(reject)?;

    let result = app.dispatcher.dispatch(request).await.map_err(reject)?;

    let resp = ServerResult {
        success: true,
        message_id: Some(result.message_id),
        message: Some(api::SEND_SUCCESS_MESSAGE.to_string()),
        attachments_count: Some(result.attachments_count),
        ..Default::default()
    };

    Ok(warp::reply::json(&resp))
}

pub async fn health() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&Health {
        status: "OK".to_string(),
        message: "draftmail server is running".to_string(),
    }))
}
