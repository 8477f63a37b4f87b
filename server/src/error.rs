use std::convert::Infallible;

use draftmail::api::ServerResult;

use warp::{http::StatusCode, Rejection, Reply};

/// Wrap the shared draftmail error type so Reject can be impl'd
#[derive(Debug)]
pub struct Error(pub draftmail::Error);

impl warp::reject::Reject for Error {}

impl From<draftmail::Error> for Error {
    fn from(err: draftmail::Error) -> Self {
        Self(err)
    }
}

pub fn reject(err: draftmail::Error) -> Rejection {
    warp::reject::custom(Error(err))
}

/// Status code and response body for a library error.
///
/// Validation failures carry only a short message; upstream failures also
/// carry the upstream message as `details`.
fn to_response(err: &draftmail::Error) -> (StatusCode, ServerResult) {
    use draftmail::Error::*;

    match err {
        Validation(msg) => (StatusCode::BAD_REQUEST, ServerResult::failure(msg.clone(), None)),
        TooManyAttachments(_) => (
            StatusCode::BAD_REQUEST,
            ServerResult::failure("Too many attachments", Some(err.to_string())),
        ),
        AttachmentTooLarge { .. } => (
            StatusCode::PAYLOAD_TOO_LARGE,
            ServerResult::failure("Attachment too large", Some(err.to_string())),
        ),
        Upload(msg) => (
            StatusCode::BAD_REQUEST,
            ServerResult::failure("Invalid upload", Some(msg.clone())),
        ),
        Generation(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ServerResult::failure("Failed to generate email", Some(msg.clone())),
        ),
        Dispatch(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ServerResult::failure("Failed to send email", Some(msg.clone())),
        ),
        Storage(_) | Config(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ServerResult::failure("Internal server error", Some(err.details())),
        ),
    }
}

/// Maps rejections to HTTP return codes and a JSON `ServerResult` body.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status_code, resp) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, ServerResult::failure("Not found", None))
    } else if let Some(Error(e)) = err.find::<Error>() {
        to_response(e)
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            ServerResult::failure("Request body too large", None),
        )
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            ServerResult::failure("Invalid request body", Some(e.to_string())),
        )
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServerResult::failure("Unsupported content type", None),
        )
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (
            StatusCode::LENGTH_REQUIRED,
            ServerResult::failure("Content-Length required", None),
        )
    } else if let Some(e) = err.find::<warp::filters::cors::CorsForbidden>() {
        (StatusCode::FORBIDDEN, ServerResult::failure(e.to_string(), None))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ServerResult::failure("Method not allowed", None),
        )
    } else {
        log::error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ServerResult::failure("Internal server error", None),
        )
    };

    if status_code.is_server_error() {
        log::error!("{}: {:?}", status_code, resp.details);
    }

    Ok(warp::reply::with_status(warp::reply::json(&resp), status_code))
}
