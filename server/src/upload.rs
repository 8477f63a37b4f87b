use bytes::Buf;
use futures::{StreamExt, TryStreamExt};
use warp::multipart::{FormData, Part};

use draftmail::email::DispatchRequest;
use draftmail::storage::{AttachmentStore, StagedBatch};
use draftmail::Error;

pub const ATTACHMENTS_FIELD: &str = "attachments";

/// Read a `POST /send` form into a dispatch request, staging file parts as
/// they arrive.
///
/// Parts beyond `max_attachments` are rejected before they are written.
/// If anything fails, files staged so far are released with the batch.
pub async fn read_send_form(
    store: &AttachmentStore,
    max_attachments: usize,
    form: FormData,
) -> Result<DispatchRequest, Error> {
    futures::pin_mut!(form);

    let mut recipients = String::new();
    let mut subject = String::new();
    let mut body = String::new();
    let mut attachments = StagedBatch::new();

    while let Some(part) = form.try_next().await.map_err(upload_error)? {
        let field = part.name().to_string();

        match field.as_str() {
            "recipients" => recipients = read_text(part).await?,
            "subject" => subject = read_text(part).await?,
            "body" => body = read_text(part).await?,
            ATTACHMENTS_FIELD => {
                if attachments.len() >= max_attachments {
                    log::warn!("Rejecting upload with more than {} attachments", max_attachments);
                    return Err(Error::TooManyAttachments(max_attachments));
                }

                let filename = part.filename().unwrap_or("attachment").to_string();
                let data = part.stream().map_err(upload_error);

                attachments.push(store.stage(&filename, data).await?);
            }
            other => {
                log::debug!("Ignoring unknown form field {}", other);
                drain(part).await?;
            }
        }
    }

    Ok(DispatchRequest {
        recipients,
        subject,
        body,
        attachments,
    })
}

async fn read_text(part: Part) -> Result<String, Error> {
    let name = part.name().to_string();
    let mut data = Vec::new();

    let stream = part.stream();
    futures::pin_mut!(stream);

    while let Some(chunk) = stream.next().await {
        let mut chunk = chunk.map_err(upload_error)?;
        data.extend_from_slice(&chunk.copy_to_bytes(chunk.remaining()));
    }

    String::from_utf8(data).map_err(|_| Error::Upload(format!("field {} is not valid UTF-8", name)))
}

async fn drain(part: Part) -> Result<(), Error> {
    let stream = part.stream();
    futures::pin_mut!(stream);

    while let Some(chunk) = stream.next().await {
        chunk.map_err(upload_error)?;
    }
    Ok(())
}

fn upload_error(err: warp::Error) -> Error {
    Error::Upload(err.to_string())
}
