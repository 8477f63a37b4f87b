use std::path::Path;

use reqwest::multipart::{Form, Part};

use draftmail::api::{GenerateRequest, ServerResult};
use draftmail::email::GeneratedEmail;

use crate::error::Error;
use crate::session::SendPayload;

const GENERATE_FAILED: &str = "Failed to generate email";
const SEND_FAILED: &str = "Failed to send email";

/// HTTP client for a draftmail server
pub struct Client {
    base: String,
    client: reqwest::Client,
}

impl Client {
    pub fn new(base: &str) -> Result<Self, Error> {
        reqwest::Url::parse(base)
            .map_err(|e| Error::Invalid(format!("invalid server URL {}: {}", base, e)))?;

        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        })
    }

    pub async fn generate(&self, prompt: &str) -> Result<GeneratedEmail, Error> {
        let req = GenerateRequest {
            prompt: prompt.to_string(),
        };

        let resp = self
            .client
            .post(&format!("{}/generate", self.base))
            .json(&req)
            .send()
            .await
            .map_err(|e| unreachable_server(GENERATE_FAILED, e))?;

        let result = parse(resp, GENERATE_FAILED).await?;

        result
            .email
            .ok_or_else(|| Error::Server(ServerResult::failure(GENERATE_FAILED, None)))
    }

    pub async fn send(&self, payload: &SendPayload) -> Result<ServerResult, Error> {
        let mut form = Form::new()
            .text("recipients", payload.recipients.clone())
            .text("subject", payload.subject.clone())
            .text("body", payload.body.clone());

        for path in &payload.attachments {
            let data = tokio::fs::read(path)
                .await
                .map_err(|e| Error::Invalid(format!("cannot read {}: {}", path.display(), e)))?;

            log::debug!("Attaching {} ({} bytes)", path.display(), data.len());

            form = form.part("attachments", Part::bytes(data).file_name(file_name(path)));
        }

        let resp = self
            .client
            .post(&format!("{}/send", self.base))
            .multipart(form)
            .send()
            .await
            .map_err(|e| unreachable_server(SEND_FAILED, e))?;

        parse(resp, SEND_FAILED).await
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string())
}

fn unreachable_server(fallback: &str, err: reqwest::Error) -> Error {
    Error::Server(ServerResult::failure(fallback, Some(err.to_string())))
}

/// Decode a `ServerResult`, turning non-2xx responses into errors. Error
/// bodies without a message get `fallback`.
async fn parse(resp: reqwest::Response, fallback: &str) -> Result<ServerResult, Error> {
    let status = resp.status();
    let body = resp
        .bytes()
        .await
        .map_err(|e| unreachable_server(fallback, e))?;

    let result = decode(status.is_success(), &body, fallback);
    log::debug!("{} {:?}", status, result);
    result
}

fn decode(success: bool, body: &[u8], fallback: &str) -> Result<ServerResult, Error> {
    match serde_json::from_slice::<ServerResult>(body) {
        Ok(result) if success => Ok(result),
        Ok(mut result) => {
            if result.error.is_none() {
                result.error = Some(fallback.to_string());
            }
            Err(Error::Server(result))
        }
        Err(e) => Err(Error::Server(ServerResult::failure(fallback, Some(e.to_string())))),
    }
}
