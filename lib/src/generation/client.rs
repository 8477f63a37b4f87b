use std::future::Future;
use std::pin::Pin;

use super::api;
use crate::config::CompletionConfig;
use crate::Error;

pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<String, Error>> + Send + 'a>>;

/// One-shot text completion. Implemented by the HTTP client below and by
/// fakes in tests.
pub trait Completion: Send + Sync {
    fn complete<'a>(&'a self, system: &'a str, prompt: &'a str, temperature: f64)
        -> CompletionFuture<'a>;
}

/// Client for an OpenAI-compatible chat completions API (Groq by default)
pub struct Client {
    api_key: String,
    url: String,
    model: String,
    client: reqwest::Client,
}

impl Client {
    pub fn new(config: &CompletionConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        let url = format!(
            "{}{}",
            config.base_url.trim_end_matches('/'),
            api::CHAT_COMPLETIONS_PATH
        );

        reqwest::Url::parse(&url).map_err(|e| Error::Config(format!("{}: {}", url, e)))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            url,
            model: config.model.clone(),
            client,
        })
    }

    async fn request(&self, system: &str, prompt: &str, temperature: f64) -> Result<String, Error> {
        let body = api::ChatRequest {
            model: &self.model,
            messages: vec![api::Message::system(system), api::Message::user(prompt)],
            temperature,
        };

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        let resp = api::map_status(resp).await?;
        let bytes = resp.bytes().await.map_err(request_error)?;
        let parsed: api::ChatResponse = serde_json::from_slice(&bytes)?;

        parsed.into_content()
    }
}

impl Completion for Client {
    fn complete<'a>(&'a self, system: &'a str, prompt: &'a str, temperature: f64)
        -> CompletionFuture<'a> {
        Box::pin(self.request(system, prompt, temperature))
    }
}

fn request_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Generation("request timed out".to_string())
    } else {
        Error::Generation(err.to_string())
    }
}
