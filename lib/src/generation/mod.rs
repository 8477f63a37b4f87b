//! Email drafting through a hosted completion API.
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::email::{GeneratedEmail, DEFAULT_SUBJECT};
use crate::Error;

pub mod api;
mod client;

pub use client::{Client, Completion, CompletionFuture};

pub const SYSTEM_PROMPT: &str = "You are a professional email writer. Generate a \
well-structured, professional email based on the user's prompt. Create a specific, relevant \
subject line and a professional email body. Format the response as JSON with 'subject' and \
'body' fields. The subject should be specific and relevant to the email content. The body \
should be a clean, professional email without any labels like 'Subject:' or 'Body:' - just \
the actual email content.";

pub const TEMPERATURE: f64 = 0.7;

/// Outcome of interpreting a completion as an email.
#[derive(Debug, PartialEq)]
pub enum Parsed {
    /// Completion was a JSON object with a usable body
    Structured(GeneratedEmail),
    /// Completion was free text; it became the body under the default subject
    Degraded(GeneratedEmail),
}

impl Parsed {
    pub fn into_email(self) -> GeneratedEmail {
        match self {
            Parsed::Structured(email) | Parsed::Degraded(email) => email,
        }
    }
}

#[derive(Deserialize)]
struct RawEmail {
    #[serde(default)]
    subject: Option<String>,
    body: String,
}

/// Interpret completion text as `{subject, body}`. Never fails.
pub fn parse_completion(text: &str) -> Parsed {
    let candidate = strip_code_fence(text.trim());

    match serde_json::from_str::<RawEmail>(candidate) {
        Ok(raw) if !raw.body.trim().is_empty() => {
            let subject = raw
                .subject
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());

            Parsed::Structured(GeneratedEmail {
                subject,
                body: raw.body,
            })
        }
        _ => Parsed::Degraded(GeneratedEmail {
            subject: DEFAULT_SUBJECT.to_string(),
            body: text.to_string(),
        }),
    }
}

/// Models often wrap JSON in a ```json fence
fn strip_code_fence(text: &str) -> &str {
    let inner = match text.strip_prefix("```") {
        Some(rest) => rest,
        None => return text,
    };

    let inner = match inner.strip_suffix("```") {
        Some(inner) => inner,
        None => return text,
    };

    // Drop the language tag on the opening line
    match inner.find('\n') {
        Some(pos) => inner[pos + 1..].trim(),
        None => inner.trim(),
    }
}

/// Drafts emails from natural-language prompts.
pub struct Generator {
    completion: Arc<dyn Completion>,
    timeout: Duration,
}

impl Generator {
    pub fn new(completion: Arc<dyn Completion>, timeout: Duration) -> Self {
        Self {
            completion,
            timeout,
        }
    }

    /// Draft an email for `prompt`. The caller is responsible for rejecting
    /// blank prompts.
    pub async fn generate(&self, prompt: &str) -> Result<GeneratedEmail, Error> {
        let call = self.completion.complete(SYSTEM_PROMPT, prompt, TEMPERATURE);

        let text = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::Generation(format!(
                    "completion timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        if text.trim().is_empty() {
            return Err(Error::Generation("completion was empty".to_string()));
        }

        match parse_completion(&text) {
            Parsed::Structured(email) => Ok(email),
            Parsed::Degraded(email) => {
                log::warn!("Completion was not structured JSON, using it as the body");
                Ok(email)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns a canned completion and records what it was asked
    struct Canned {
        response: Result<String, Error>,
        delay: Option<Duration>,
        calls: Mutex<Vec<(String, String, f64)>>,
    }

    impl Canned {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(text.to_string()),
                delay: None,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn err(err: Error) -> Arc<Self> {
            Arc::new(Self {
                response: Err(err),
                delay: None,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                response: Ok("{}".to_string()),
                delay: Some(delay),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    impl Completion for Canned {
        fn complete<'a>(&'a self, system: &'a str, prompt: &'a str, temperature: f64)
            -> CompletionFuture<'a> {
            self.calls
                .lock()
                .unwrap()
                .push((system.to_string(), prompt.to_string(), temperature));

            Box::pin(async move {
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                self.response.clone()
            })
        }
    }

    fn generator(completion: Arc<Canned>) -> Generator {
        Generator::new(completion, Duration::from_secs(30))
    }

    #[tokio::test]
    async fn structured_completion() {
        let canned = Canned::ok(r#"{"subject": "Thank you", "body": "Dear Ann,\n\nThanks."}"#);
        let email = generator(canned.clone()).generate("follow-up after interview").await.unwrap();

        assert_eq!(email.subject, "Thank you");
        assert_eq!(email.body, "Dear Ann,\n\nThanks.");

        let calls = canned.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, SYSTEM_PROMPT);
        assert_eq!(calls[0].1, "follow-up after interview");
        assert_eq!(calls[0].2, 0.7);
    }

    #[tokio::test]
    async fn plain_text_degrades() {
        let email = generator(Canned::ok("Hello there")).generate("greet").await.unwrap();

        assert_eq!(
            email,
            GeneratedEmail {
                subject: DEFAULT_SUBJECT.to_string(),
                body: "Hello there".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn upstream_failure_propagates() {
        let err = Error::Generation("rate limited (429): slow down".to_string());
        let result = generator(Canned::err(err.clone())).generate("anything").await;

        assert_eq!(result, Err(err));
    }

    #[tokio::test]
    async fn empty_completion_is_an_error() {
        let result = generator(Canned::ok("  \n")).generate("anything").await;
        assert!(matches!(result, Err(Error::Generation(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_completion_times_out() {
        let generator = Generator::new(Canned::slow(Duration::from_secs(60)), Duration::from_secs(5));

        match generator.generate("anything").await {
            Err(Error::Generation(msg)) => assert!(msg.contains("timed out")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn subject_and_body_never_empty() {
        let completions = [
            r#"{"subject": "Hi", "body": "Body"}"#,
            r#"{"subject": "", "body": "Body"}"#,
            r#"{"body": "Body"}"#,
            r#"{"subject": "Hi", "body": ""}"#,
            r#"{"subject": "Hi"}"#,
            r#"["not", "an", "object"]"#,
            "Subject: Hi\n\nBody",
            "```json\n{\"subject\": \"Hi\", \"body\": \"Body\"}\n```",
        ];

        for text in completions.iter() {
            let email = generator(Canned::ok(text)).generate("prompt").await.unwrap();
            assert!(!email.subject.is_empty(), "empty subject for {}", text);
            assert!(!email.body.is_empty(), "empty body for {}", text);
        }
    }

    #[test]
    fn fenced_json_is_structured() {
        let parsed = parse_completion("```json\n{\"subject\": \"Hi\", \"body\": \"Body\"}\n```");

        assert_eq!(
            parsed,
            Parsed::Structured(GeneratedEmail {
                subject: "Hi".to_string(),
                body: "Body".to_string(),
            })
        );
    }

    #[test]
    fn missing_subject_uses_default() {
        let parsed = parse_completion(r#"{"body": "Just the body"}"#);

        assert_eq!(
            parsed,
            Parsed::Structured(GeneratedEmail {
                subject: DEFAULT_SUBJECT.to_string(),
                body: "Just the body".to_string(),
            })
        );
    }

    #[test]
    fn empty_body_degrades_to_raw_text() {
        let raw = r#"{"subject": "Hi", "body": ""}"#;

        assert_eq!(
            parse_completion(raw),
            Parsed::Degraded(GeneratedEmail {
                subject: DEFAULT_SUBJECT.to_string(),
                body: raw.to_string(),
            })
        );
    }

    #[test]
    fn unterminated_fence_degrades() {
        let raw = "```json\n{\"subject\": \"Hi\"";
        assert!(matches!(parse_completion(raw), Parsed::Degraded(_)));
    }
}
