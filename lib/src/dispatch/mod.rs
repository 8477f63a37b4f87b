//! Sending drafted emails through a mail transport.
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::email::{self, DispatchRequest, DispatchResult};
use crate::Error;

mod smtp;

pub use smtp::SmtpTransport;

pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<String, Error>> + Send + 'a>>;

/// A file to attach, read from `path` and named `filename` in the email
#[derive(Clone, Debug, PartialEq)]
pub struct AttachmentRef {
    pub filename: String,
    pub path: PathBuf,
}

/// Fully shaped email handed to a transport
#[derive(Clone, Debug, PartialEq)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<AttachmentRef>,
}

/// Delivers an email and returns the message ID it was sent under.
pub trait Transport: Send + Sync {
    fn send<'a>(&'a self, email: &'a OutgoingEmail) -> TransportFuture<'a>;
}

pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Validate, shape and send one email.
    ///
    /// The request's staged attachments are released before this returns,
    /// whatever the outcome.
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchResult, Error> {
        let DispatchRequest {
            recipients,
            subject,
            body,
            attachments,
        } = request;

        if recipients.trim().is_empty() || subject.trim().is_empty() || body.trim().is_empty() {
            return Err(Error::Validation(
                "Recipients, subject, and body are required".to_string(),
            ));
        }

        let email = OutgoingEmail {
            to: email::parse_recipients(&recipients)?,
            subject,
            html: email::render_html(&body),
            attachments: attachments
                .iter()
                .map(|f| AttachmentRef {
                    filename: f.original_name.clone(),
                    path: f.stored_path.clone(),
                })
                .collect(),
        };

        log::info!(
            "Sending \"{}\" to {} recipient(s) with {} attachment(s)",
            email.subject,
            email.to.len(),
            email.attachments.len()
        );

        let sent = tokio::time::timeout(self.timeout, self.transport.send(&email)).await;

        let attachments_count = attachments.len();
        attachments.release().await;

        match sent {
            Ok(Ok(message_id)) => {
                log::info!("Sent {}", message_id);
                Ok(DispatchResult {
                    message_id,
                    attachments_count,
                })
            }
            Ok(Err(e)) => {
                log::error!("Failed to send email: {}", e);
                Err(e)
            }
            Err(_) => {
                log::error!("Mail transport timed out");
                Err(Error::Dispatch(format!(
                    "mail transport timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{AttachmentStore, StagedBatch};
    use std::path::Path;
    use std::sync::Mutex;

    /// Records sent emails and whether each attachment existed at send time
    struct Recorder {
        fail_with: Option<Error>,
        delay: Option<Duration>,
        sent: Mutex<Vec<(OutgoingEmail, Vec<bool>)>>,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                fail_with: None,
                delay: None,
                sent: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: Error) -> Arc<Self> {
            Arc::new(Self {
                fail_with: Some(err),
                delay: None,
                sent: Mutex::new(Vec::new()),
            })
        }

        fn hanging() -> Arc<Self> {
            Arc::new(Self {
                fail_with: None,
                delay: Some(Duration::from_secs(3600)),
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    impl Transport for Recorder {
        fn send<'a>(&'a self, email: &'a OutgoingEmail) -> TransportFuture<'a> {
            let present = email.attachments.iter().map(|a| a.path.exists()).collect();
            self.sent.lock().unwrap().push((email.clone(), present));

            Box::pin(async move {
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }

                match self.fail_with {
                    Some(ref e) => Err(e.clone()),
                    None => Ok(format!("<{}@example.com>", self.sent.lock().unwrap().len())),
                }
            })
        }
    }

    fn count_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    async fn staged(store: &AttachmentStore, names: &[&str]) -> StagedBatch {
        let mut batch = StagedBatch::new();
        for name in names {
            batch.push(store.stage_bytes(name, name.as_bytes()).await.unwrap());
        }
        batch
    }

    fn request(recipients: &str, subject: &str, body: &str, attachments: StagedBatch) -> DispatchRequest {
        DispatchRequest {
            recipients: recipients.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            attachments,
        }
    }

    #[tokio::test]
    async fn sends_and_releases_attachments() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AttachmentStore::new(tmp.path(), 1024);
        let recorder = Recorder::new();
        let dispatcher = Dispatcher::new(recorder.clone(), Duration::from_secs(30));

        let batch = staged(&store, &["cv.pdf", "letter.docx"]).await;
        let result = dispatcher
            .dispatch(request("a@x.com, b@y.com", "Thank you", "Hi,\nThanks", batch))
            .await
            .unwrap();

        assert_eq!(result.attachments_count, 2);
        assert!(!result.message_id.is_empty());
        assert_eq!(count_files(tmp.path()), 0);

        let sent = recorder.sent.lock().unwrap();
        let (email, present) = &sent[0];
        assert_eq!(email.to, vec!["a@x.com", "b@y.com"]);
        assert_eq!(email.subject, "Thank you");
        assert_eq!(email.html, "Hi,<br>Thanks");
        assert_eq!(email.attachments[0].filename, "cv.pdf");
        assert_eq!(email.attachments[1].filename, "letter.docx");
        assert_eq!(present, &vec![true, true]);
    }

    #[tokio::test]
    async fn no_attachments() {
        let dispatcher = Dispatcher::new(Recorder::new(), Duration::from_secs(30));

        let result = dispatcher
            .dispatch(request("a@x.com", "Thank you", "Body", StagedBatch::new()))
            .await
            .unwrap();

        assert_eq!(result.attachments_count, 0);
        assert!(!result.message_id.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_still_releases() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AttachmentStore::new(tmp.path(), 1024);
        let err = Error::Dispatch("535 authentication failed".to_string());
        let dispatcher = Dispatcher::new(Recorder::failing(err.clone()), Duration::from_secs(30));

        let batch = staged(&store, &["a.txt", "b.txt", "c.txt"]).await;
        let result = dispatcher.dispatch(request("a@x.com", "S", "B", batch)).await;

        assert_eq!(result, Err(err));
        assert_eq!(count_files(tmp.path()), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_timeout_releases() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AttachmentStore::new(tmp.path(), 1024);
        let dispatcher = Dispatcher::new(Recorder::hanging(), Duration::from_secs(10));

        let batch = staged(&store, &["a.txt"]).await;
        let result = dispatcher.dispatch(request("a@x.com", "S", "B", batch)).await;

        match result {
            Err(Error::Dispatch(msg)) => assert!(msg.contains("timed out")),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(count_files(tmp.path()), 0);
    }

    #[tokio::test]
    async fn missing_fields_rejected_and_released() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AttachmentStore::new(tmp.path(), 1024);
        let recorder = Recorder::new();
        let dispatcher = Dispatcher::new(recorder.clone(), Duration::from_secs(30));

        let cases = [("", "S", "B"), ("a@x.com", " ", "B"), ("a@x.com", "S", ""), (" , ", "S", "B")];

        for (recipients, subject, body) in cases.iter() {
            let batch = staged(&store, &["a.txt"]).await;
            let result = dispatcher.dispatch(request(recipients, subject, body, batch)).await;

            assert!(matches!(result, Err(Error::Validation(_))));
            assert_eq!(count_files(tmp.path()), 0);
        }

        assert!(recorder.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn already_removed_attachment_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AttachmentStore::new(tmp.path(), 1024);
        let dispatcher = Dispatcher::new(Recorder::new(), Duration::from_secs(30));

        let batch = staged(&store, &["a.txt", "b.txt"]).await;
        let first = batch.iter().next().unwrap().stored_path.clone();
        std::fs::remove_file(&first).unwrap();

        let result = dispatcher.dispatch(request("a@x.com", "S", "B", batch)).await.unwrap();

        assert_eq!(result.attachments_count, 2);
        assert_eq!(count_files(tmp.path()), 0);
    }
}
