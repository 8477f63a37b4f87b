//! Compose-and-send state for one form session.
//!
//! ```text
//! idle ──generate──▶ generating ──ok──▶ drafted ──send──▶ sending ──ok──▶ idle (reset)
//!                        │                 ▲                 │
//!                        └──err──▶ idle ◀──┴───── drafted ◀──┴──err
//! ```
//!
//! A failed generation returns to `drafted` if an earlier draft exists.
use std::path::PathBuf;

use draftmail::api::{ServerResult, SEND_SUCCESS_MESSAGE};
use draftmail::email::GeneratedEmail;

use crate::error::Error;

pub const PROMPT_REQUIRED: &str = "Please enter a prompt for the email";
pub const FIELDS_REQUIRED: &str = "Please fill in all required fields";
pub const GENERATED: &str = "Email generated successfully!";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    Idle,
    Generating,
    Drafted,
    Sending,
}

/// Single-line outcome of the last action
#[derive(Clone, Debug, PartialEq)]
pub enum Status {
    Success(String),
    Error(String),
}

/// What gets posted to `/send`
#[derive(Clone, Debug, PartialEq)]
pub struct SendPayload {
    pub recipients: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct Session {
    phase: Phase,
    recipients: String,
    prompt: String,
    draft: GeneratedEmail,
    attachments: Vec<PathBuf>,
    status: Option<Status>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            recipients: String::new(),
            prompt: String::new(),
            draft: GeneratedEmail::default(),
            attachments: Vec::new(),
            status: None,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn draft(&self) -> &GeneratedEmail {
        &self.draft
    }

    pub fn recipients(&self) -> &str {
        &self.recipients
    }

    pub fn attachments(&self) -> &[PathBuf] {
        &self.attachments
    }

    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Generating || self.phase == Phase::Sending
    }

    pub fn set_recipients(&mut self, recipients: impl Into<String>) {
        self.recipients = recipients.into();
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn edit_subject(&mut self, subject: impl Into<String>) -> Result<(), Error> {
        self.ensure_idle()?;
        self.draft.subject = subject.into();
        Ok(())
    }

    pub fn edit_body(&mut self, body: impl Into<String>) -> Result<(), Error> {
        self.ensure_idle()?;
        self.draft.body = body.into();
        Ok(())
    }

    /// Attachments stay local until `begin_send`.
    pub fn add_attachment(&mut self, path: impl Into<PathBuf>) -> Result<(), Error> {
        self.ensure_idle()?;
        self.attachments.push(path.into());
        Ok(())
    }

    pub fn remove_attachment(&mut self, index: usize) -> Result<Option<PathBuf>, Error> {
        self.ensure_idle()?;

        if index < self.attachments.len() {
            Ok(Some(self.attachments.remove(index)))
        } else {
            Ok(None)
        }
    }

    /// Start a generation. Returns the prompt to send.
    pub fn begin_generate(&mut self) -> Result<String, Error> {
        self.ensure_idle()?;

        if self.prompt.trim().is_empty() {
            return Err(self.invalid(PROMPT_REQUIRED));
        }

        self.phase = Phase::Generating;
        self.status = None;

        Ok(self.prompt.clone())
    }

    pub fn finish_generate(&mut self, result: Result<GeneratedEmail, Error>) -> Result<(), Error> {
        if self.phase != Phase::Generating {
            return Err(Error::Unexpected("no generation in progress".to_string()));
        }

        match result {
            Ok(email) => {
                self.draft = email;
                self.phase = Phase::Drafted;
                self.status = Some(Status::Success(GENERATED.to_string()));
                Ok(())
            }
            Err(e) => {
                self.phase = self.resting_phase();
                self.status = Some(Status::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Start a send. Returns the payload to post.
    pub fn begin_send(&mut self) -> Result<SendPayload, Error> {
        self.ensure_idle()?;

        if self.recipients.trim().is_empty() || self.draft.subject.is_empty() || self.draft.body.is_empty() {
            return Err(self.invalid(FIELDS_REQUIRED));
        }

        self.phase = Phase::Sending;
        self.status = None;

        Ok(SendPayload {
            recipients: self.recipients.clone(),
            subject: self.draft.subject.clone(),
            body: self.draft.body.clone(),
            attachments: self.attachments.clone(),
        })
    }

    /// On success the whole form is reset; on failure the draft is kept.
    pub fn finish_send(&mut self, result: Result<ServerResult, Error>) -> Result<(), Error> {
        if self.phase != Phase::Sending {
            return Err(Error::Unexpected("no send in progress".to_string()));
        }

        match result {
            Ok(resp) => {
                let message = resp.message.unwrap_or_else(|| SEND_SUCCESS_MESSAGE.to_string());

                *self = Session {
                    status: Some(Status::Success(message)),
                    ..Default::default()
                };
                Ok(())
            }
            Err(e) => {
                self.phase = Phase::Drafted;
                self.status = Some(Status::Error(e.to_string()));
                Err(e)
            }
        }
    }

    fn ensure_idle(&self) -> Result<(), Error> {
        if self.is_busy() {
            Err(Error::Busy)
        } else {
            Ok(())
        }
    }

    fn invalid(&mut self, msg: &str) -> Error {
        self.status = Some(Status::Error(msg.to_string()));
        Error::Invalid(msg.to_string())
    }

    fn has_draft(&self) -> bool {
        !self.draft.subject.is_empty() || !self.draft.body.is_empty()
    }

    fn resting_phase(&self) -> Phase {
        if self.has_draft() {
            Phase::Drafted
        } else {
            Phase::Idle
        }
    }
}
