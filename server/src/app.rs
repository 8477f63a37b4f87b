use std::sync::Arc;

use draftmail::dispatch::{Dispatcher, SmtpTransport};
use draftmail::generation::{self, Generator};
use draftmail::storage::AttachmentStore;
use draftmail::{Config, Error};

/// Services shared by all requests, built once at startup
pub struct App {
    pub generator: Generator,
    pub dispatcher: Dispatcher,
    pub store: AttachmentStore,
    pub max_attachments: usize,
}

impl App {
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let completion = generation::Client::new(&config.completion)?;
        let transport = SmtpTransport::new(&config.smtp)?;

        Ok(Self {
            generator: Generator::new(Arc::new(completion), config.completion.timeout()),
            dispatcher: Dispatcher::new(Arc::new(transport), config.smtp.timeout()),
            store: AttachmentStore::new(&config.staging_dir, config.max_attachment_size),
            max_attachments: config.max_attachments,
        })
    }

    /// Largest multipart body `POST /send` accepts
    pub fn max_send_body(&self) -> u64 {
        self.store.max_file_size() * self.max_attachments as u64 + super::config::MULTIPART_OVERHEAD
    }
}
