//! Transient staging of uploaded attachments between receipt and send.
mod staging;

pub use staging::{AttachmentStore, StagedBatch, StagedFile};
