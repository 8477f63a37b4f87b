//! Email drafting and dispatch pipeline shared by the draftmail server and
//! client.
//!
//! A prompt goes to a [`generation::Generator`], which asks a completion
//! API for a `{subject, body}` draft. The edited draft, together with any
//! uploads staged in an [`storage::AttachmentStore`], is then handed to a
//! [`dispatch::Dispatcher`] for delivery over SMTP.
pub mod api;
pub mod config;
pub mod dispatch;
pub mod email;
pub mod generation;
pub mod storage;

mod error;

pub use config::Config;
pub use error::Error;
