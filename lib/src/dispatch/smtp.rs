use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use uuid::Uuid;

use super::{OutgoingEmail, Transport, TransportFuture};
use crate::config::SmtpConfig;
use crate::Error;

/// SMTP relay transport using lettre
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpTransport {
    pub fn new(config: &SmtpConfig) -> Result<Self, Error> {
        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        };

        let mut builder = builder
            .map_err(|e| Error::Config(format!("failed to create SMTP transport: {}", e)))?
            .port(config.port)
            .timeout(Some(config.timeout()));

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        let from: Mailbox = config
            .sender()
            .parse()
            .map_err(|e| Error::Config(format!("invalid sender address: {}", e)))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    async fn deliver(&self, email: &OutgoingEmail) -> Result<String, Error> {
        let message_id = format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain());
        let message = build_message(&self.from, &message_id, email).await?;

        self.transport.send(message).await?;

        Ok(message_id)
    }
}

impl Transport for SmtpTransport {
    fn send<'a>(&'a self, email: &'a OutgoingEmail) -> TransportFuture<'a> {
        Box::pin(self.deliver(email))
    }
}

/// Build the MIME message: an HTML part followed by one part per attachment.
async fn build_message(from: &Mailbox, message_id: &str, email: &OutgoingEmail)
    -> Result<Message, Error> {
    let mut builder = Message::builder()
        .from(from.clone())
        .subject(email.subject.as_str())
        .message_id(Some(message_id.to_string()));

    for to in &email.to {
        let mailbox: Mailbox = to
            .parse()
            .map_err(|e| Error::Dispatch(format!("invalid recipient '{}': {}", to, e)))?;
        builder = builder.to(mailbox);
    }

    let mut body = MultiPart::mixed().singlepart(SinglePart::html(email.html.clone()));

    let octet_stream = ContentType::parse("application/octet-stream")
        .map_err(|e| Error::Dispatch(format!("{:?}", e)))?;

    for attachment in &email.attachments {
        let data = tokio::fs::read(&attachment.path).await.map_err(|e| {
            Error::Dispatch(format!("failed to read attachment {}: {}", attachment.filename, e))
        })?;

        body = body.singlepart(
            Attachment::new(attachment.filename.clone()).body(data, octet_stream.clone()),
        );
    }

    Ok(builder.multipart(body)?)
}
