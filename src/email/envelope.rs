use mail_builder::headers::address::Address;
use mail_builder::MessageBuilder;
use tokio::io::AsyncReadExt;

use super::address::{mailboxes, Mailbox};
use super::message::Message;
use super::sender::Sender;
use crate::error::EnvelopeError;

/// Exactly one body representation per envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    Html(String),
}

/// A file read into memory, ready for MIME embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeAttachment {
    pub name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// Transport-ready message, built fresh for every delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
    pub cc: Vec<Mailbox>,
    pub bcc: Vec<Mailbox>,
    pub subject: String,
    pub body: Body,
    pub attachments: Vec<EnvelopeAttachment>,
}

impl Envelope {
    /// Build an envelope for `message` sent by `sender`.
    ///
    /// Attachment streams are read to the end in message order and dropped.
    pub async fn build(sender: &Sender, message: Message) -> Result<Self, EnvelopeError> {
        let Message {
            to,
            cc,
            bcc,
            subject,
            body,
            is_html,
            attachments,
        } = message;

        let body = if is_html {
            Body::Html(body)
        } else {
            Body::Text(body)
        };

        let mut embedded = Vec::with_capacity(attachments.len());
        for mut attachment in attachments {
            let mut content = Vec::new();
            attachment
                .content
                .read_to_end(&mut content)
                .await
                .map_err(|source| EnvelopeError::Attachment {
                    name: attachment.name.clone(),
                    source,
                })?;

            let content_type = mime_guess::from_path(&attachment.name)
                .first_or_octet_stream()
                .essence_str()
                .to_string();

            embedded.push(EnvelopeAttachment {
                name: attachment.name,
                content_type,
                content,
            });
        }

        Ok(Self {
            from: Mailbox::new(sender.display_name(), sender.email()),
            to: mailboxes(&to[..]),
            cc: mailboxes(&cc[..]),
            bcc: mailboxes(&bcc[..]),
            subject,
            body,
            attachments: embedded,
        })
    }

    pub fn text_body(&self) -> Option<&str> {
        match &self.body {
            Body::Text(text) => Some(text),
            Body::Html(_) => None,
        }
    }

    pub fn html_body(&self) -> Option<&str> {
        match &self.body {
            Body::Html(html) => Some(html),
            Body::Text(_) => None,
        }
    }

    /// Every RCPT TO address: To, then Cc, then Bcc
    pub fn recipients(&self) -> impl Iterator<Item = &str> {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(|mailbox| mailbox.email.as_str())
    }

    /// Render RFC 5322 bytes. Bcc is left out of the headers.
    pub fn to_mime(&self) -> std::io::Result<Vec<u8>> {
        let mut builder = MessageBuilder::new()
            .from(to_address(&self.from))
            .subject(self.subject.as_str());

        if !self.to.is_empty() {
            builder = builder.to(to_address_list(&self.to));
        }
        if !self.cc.is_empty() {
            builder = builder.cc(to_address_list(&self.cc));
        }

        builder = match &self.body {
            Body::Text(text) => builder.text_body(text.as_str()),
            Body::Html(html) => builder.html_body(html.as_str()),
        };

        for attachment in &self.attachments {
            builder = builder.attachment(
                attachment.content_type.as_str(),
                attachment.name.as_str(),
                attachment.content.as_slice(),
            );
        }

        builder.write_to_vec()
    }
}

fn to_address(mailbox: &Mailbox) -> Address<'_> {
    let name = (!mailbox.name.is_empty()).then_some(mailbox.name.as_str());
    Address::new_address(name, mailbox.email.as_str())
}

fn to_address_list(list: &[Mailbox]) -> Address<'_> {
    Address::new_list(list.iter().map(to_address).collect())
}
