use std::fmt;
use std::io::Cursor;

use tokio::io::AsyncRead;

const DEFAULT_SUBJECT: &str = "noreply";

/// A named file pinned to a message.
///
/// The stream is read once, to the end, while the envelope is built and is
/// dropped right after.
pub struct Attachment {
    pub(crate) name: String,
    pub(crate) content: Box<dyn AsyncRead + Send + Unpin>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, content: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            name: name.into(),
            content: Box::new(content),
        }
    }

    /// Attachment backed by an in-memory buffer
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(name, Cursor::new(bytes.into()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A plain text or HTML email request with optional attachments.
///
/// Defaults: subject "noreply", plain text body, no Cc/Bcc, no attachments.
#[derive(Debug)]
pub struct Message {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn new<I, S>(to: I, body: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            to: to.into_iter().map(Into::into).collect(),
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: DEFAULT_SUBJECT.to_string(),
            body: body.into(),
            is_html: false,
            attachments: Vec::new(),
        }
    }

    pub fn cc<I, S>(mut self, cc: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cc = cc.into_iter().map(Into::into).collect();
        self
    }

    pub fn bcc<I, S>(mut self, bcc: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bcc = bcc.into_iter().map(Into::into).collect();
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Interpret the body as HTML instead of plain text
    pub fn html(mut self, is_html: bool) -> Self {
        self.is_html = is_html;
        self
    }

    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}
