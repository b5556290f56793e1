//! Provider-agnostic email composition and SMTP delivery.
//!
//! ```no_run
//! use emails::{Attachment, Message, Sender, Server};
//!
//! # async fn run() -> Result<(), emails::EnvelopeError> {
//! let server = Server::new(Sender::new("bot@gmail.com", "app-password"));
//! let message = Message::new(["user@example.com"], "<h1>Report</h1>")
//!     .subject("Weekly report")
//!     .html(true)
//!     .attachment(Attachment::from_bytes("report.csv", "a,b\n1,2\n"));
//!
//! let sent = server.try_send_default(message).await?;
//! # let _ = sent;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod email;
pub mod error;
pub mod server;

pub use config::{ProviderConfig, SenderConfig, ServerConfig};
pub use email::address::{mailboxes, Mailbox};
pub use email::envelope::{Body, Envelope, EnvelopeAttachment};
pub use email::message::{Attachment, Message};
pub use email::providers::{DefaultProviders, ProviderInfo};
pub use email::sender::Sender;
pub use email::smtp::{SmtpTransport, SmtpTransportFactory};
pub use email::transport::{SecurityMode, Transport, TransportFactory};
pub use error::{EnvelopeError, SendError, TransportError};
pub use server::Server;
pub use tokio_util::sync::CancellationToken;
