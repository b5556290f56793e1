use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::email::envelope::Envelope;
use crate::email::message::Message;
use crate::email::providers::ProviderInfo;
use crate::email::sender::Sender;
use crate::email::smtp::SmtpTransportFactory;
use crate::email::transport::{SecurityMode, Transport, TransportFactory};
use crate::error::{EnvelopeError, SendError, TransportError};

/// An SMTP server that sends messages on behalf of one sender.
///
/// Holds no mutable state: every delivery builds its own envelope and opens
/// its own connection, so one `Server` can be shared across tasks.
#[derive(Clone)]
pub struct Server {
    sender: Sender,
    provider: ProviderInfo,
    transport: Arc<dyn TransportFactory>,
}

impl Server {
    /// Server for `sender` on the Gmail preset.
    pub fn new(sender: Sender) -> Self {
        Self::with_provider(sender, ProviderInfo::default())
    }

    pub fn with_provider(sender: Sender, provider: ProviderInfo) -> Self {
        Self {
            sender,
            provider,
            transport: Arc::new(SmtpTransportFactory::new()),
        }
    }

    /// Replace the transport used for deliveries.
    pub fn with_transport(mut self, transport: impl TransportFactory + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    pub fn provider(&self) -> &ProviderInfo {
        &self.provider
    }

    /// Send `message`, reporting why delivery failed.
    ///
    /// Steps run strictly as connect, authenticate, send, disconnect. The first
    /// failure or a fired `token` skips everything after it. The connection is
    /// released on every exit path.
    pub async fn send(&self, message: Message, token: &CancellationToken) -> Result<(), SendError> {
        let envelope = Envelope::build(&self.sender, message).await?;

        let mut transport = self.transport.create();
        let result = self.deliver(transport.as_mut(), &envelope, token).await;
        drop(transport);

        match &result {
            Ok(()) => tracing::info!(
                "Delivered '{}' to {} recipient(s) via {}:{}",
                envelope.subject,
                envelope.recipients().count(),
                self.provider.host(),
                self.provider.port()
            ),
            Err(e) => tracing::warn!(
                "Delivery of '{}' via {}:{} failed: {}",
                envelope.subject,
                self.provider.host(),
                self.provider.port(),
                e
            ),
        }
        result
    }

    /// Best-effort send: `Ok(true)` when delivered, `Ok(false)` on any
    /// connection, authentication, transfer or cancellation failure.
    ///
    /// Only envelope errors (an unreadable attachment) are returned as `Err`.
    pub async fn try_send(
        &self,
        message: Message,
        token: &CancellationToken,
    ) -> Result<bool, EnvelopeError> {
        match self.send(message, token).await {
            Ok(()) => Ok(true),
            Err(SendError::Envelope(e)) => Err(e),
            Err(_) => Ok(false),
        }
    }

    /// `try_send` without a cancellation signal.
    pub async fn try_send_default(&self, message: Message) -> Result<bool, EnvelopeError> {
        self.try_send(message, &CancellationToken::new()).await
    }

    async fn deliver(
        &self,
        transport: &mut dyn Transport,
        envelope: &Envelope,
        token: &CancellationToken,
    ) -> Result<(), SendError> {
        let (host, port) = (self.provider.host(), self.provider.port());

        tracing::debug!("SMTP connect {}:{}", host, port);
        cancellable(token, transport.connect(host, port, SecurityMode::Auto)).await?;

        tracing::debug!("SMTP authenticate as {}", self.sender.email());
        cancellable(
            token,
            transport.authenticate(self.sender.email(), self.sender.secret()),
        )
        .await?;

        tracing::debug!("SMTP send '{}'", envelope.subject);
        cancellable(token, transport.send(envelope)).await?;

        tracing::debug!("SMTP disconnect");
        cancellable(token, transport.disconnect(true)).await?;

        Ok(())
    }
}

/// Run one step unless `token` fires first.
async fn cancellable<F>(token: &CancellationToken, step: F) -> Result<(), SendError>
where
    F: Future<Output = Result<(), TransportError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(SendError::Cancelled),
        result = step => result.map_err(SendError::from),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::email::message::Attachment;
    use crate::email::providers::DefaultProviders;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Step {
        Connect,
        Authenticate,
        Send,
        Disconnect,
    }

    /// Records every call; fails or hangs at a chosen step.
    #[derive(Clone, Default)]
    struct FakeFactory {
        fail_at: Option<Step>,
        hang_at: Option<Step>,
        fail_subject: Option<String>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl FakeFactory {
        fn failing_at(step: Step) -> Self {
            Self {
                fail_at: Some(step),
                ..Self::default()
            }
        }

        fn hanging_at(step: Step) -> Self {
            Self {
                hang_at: Some(step),
                ..Self::default()
            }
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    impl TransportFactory for FakeFactory {
        fn create(&self) -> Box<dyn Transport> {
            Box::new(FakeTransport {
                script: self.clone(),
            })
        }
    }

    struct FakeTransport {
        script: FakeFactory,
    }

    impl FakeTransport {
        async fn step(&self, step: Step, entry: String) -> Result<(), TransportError> {
            self.script.log.lock().unwrap().push(entry);
            tokio::time::sleep(Duration::from_millis(5)).await;
            if self.script.hang_at == Some(step) {
                std::future::pending::<()>().await;
            }
            if self.script.fail_at == Some(step) {
                return Err(match step {
                    Step::Connect => TransportError::Connection("host unreachable".into()),
                    Step::Authenticate => TransportError::Authentication("535 rejected".into()),
                    Step::Send | Step::Disconnect => TransportError::Transfer("554 failed".into()),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn connect(
            &mut self,
            host: &str,
            port: u16,
            security: SecurityMode,
        ) -> Result<(), TransportError> {
            self.step(Step::Connect, format!("connect {}:{} {:?}", host, port, security))
                .await
        }

        async fn authenticate(&mut self, user: &str, secret: &str) -> Result<(), TransportError> {
            self.step(Step::Authenticate, format!("authenticate {}:{}", user, secret))
                .await
        }

        async fn send(&mut self, envelope: &Envelope) -> Result<(), TransportError> {
            let entry = format!(
                "send '{}' with {} attachment(s)",
                envelope.subject,
                envelope.attachments.len()
            );
            if self.script.fail_subject.as_deref() == Some(envelope.subject.as_str()) {
                self.script.log.lock().unwrap().push(entry);
                tokio::time::sleep(Duration::from_millis(5)).await;
                return Err(TransportError::Transfer("550 mailbox unavailable".into()));
            }
            self.step(Step::Send, entry).await
        }

        async fn disconnect(&mut self, quit: bool) -> Result<(), TransportError> {
            self.step(Step::Disconnect, format!("disconnect {}", quit)).await
        }
    }

    impl Drop for FakeTransport {
        fn drop(&mut self) {
            self.script.log.lock().unwrap().push("dropped".to_string());
        }
    }

    fn server(factory: &FakeFactory) -> Server {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        Server::new(Sender::new("bot@example.com", "app-pw")).with_transport(factory.clone())
    }

    fn message() -> Message {
        Message::new(["user@example.com"], "hello").subject("Greetings")
    }

    #[test]
    fn test_default_provider_is_gmail() {
        let server = Server::new(Sender::new("bot@example.com", "pw"));
        assert_eq!(server.provider().host(), "smtp.gmail.com");
        assert_eq!(server.provider().port(), 587);
    }

    #[tokio::test]
    async fn test_success_runs_steps_in_order() {
        let factory = FakeFactory::default();
        let sent = server(&factory).try_send_default(message()).await.unwrap();

        assert!(sent);
        assert_eq!(
            factory.log(),
            vec![
                "connect smtp.gmail.com:587 Auto",
                "authenticate bot@example.com:app-pw",
                "send 'Greetings' with 0 attachment(s)",
                "disconnect true",
                "dropped",
            ]
        );
    }

    #[tokio::test]
    async fn test_success_with_two_attachments() {
        let factory = FakeFactory::default();
        let message = message()
            .attachment(Attachment::from_bytes("a.txt", "a"))
            .attachment(Attachment::from_bytes("b.csv", "b,c"));
        let sent = server(&factory)
            .try_send(message, &CancellationToken::new())
            .await
            .unwrap();

        assert!(sent);
        assert!(factory
            .log()
            .contains(&"send 'Greetings' with 2 attachment(s)".to_string()));
    }

    #[tokio::test]
    async fn test_custom_provider() {
        let factory = FakeFactory::default();
        let server = Server::with_provider(
            Sender::new("bot@example.com", "pw"),
            DefaultProviders::yandex(),
        )
        .with_transport(factory.clone());

        assert!(server.try_send_default(message()).await.unwrap());
        assert_eq!(factory.log()[0], "connect smtp.yandex.ru:465 Auto");
    }

    #[tokio::test]
    async fn test_unreachable_host_returns_false() {
        let factory = FakeFactory::failing_at(Step::Connect);
        let server = server(&factory);

        assert!(!server.try_send_default(message()).await.unwrap());
        assert_eq!(
            factory.log(),
            vec!["connect smtp.gmail.com:587 Auto", "dropped"]
        );

        let err = server
            .send(message(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::Connection(_)));
    }

    #[tokio::test]
    async fn test_rejected_credentials_returns_false() {
        let factory = FakeFactory::failing_at(Step::Authenticate);
        let server = server(&factory);

        assert!(!server.try_send_default(message()).await.unwrap());
        let log = factory.log();
        assert_eq!(log.len(), 3);
        assert!(log[1].starts_with("authenticate"));
        assert_eq!(log[2], "dropped");

        let err = server
            .send(message(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_transfer_failure_skips_disconnect() {
        let factory = FakeFactory::failing_at(Step::Send);
        let err = server(&factory)
            .send(message(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SendError::Transfer(_)));
        assert!(!factory.log().iter().any(|e| e.starts_with("disconnect")));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let factory = FakeFactory::default();
        let token = CancellationToken::new();
        token.cancel();

        let server = server(&factory);
        assert!(!server.try_send(message(), &token).await.unwrap());
        assert_eq!(factory.log(), vec!["dropped"]);

        let err = server.send(message(), &token).await.unwrap_err();
        assert!(matches!(err, SendError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_during_send() {
        let factory = FakeFactory::hanging_at(Step::Send);
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = server(&factory).send(message(), &token).await.unwrap_err();

        assert!(matches!(err, SendError::Cancelled));
        let log = factory.log();
        assert!(log[2].starts_with("send"));
        assert_eq!(log.last().map(String::as_str), Some("dropped"));
        assert!(!log.iter().any(|e| e.starts_with("disconnect")));
    }

    #[tokio::test]
    async fn test_unreadable_attachment_is_propagated() {
        struct Broken;

        impl tokio::io::AsyncRead for Broken {
            fn poll_read(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
                _buf: &mut tokio::io::ReadBuf<'_>,
            ) -> std::task::Poll<std::io::Result<()>> {
                std::task::Poll::Ready(Err(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "locked",
                )))
            }
        }

        let factory = FakeFactory::default();
        let message = message().attachment(Attachment::new("locked.bin", Broken));
        let result = server(&factory).try_send_default(message).await;

        assert!(matches!(result, Err(EnvelopeError::Attachment { .. })));
        assert!(factory.log().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_sends_are_independent() {
        let factory = FakeFactory {
            fail_subject: Some("bounce".to_string()),
            ..FakeFactory::default()
        };
        let server = server(&factory);
        let token = CancellationToken::new();

        let good = Message::new(["a@example.com"], "ok").subject("deliver");
        let bad = Message::new(["b@example.com"], "no").subject("bounce");
        let (good, bad) = tokio::join!(server.try_send(good, &token), server.try_send(bad, &token));

        assert!(good.unwrap());
        assert!(!bad.unwrap());

        let log = factory.log();
        assert_eq!(log.iter().filter(|e| e.starts_with("connect")).count(), 2);
        assert_eq!(log.iter().filter(|e| *e == "disconnect true").count(), 1);
        assert_eq!(log.iter().filter(|e| *e == "dropped").count(), 2);
    }
}
