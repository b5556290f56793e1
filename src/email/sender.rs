use std::fmt;

const DEFAULT_DISPLAY_NAME: &str = "noreply";

/// Identity used to authenticate against the mail server and to fill
/// the "From" header of outgoing messages.
#[derive(Clone, PartialEq, Eq)]
pub struct Sender {
    email: String,
    secret: String,
    display_name: String,
}

impl Sender {
    /// The secret is usually an app password, not the account password.
    pub fn new(email: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            secret: secret.into(),
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("email", &self.email)
            .field("secret", &"<redacted>")
            .field("display_name", &self.display_name)
            .finish()
    }
}
