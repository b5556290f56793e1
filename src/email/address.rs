/// A (display name, address) pair used in From/To/Cc/Bcc fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    pub name: String,
    pub email: String,
}

impl Mailbox {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Mailbox with an empty display name
    pub fn bare(email: impl Into<String>) -> Self {
        Self::new(String::new(), email)
    }
}

/// Turns bare addresses into mailboxes, one per input and in input order.
/// Duplicates are kept and nothing is validated; bad addresses fail at send time.
pub fn mailboxes<S: AsRef<str>>(emails: &[S]) -> Vec<Mailbox> {
    emails
        .iter()
        .map(|email| Mailbox::bare(email.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_and_duplicates() {
        let list = mailboxes(&["b@example.com", "a@example.com", "b@example.com"]);
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].email, "b@example.com");
        assert_eq!(list[1].email, "a@example.com");
        assert_eq!(list[2].email, "b@example.com");
        assert!(list.iter().all(|m| m.name.is_empty()));
    }

    #[test]
    fn test_malformed_passed_through() {
        let list = mailboxes(&["not an address".to_string()]);
        assert_eq!(list, vec![Mailbox::bare("not an address")]);
    }

    #[test]
    fn test_empty() {
        let list = mailboxes::<String>(&[]);
        assert!(list.is_empty());
    }
}
