//! Outbound email.
//!
//! Messages are not delivered yet: the service records each one in the logs
//! so the office can pick them up from there.

use thiserror::Error;

use kindred_core::Email;

/// Longest contact message accepted.
pub const MAX_MESSAGE_LENGTH: usize = 5000;

/// Errors from building or sending an email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// A required field was blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The reply-to address is not valid.
    #[error("invalid email: {0}")]
    InvalidAddress(#[from] kindred_core::EmailError),

    /// The message body is too long.
    #[error("message must be at most {max} characters")]
    TooLong { max: usize },
}

/// A validated message from the public contact form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub name: String,
    pub reply_to: Email,
    pub body: String,
}

impl ContactMessage {
    /// Validate raw form input.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` naming the first field that is missing or invalid.
    pub fn new(name: &str, email: &str, body: &str) -> Result<Self, EmailError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EmailError::MissingField("name"));
        }
        if email.trim().is_empty() {
            return Err(EmailError::MissingField("email"));
        }
        let reply_to = Email::parse(email)?;
        let body = body.trim();
        if body.is_empty() {
            return Err(EmailError::MissingField("message"));
        }
        if body.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(EmailError::TooLong {
                max: MAX_MESSAGE_LENGTH,
            });
        }

        Ok(Self {
            name: name.to_string(),
            reply_to,
            body: body.to_string(),
        })
    }
}

/// Email sender for portal notifications.
#[derive(Debug, Clone)]
pub struct EmailService {
    inbox: Email,
}

impl EmailService {
    #[must_use]
    pub const fn new(inbox: Email) -> Self {
        Self { inbox }
    }

    /// Address that receives contact form messages.
    #[must_use]
    pub const fn inbox(&self) -> &Email {
        &self.inbox
    }

    /// Hand a contact message to the office inbox.
    ///
    /// # Errors
    ///
    /// Never fails today; delivery errors will surface here once a mail
    /// transport is configured.
    #[allow(clippy::unused_async)]
    pub async fn send_contact(&self, message: &ContactMessage) -> Result<(), EmailError> {
        tracing::info!(
            to = %self.inbox,
            reply_to = %message.reply_to,
            from_name = %message.name,
            length = message.body.len(),
            "contact message received"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_message_trims_fields() {
        let msg = ContactMessage::new("  Ana ", "Ana@Example.com", "  Hello there \n").unwrap();
        assert_eq!(msg.name, "Ana");
        assert_eq!(msg.reply_to.as_str(), "ana@example.com");
        assert_eq!(msg.body, "Hello there");
    }

    #[test]
    fn test_contact_message_requires_fields() {
        assert!(matches!(
            ContactMessage::new(" ", "a@b.co", "hi"),
            Err(EmailError::MissingField("name"))
        ));
        assert!(matches!(
            ContactMessage::new("Ana", "", "hi"),
            Err(EmailError::MissingField("email"))
        ));
        assert!(matches!(
            ContactMessage::new("Ana", "a@b.co", "   "),
            Err(EmailError::MissingField("message"))
        ));
        assert!(matches!(
            ContactMessage::new("Ana", "not-an-email", "hi"),
            Err(EmailError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_contact_message_length_limit() {
        let body = "x".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(matches!(
            ContactMessage::new("Ana", "a@b.co", &body),
            Err(EmailError::TooLong { .. })
        ));
    }

    #[tokio::test]
    async fn test_send_contact_logs_only() {
        let service = EmailService::new(Email::parse("office@kindred.example").unwrap());
        let msg = ContactMessage::new("Ana", "a@b.co", "Do you cover weekends?").unwrap();
        assert!(service.send_contact(&msg).await.is_ok());
    }
}
