//! Simulated office chat.
//!
//! There is no chat backend. A [`ChatTranscript`] lives in the visitor's
//! session, and every message they send is answered straight away with a
//! canned reply picked from its keywords.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest message a visitor can send, in characters.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Messages kept per session. Older ones are dropped first.
pub const MAX_TRANSCRIPT_MESSAGES: usize = 40;

const FALLBACK_REPLY: &str = "Thanks for your message. A care coordinator will reply during office \
     hours, Monday to Friday 8am to 6pm.";

/// Keyword groups checked in order; the first match wins.
const REPLIES: [(&[&str], &str); 4] = [
    (
        &["cancel", "reschedule", "change my visit"],
        "To change or cancel a visit, tell us the date and we'll update it. Changes made less \
         than 24 hours before a visit may be charged.",
    ),
    (
        &["price", "cost", "rate", "pay", "invoice"],
        "Hourly rates and monthly packages are listed on our pricing page. Packages are invoiced \
         once a month.",
    ),
    (
        &["book", "appointment", "visit"],
        "You can request a visit from Book a visit on your dashboard. We confirm every request \
         within one business day.",
    ),
    (
        &["caregiver", "carer", "nanny", "sitter"],
        "Every caregiver is background-checked and first-aid trained. We'll always try to send \
         someone your family already knows.",
    ),
];

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAuthor {
    Visitor,
    Office,
}

/// One line of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub author: ChatAuthor,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    #[must_use]
    pub fn is_from_office(&self) -> bool {
        self.author == ChatAuthor::Office
    }

    /// `14:05`
    #[must_use]
    pub fn time_label(&self) -> String {
        self.sent_at.format("%H:%M").to_string()
    }
}

/// A message that cannot be sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("message is empty")]
    Empty,

    #[error("message cannot be longer than {MAX_MESSAGE_CHARS} characters")]
    TooLong,
}

/// The canned office answer to `text`.
#[must_use]
pub fn office_reply(text: &str) -> &'static str {
    let text = text.to_lowercase();
    REPLIES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map_or(FALLBACK_REPLY, |(_, reply)| *reply)
}

/// A session's conversation with the office.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Add the visitor's message followed by the office reply.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] for a blank or over-long message. The
    /// transcript is unchanged in that case.
    pub fn send(&mut self, text: &str, now: DateTime<Utc>) -> Result<(), ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::Empty);
        }
        if text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ChatError::TooLong);
        }

        self.messages.push(ChatMessage {
            author: ChatAuthor::Visitor,
            body: text.to_owned(),
            sent_at: now,
        });
        self.messages.push(ChatMessage {
            author: ChatAuthor::Office,
            body: office_reply(text).to_owned(),
            sent_at: now,
        });

        let overflow = self.messages.len().saturating_sub(MAX_TRANSCRIPT_MESSAGES);
        self.messages.drain(..overflow);

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-02T14:05:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_send_appends_message_and_reply() {
        let mut transcript = ChatTranscript::default();
        transcript.send("  How much does a nanny cost? ", now()).unwrap();

        let messages = transcript.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].is_from_office());
        assert!(messages[1].body.contains("pricing page"));
        assert_eq!(messages[0].author, ChatAuthor::Visitor);
        assert_eq!(messages[0].body, "How much does a nanny cost?");
        assert_eq!(messages[0].time_label(), "14:05");
    }

    #[test]
    fn test_replies_follow_keyword_order() {
        assert!(office_reply("I need to CANCEL my visit").contains("change or cancel"));
        assert!(office_reply("Can I book a sitter?").contains("Book a visit"));
        assert!(office_reply("Is the caregiver trained?").contains("background-checked"));
        assert_eq!(office_reply("hello"), FALLBACK_REPLY);
    }

    #[test]
    fn test_rejected_messages_leave_transcript_alone() {
        let mut transcript = ChatTranscript::default();
        assert_eq!(transcript.send(" \n ", now()), Err(ChatError::Empty));
        assert_eq!(
            transcript.send(&"a".repeat(MAX_MESSAGE_CHARS + 1), now()),
            Err(ChatError::TooLong)
        );
        assert!(transcript.is_empty());

        assert!(transcript.send(&"é".repeat(MAX_MESSAGE_CHARS), now()).is_ok());
    }

    #[test]
    fn test_oldest_messages_are_dropped() {
        let mut transcript = ChatTranscript::default();
        for i in 0..MAX_TRANSCRIPT_MESSAGES {
            transcript.send(&format!("message {i}"), now()).unwrap();
        }

        let messages = transcript.messages();
        assert_eq!(messages.len(), MAX_TRANSCRIPT_MESSAGES);
        assert_eq!(messages[0].body, format!("message {}", MAX_TRANSCRIPT_MESSAGES / 2));
        assert!(messages[MAX_TRANSCRIPT_MESSAGES - 1].is_from_office());
    }
}
