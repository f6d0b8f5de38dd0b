//! Office chat.
//!
//! Simulated locally: the transcript is stored in the session and replies
//! come from [`office_reply`](kindred_core::chat::office_reply). Nothing is
//! sent to staff or persisted.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use kindred_core::chat::{ChatTranscript, MAX_MESSAGE_CHARS};

use super::{Nav, capitalize};
use crate::error::Result;
use crate::middleware::RequireSignedIn;
use crate::models::session_keys;

/// Chat form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatForm {
    pub message: String,
}

/// Chat page template.
#[derive(Template, WebTemplate)]
#[template(path = "chat.html")]
pub struct ChatTemplate {
    pub nav: Nav,
    pub transcript: ChatTranscript,
    /// Rejected input, kept so it can be corrected.
    pub draft: String,
    pub max_chars: usize,
    pub error: Option<String>,
    pub success: Option<String>,
}

async fn load_transcript(session: &Session) -> Result<ChatTranscript> {
    Ok(session
        .get::<ChatTranscript>(session_keys::CHAT_TRANSCRIPT)
        .await?
        .unwrap_or_default())
}

/// Display the conversation so far.
#[instrument(skip(signed_in, session), fields(user_id = %signed_in.user.id))]
pub async fn chat_page(signed_in: RequireSignedIn, session: Session) -> Result<ChatTemplate> {
    Ok(ChatTemplate {
        nav: Nav::for_role(signed_in.role),
        transcript: load_transcript(&session).await?,
        draft: String::new(),
        max_chars: MAX_MESSAGE_CHARS,
        error: None,
        success: None,
    })
}

/// Add a message and the office's reply to the session transcript.
#[instrument(skip(signed_in, session, form), fields(user_id = %signed_in.user.id))]
pub async fn send(
    signed_in: RequireSignedIn,
    session: Session,
    Form(form): Form<ChatForm>,
) -> Result<Response> {
    let mut transcript = load_transcript(&session).await?;

    if let Err(e) = transcript.send(&form.message, Utc::now()) {
        let page = ChatTemplate {
            nav: Nav::for_role(signed_in.role),
            transcript,
            draft: form.message,
            max_chars: MAX_MESSAGE_CHARS,
            error: Some(capitalize(&e.to_string())),
            success: None,
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    session
        .insert(session_keys::CHAT_TRANSCRIPT, &transcript)
        .await?;
    tracing::debug!(messages = transcript.messages().len(), "chat message added");

    Ok(Redirect::to("/chat").into_response())
}
