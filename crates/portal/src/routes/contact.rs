//! Public contact form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use super::{MessageQuery, Nav};
use crate::middleware::OptionalUser;
use crate::services::ContactMessage;
use crate::state::AppState;

/// Contact form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub nav: Nav,
    pub form: ContactForm,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the contact form.
pub async fn contact_page(
    OptionalUser(user): OptionalUser,
    Query(query): Query<MessageQuery>,
) -> ContactTemplate {
    ContactTemplate {
        nav: Nav::public(user.as_ref()),
        form: ContactForm::default(),
        error: None,
        success: query
            .success
            .filter(|s| s == "sent")
            .map(|_| "Thanks for reaching out. We'll reply within one business day.".to_string()),
    }
}

/// Validate and forward a contact message.
#[instrument(skip(state, user, form))]
pub async fn send(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Form(form): Form<ContactForm>,
) -> Response {
    let rerender = |form: ContactForm, status: StatusCode, error: String| {
        (
            status,
            ContactTemplate {
                nav: Nav::public(user.as_ref()),
                form,
                error: Some(error),
                success: None,
            },
        )
            .into_response()
    };

    let message = match ContactMessage::new(&form.name, &form.email, &form.message) {
        Ok(message) => message,
        Err(e) => {
            return rerender(form, StatusCode::UNPROCESSABLE_ENTITY, format!("Please check the form: {e}."));
        }
    };

    match state.email().send_contact(&message).await {
        Ok(()) => Redirect::to("/contact?success=sent").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to send contact message");
            rerender(
                form,
                StatusCode::INTERNAL_SERVER_ERROR,
                "We couldn't send your message. Please try again or call us.".to_string(),
            )
        }
    }
}
