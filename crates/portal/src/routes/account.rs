//! Profile page for any signed-in user.

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
use crate::db::ProfileRepository;
use crate::error::Result;
use crate::middleware::RequireSignedIn;
use crate::models::{ClientProfile, CurrentUser};
use crate::state::AppState;

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

impl ProfileForm {
    /// Trimmed profile, or `None` when the name is blank.
    fn into_profile(self) -> Option<ClientProfile> {
        let optional = |value: String| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        let full_name = self.full_name.trim().to_string();
        (!full_name.is_empty()).then(|| ClientProfile {
            full_name,
            phone: optional(self.phone),
            address: optional(self.address),
        })
    }
}

/// Account page template.
#[derive(Template, WebTemplate)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub nav: Nav,
    pub user: CurrentUser,
    pub profile: ClientProfile,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the profile form.
#[instrument(skip(state, signed_in, query), fields(user_id = %signed_in.user.id))]
pub async fn account_page(
    State(state): State<AppState>,
    signed_in: RequireSignedIn,
    Query(query): Query<MessageQuery>,
) -> Result<AccountTemplate> {
    let profile = ProfileRepository::new(state.pool())
        .get(signed_in.user.id)
        .await?
        .unwrap_or_default();

    Ok(AccountTemplate {
        nav: Nav::for_role(signed_in.role),
        user: signed_in.user,
        profile,
        error: None,
        success: query
            .success
            .filter(|s| s == "saved")
            .map(|_| "Your details have been saved.".to_string()),
    })
}

/// Save the profile form.
#[instrument(skip(state, signed_in, form), fields(user_id = %signed_in.user.id))]
pub async fn update(
    State(state): State<AppState>,
    signed_in: RequireSignedIn,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let Some(profile) = form.into_profile() else {
        let current = ProfileRepository::new(state.pool())
            .get(signed_in.user.id)
            .await?
            .unwrap_or_default();
        let page = AccountTemplate {
            nav: Nav::for_role(signed_in.role),
            user: signed_in.user,
            profile: current,
            error: Some("Please enter your full name.".to_string()),
            success: None,
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    };

    ProfileRepository::new(state.pool())
        .upsert(signed_in.user.id, &profile)
        .await?;

    Ok(Redirect::to("/account?success=saved").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_form_trims_and_drops_blanks() {
        let form = ProfileForm {
            full_name: "  Maria Lopez ".to_string(),
            phone: "   ".to_string(),
            address: " 12 Elm St ".to_string(),
        };
        let profile = form.into_profile();
        assert_eq!(
            profile.as_ref().map(|p| p.full_name.as_str()),
            Some("Maria Lopez")
        );
        assert_eq!(profile.as_ref().and_then(|p| p.phone.clone()), None);
        assert_eq!(
            profile.and_then(|p| p.address),
            Some("12 Elm St".to_string())
        );
    }

    #[test]
    fn test_profile_form_requires_name() {
        let form = ProfileForm {
            full_name: " ".to_string(),
            phone: String::new(),
            address: String::new(),
        };
        assert!(form.into_profile().is_none());
    }
}
