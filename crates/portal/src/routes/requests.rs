//! A client's own service requests.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use kindred_core::booking::ServiceRequest;

use super::Nav;
use crate::db::ServiceRequestRepository;
use crate::error::Result;
use crate::middleware::RequireClient;
use crate::state::AppState;

/// My requests template.
#[derive(Template, WebTemplate)]
#[template(path = "my_requests.html")]
pub struct MyRequestsTemplate {
    pub nav: Nav,
    pub requests: Vec<ServiceRequest>,
}

/// List every request the client has made.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn my_requests(
    State(state): State<AppState>,
    RequireClient(user): RequireClient,
) -> Result<MyRequestsTemplate> {
    let requests = ServiceRequestRepository::new(state.pool())
        .list_for_user(user.id, None)
        .await?;

    Ok(MyRequestsTemplate {
        nav: Nav::client(),
        requests,
    })
}
