//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use kindred_core::catalog::{CaregiverStats, ServiceOffering, Testimonial, featured_testimonials};

use super::Nav;
use crate::db::CatalogRepository;
use crate::middleware::OptionalUser;
use crate::state::AppState;

/// Offerings highlighted on the home page.
const FEATURED_OFFERINGS: usize = 4;

const FEATURED_TESTIMONIALS: usize = 3;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: Nav,
    pub featured: Vec<ServiceOffering>,
    pub stats: CaregiverStats,
    pub testimonials: Vec<Testimonial>,
    /// Shown instead of the catalog when it could not be loaded.
    pub catalog_error: Option<String>,
}

/// Display the home page.
#[instrument(skip(state, user))]
pub async fn home(State(state): State<AppState>, OptionalUser(user): OptionalUser) -> impl IntoResponse {
    let catalog = CatalogRepository::new(state.pool());
    let mut catalog_error = None;

    let featured = catalog.offerings().await.map_or_else(
        |e| {
            tracing::error!(error = %e, "failed to load offerings");
            catalog_error = Some(super::catalog::CATALOG_UNAVAILABLE.to_string());
            Vec::new()
        },
        |offerings| offerings.into_iter().take(FEATURED_OFFERINGS).collect(),
    );

    let stats = catalog.active_caregivers().await.map_or_else(
        |e| {
            tracing::error!(error = %e, "failed to load caregivers");
            CaregiverStats::default()
        },
        |caregivers| CaregiverStats::from_caregivers(&caregivers),
    );

    let testimonials = catalog.testimonials().await.map_or_else(
        |e| {
            tracing::warn!(error = %e, "failed to load testimonials");
            Vec::new()
        },
        |all| featured_testimonials(all, FEATURED_TESTIMONIALS),
    );

    HomeTemplate {
        nav: Nav::public(user.as_ref()),
        featured,
        stats,
        testimonials,
        catalog_error,
    }
}
