//! Catalog pages: pricing, monthly packages, caregivers, and the payment
//! call-to-action.
//!
//! Pure reads. A failed query renders the page with an error banner instead
//! of the rows.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use kindred_core::PackageId;
use kindred_core::catalog::{
    Caregiver, CaregiverStats, MonthlyPackage, PackageShelf, ServiceOffering,
    offerings_by_category,
};

use super::Nav;
use crate::db::{CatalogRepository, RepositoryError};
use crate::middleware::OptionalUser;
use crate::state::AppState;

/// Banner text when catalog tables cannot be read.
pub const CATALOG_UNAVAILABLE: &str =
    "We couldn't load our services right now. Please refresh the page or call us.";

/// Pricing page template.
#[derive(Template, WebTemplate)]
#[template(path = "pricing.html")]
pub struct PricingTemplate {
    pub nav: Nav,
    pub child_services: Vec<ServiceOffering>,
    pub elderly_services: Vec<ServiceOffering>,
    pub shelf: PackageShelf,
    pub error: Option<String>,
}

/// Monthly packages page template.
#[derive(Template, WebTemplate)]
#[template(path = "packages.html")]
pub struct PackagesTemplate {
    pub nav: Nav,
    pub shelf: PackageShelf,
    pub error: Option<String>,
}

/// Caregivers page template.
#[derive(Template, WebTemplate)]
#[template(path = "caregivers.html")]
pub struct CaregiversTemplate {
    pub nav: Nav,
    pub caregivers: Vec<Caregiver>,
    pub stats: CaregiverStats,
    pub error: Option<String>,
}

/// Payment page template.
///
/// Online payment is not offered; the page explains how to pay instead.
#[derive(Template, WebTemplate)]
#[template(path = "payment.html")]
pub struct PaymentTemplate {
    pub nav: Nav,
    /// Package the visitor clicked through from, when it still exists.
    pub package: Option<MonthlyPackage>,
}

/// `?package=<id>` from a package card.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentQuery {
    pub package: Option<PackageId>,
}

/// Display hourly rates with a package summary.
#[instrument(skip(state, user))]
pub async fn pricing(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> impl IntoResponse {
    let catalog = CatalogRepository::new(state.pool());

    let loaded = async {
        let offerings = catalog.offerings().await?;
        let packages = catalog.packages().await?;
        Ok::<_, RepositoryError>((offerings, packages))
    }
    .await;

    let (offerings, packages, error) = match loaded {
        Ok((offerings, packages)) => (offerings, packages, None),
        Err(e) => {
            tracing::error!(error = %e, "failed to load pricing");
            (Vec::new(), Vec::new(), Some(CATALOG_UNAVAILABLE.to_string()))
        }
    };
    let (child_services, elderly_services) = offerings_by_category(offerings);

    PricingTemplate {
        nav: Nav::public(user.as_ref()),
        child_services,
        elderly_services,
        shelf: PackageShelf::partition(packages),
        error,
    }
}

/// Display monthly packages grouped by care category.
#[instrument(skip(state, user))]
pub async fn packages(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> impl IntoResponse {
    let (shelf, error) = match CatalogRepository::new(state.pool()).packages().await {
        Ok(packages) => (PackageShelf::partition(packages), None),
        Err(e) => {
            tracing::error!(error = %e, "failed to load packages");
            (PackageShelf::default(), Some(CATALOG_UNAVAILABLE.to_string()))
        }
    };

    PackagesTemplate {
        nav: Nav::public(user.as_ref()),
        shelf,
        error,
    }
}

/// Display active caregivers and team numbers.
#[instrument(skip(state, user))]
pub async fn caregivers(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> impl IntoResponse {
    let (caregivers, error) = match CatalogRepository::new(state.pool()).active_caregivers().await {
        Ok(caregivers) => (caregivers, None),
        Err(e) => {
            tracing::error!(error = %e, "failed to load caregivers");
            (Vec::new(), Some(CATALOG_UNAVAILABLE.to_string()))
        }
    };

    CaregiversTemplate {
        nav: Nav::public(user.as_ref()),
        stats: CaregiverStats::from_caregivers(&caregivers),
        caregivers,
        error,
    }
}

/// Explain how to pay for a package.
///
/// The chosen package is looked up for the summary; if the catalog is
/// unavailable the page still renders without it.
#[instrument(skip(state, user))]
pub async fn payment(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Query(query): Query<PaymentQuery>,
) -> impl IntoResponse {
    let package = match query.package {
        Some(id) => match CatalogRepository::new(state.pool()).packages().await {
            Ok(packages) => packages.into_iter().find(|p| p.id == id),
            Err(e) => {
                tracing::warn!(error = %e, package_id = %id, "failed to load chosen package");
                None
            }
        },
        None => None,
    };

    PaymentTemplate {
        nav: Nav::public(user.as_ref()),
        package,
    }
}
